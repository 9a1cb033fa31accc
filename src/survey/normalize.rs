//! Grid coordinate conversion.
//!
//! The client reports positions as percentages of the grid box, origin at the
//! top-left with Y growing downward. Stored predictions use a signed Cartesian
//! space centred on the origin where +Y is "hopeful" and +X is "likely".

use serde::{Deserialize, Serialize};

/// Half-width of the normalized grid.
pub const GRID_HALF: f64 = 50.0;
/// Upper bound of a raw percentage coordinate.
pub const RAW_MAX: f64 = 100.0;

/// UI-space position, both axes in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub x: f64,
    pub y: f64,
}

/// Normalized position, both axes in `[-50, 50]`, Y up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prediction {
    pub x: i32,
    pub y: i32,
}

impl RawPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_in_bounds(&self) -> bool {
        let axis_ok = |v: f64| v.is_finite() && (0.0..=RAW_MAX).contains(&v);
        axis_ok(self.x) && axis_ok(self.y)
    }

    /// Arithmetic mean of a set of raw positions, `None` when empty.
    pub fn mean<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a RawPosition>,
    {
        let (sum_x, sum_y, count) = positions
            .into_iter()
            .fold((0.0, 0.0, 0usize), |(sx, sy, n), p| (sx + p.x, sy + p.y, n + 1));

        if count == 0 {
            return None;
        }

        Some(Self {
            x: sum_x / count as f64,
            y: sum_y / count as f64,
        })
    }
}

impl Prediction {
    pub const ORIGIN: Prediction = Prediction { x: 0, y: 0 };

    /// Projects back into UI space for plotting on the comparison grid.
    pub fn to_raw(&self) -> RawPosition {
        RawPosition {
            x: f64::from(self.x) + GRID_HALF,
            y: -f64::from(self.y) + GRID_HALF,
        }
    }
}

/// Rounds each axis half away from zero, then flips Y so up is positive.
///
/// Rounding happens before the sign flip so a raw `y` of `50.5` and `49.5`
/// land on `-1` and `1` respectively.
pub fn normalize(raw: RawPosition) -> Prediction {
    let x = (raw.x - GRID_HALF).round() as i32;
    let y = (raw.y - GRID_HALF).round() as i32;

    Prediction { x, y: -y }
}
