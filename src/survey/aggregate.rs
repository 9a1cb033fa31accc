//! Community comparison over a snapshot of stored submissions.
//!
//! Everything here is recomputed per request; nothing is cached or persisted.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{db::models::Submission, survey::normalize::Prediction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPrediction {
    pub name: String,
    pub avg_x: f64,
    pub avg_y: f64,
    pub count: u32,
}

/// Names of the extreme items on each axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub hopeful: Option<String>,
    pub fearful: Option<String>,
    pub likely: Option<String>,
    pub unlikely: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub predictions: Vec<Prediction>,
    pub aggregated: Vec<AggregatedPrediction>,
    pub rankings: Rankings,
    pub total: usize,
}

#[derive(Default)]
struct Totals {
    sum_x: i64,
    sum_y: i64,
    count: u32,
}

/// Each submission's average, in snapshot order.
pub fn average_predictions(submissions: &[Submission]) -> Vec<Prediction> {
    submissions
        .iter()
        .map(|submission| submission.average_prediction)
        .collect()
}

/// Per-item mean position across all submissions, keyed by item name.
/// Items nobody placed are absent.
pub fn aggregate_predictions(submissions: &[Submission]) -> BTreeMap<String, AggregatedPrediction> {
    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();

    for submission in submissions {
        for (name, prediction) in &submission.predictions {
            let entry = totals.entry(name.as_str()).or_default();
            entry.sum_x += i64::from(prediction.x);
            entry.sum_y += i64::from(prediction.y);
            entry.count += 1;
        }
    }

    totals
        .into_iter()
        .map(|(name, t)| {
            let count = f64::from(t.count);
            (
                name.to_string(),
                AggregatedPrediction {
                    name: name.to_string(),
                    avg_x: t.sum_x as f64 / count,
                    avg_y: t.sum_y as f64 / count,
                    count: t.count,
                },
            )
        })
        .collect()
}

/// Picks the max and min item for an axis. Equal scores resolve to the
/// alphabetically first name on both ends.
fn extremes<F>(items: &[AggregatedPrediction], score: F) -> (Option<String>, Option<String>)
where
    F: Fn(&AggregatedPrediction) -> f64,
{
    let highest = items.iter().min_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    let lowest = items.iter().min_by(|a, b| {
        score(a)
            .partial_cmp(&score(b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    (
        highest.map(|item| item.name.clone()),
        lowest.map(|item| item.name.clone()),
    )
}

pub fn rank(items: &[AggregatedPrediction]) -> Rankings {
    let (hopeful, fearful) = extremes(items, |item| item.avg_y);
    let (likely, unlikely) = extremes(items, |item| item.avg_x);

    Rankings {
        hopeful,
        fearful,
        likely,
        unlikely,
    }
}

pub fn compare(submissions: &[Submission]) -> Comparison {
    let aggregated: Vec<AggregatedPrediction> =
        aggregate_predictions(submissions).into_values().collect();
    let rankings = rank(&aggregated);

    Comparison {
        predictions: average_predictions(submissions),
        aggregated,
        rankings,
        total: submissions.len(),
    }
}
