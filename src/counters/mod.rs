//! Visitor telemetry counters.
//!
//! Counts are best effort. A failed increment is logged and dropped so the
//! visitor-facing flow never notices.

pub mod handlers;

use std::{fmt, str::FromStr};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::VISITOR_COUNTER, Database},
    error::SurveyError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterEvent {
    #[serde(rename = "pageLoad")]
    PageLoad,
    #[serde(rename = "itemMove")]
    ItemMove,
    #[serde(rename = "itemDetailsClick")]
    ItemDetailsClick,
    #[serde(rename = "submitButtonClick")]
    SubmitButtonClick,
    #[serde(rename = "thankYouCTAclick")]
    ThankYouCtaClick,
}

impl CounterEvent {
    pub const ALL: [CounterEvent; 5] = [
        CounterEvent::PageLoad,
        CounterEvent::ItemMove,
        CounterEvent::ItemDetailsClick,
        CounterEvent::SubmitButtonClick,
        CounterEvent::ThankYouCtaClick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CounterEvent::PageLoad => "pageLoad",
            CounterEvent::ItemMove => "itemMove",
            CounterEvent::ItemDetailsClick => "itemDetailsClick",
            CounterEvent::SubmitButtonClick => "submitButtonClick",
            CounterEvent::ThankYouCtaClick => "thankYouCTAclick",
        }
    }
}

impl fmt::Display for CounterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CounterEvent {
    type Err = SurveyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CounterEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or_else(|| SurveyError::UnknownEvent(value.to_string()))
    }
}

/// Bumps the counter for `event`, swallowing any storage failure.
pub async fn record_event(db: &Database, event: CounterEvent) {
    if let Err(err) = db.increment_counter(VISITOR_COUNTER, event.as_str()).await {
        warn!("Error incrementing {event}: {err:#}");
    }
}
