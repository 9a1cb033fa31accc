//! Visitor prediction records.
//!
//! A `Submission` is one visitor's completed forecast. It is written once and
//! never updated. When the visitor opted out of data linkage the record holds
//! no email at all; the address, if given, lives only in a `ContactRecord`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::survey::normalize::Prediction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub predictions: BTreeMap<String, Prediction>,
    pub average_prediction: Prediction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub join_community: bool,
    pub anonymize: bool,
    pub created_at: DateTime<Utc>,
}

/// Email and consent flags, stored apart from any prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    pub email: String,
    pub marketing_opt_in: bool,
    pub data_opt_out: bool,
    pub created_at: DateTime<Utc>,
}
