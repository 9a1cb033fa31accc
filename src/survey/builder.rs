//! Turns a visitor payload into the records the database stores.
//!
//! Construction is pure: callers pass in the server clock so the stored
//! `createdAt` never depends on the client.

use std::{collections::BTreeMap, sync::LazyLock};

use chrono::{DateTime, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::models::{ContactRecord, Submission},
    error::SurveyError,
    survey::{
        catalog::Catalog,
        normalize::{normalize, RawPosition},
    },
};

/// Largest gap, per axis and in raw units, allowed between a supplied
/// average and the mean of the submitted positions.
const AVERAGE_TOLERANCE: f64 = 0.5;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

/// One item as the client left it on the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedItem {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl PlacedItem {
    pub fn position(&self) -> RawPosition {
        RawPosition::new(self.x, self.y)
    }
}

/// Body of the write path. Everything except `items` is optional so older
/// clients that never sent consent flags or a precomputed average still work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePredictionsPayload {
    pub items: Vec<PlacedItem>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub join_community: bool,
    #[serde(default)]
    pub anonymize_data: bool,
    #[serde(default)]
    pub average_prediction: Option<RawPosition>,
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionPolicy {
    pub require_email: bool,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            require_email: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuiltSubmission {
    pub submission: Submission,
    pub contact: Option<ContactRecord>,
}

pub fn validate_email(email: Option<&str>, required: bool) -> Result<Option<String>, SurveyError> {
    let email = email.map(str::trim).filter(|e| !e.is_empty());

    match email {
        None if required => Err(SurveyError::validation("Email is required.")),
        None => Ok(None),
        Some(addr) if !EMAIL_PATTERN.is_match(addr) => Err(SurveyError::validation(
            "Please enter a valid email address.",
        )),
        Some(addr) => Ok(Some(addr.to_string())),
    }
}

fn validate_position(label: &str, position: RawPosition) -> Result<(), SurveyError> {
    if !position.is_in_bounds() {
        return Err(SurveyError::validation(format!(
            "Position for {label} must be within 0-100 on both axes"
        )));
    }
    Ok(())
}

/// Rejects names the catalog does not offer.
pub fn validate_items(
    payload: &SavePredictionsPayload,
    catalog: &Catalog,
) -> Result<(), SurveyError> {
    match payload.items.iter().find(|item| !catalog.contains(&item.name)) {
        Some(item) => Err(SurveyError::validation(format!("Unknown item '{}'", item.name))),
        None => Ok(()),
    }
}

/// Contact rows of anonymized submissions only keep the day, so the two
/// tables cannot be joined on their timestamps.
fn contact_timestamp(now: DateTime<Utc>, anonymize: bool) -> DateTime<Utc> {
    if anonymize {
        now.date_naive().and_time(NaiveTime::MIN).and_utc()
    } else {
        now
    }
}

pub fn build_submission(
    payload: &SavePredictionsPayload,
    policy: SubmissionPolicy,
    now: DateTime<Utc>,
) -> Result<BuiltSubmission, SurveyError> {
    if payload.items.is_empty() {
        return Err(SurveyError::validation("At least one item is required."));
    }

    let email = validate_email(payload.email.as_deref(), policy.require_email)?;

    // Later duplicates overwrite earlier ones.
    let mut positions = BTreeMap::new();
    for item in &payload.items {
        let position = item.position();
        validate_position(&item.name, position)?;
        positions.insert(item.name.clone(), position);
    }

    let mean = RawPosition::mean(positions.values())
        .ok_or_else(|| SurveyError::validation("At least one item is required."))?;

    let raw_average = match payload.average_prediction {
        Some(average) => {
            validate_position("averagePrediction", average)?;
            if (average.x - mean.x).abs() > AVERAGE_TOLERANCE
                || (average.y - mean.y).abs() > AVERAGE_TOLERANCE
            {
                return Err(SurveyError::validation(
                    "averagePrediction does not match the submitted items.",
                ));
            }
            average
        }
        None => mean,
    };

    let predictions = positions
        .into_iter()
        .map(|(name, position)| (name, normalize(position)))
        .collect();

    let anonymize = payload.anonymize_data;

    let submission = Submission {
        id: Uuid::new_v4().to_string(),
        predictions,
        average_prediction: normalize(raw_average),
        email: if anonymize { None } else { email.clone() },
        join_community: payload.join_community,
        anonymize,
        created_at: now,
    };

    let contact = email.map(|email| ContactRecord {
        id: Uuid::new_v4().to_string(),
        email,
        marketing_opt_in: payload.join_community,
        data_opt_out: anonymize,
        created_at: contact_timestamp(now, anonymize),
    });

    Ok(BuiltSubmission {
        submission,
        contact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::normalize::Prediction;

    fn placed(name: &str, x: f64, y: f64) -> PlacedItem {
        PlacedItem {
            name: name.to_string(),
            x,
            y,
        }
    }

    fn payload() -> SavePredictionsPayload {
        SavePredictionsPayload {
            items: vec![placed("HAL", 80.0, 20.0), placed("GOLEM", 20.0, 60.0)],
            email: Some("visitor@example.org".into()),
            join_community: true,
            anonymize_data: false,
            average_prediction: Some(RawPosition::new(50.0, 40.0)),
        }
    }

    #[test]
    fn normalizes_every_item() {
        let built = build_submission(&payload(), SubmissionPolicy::default(), Utc::now()).unwrap();
        let predictions = &built.submission.predictions;

        assert_eq!(predictions["HAL"], Prediction { x: 30, y: 30 });
        assert_eq!(predictions["GOLEM"], Prediction { x: -30, y: -10 });
        assert_eq!(built.submission.average_prediction, Prediction { x: 0, y: 10 });
    }

    #[test]
    fn keeps_email_when_not_anonymized() {
        let built = build_submission(&payload(), SubmissionPolicy::default(), Utc::now()).unwrap();
        assert_eq!(built.submission.email.as_deref(), Some("visitor@example.org"));

        let contact = built.contact.unwrap();
        assert!(contact.marketing_opt_in);
        assert!(!contact.data_opt_out);
        assert_ne!(contact.id, built.submission.id);
    }

    #[test]
    fn anonymized_submission_has_no_email_key() {
        let mut input = payload();
        input.anonymize_data = true;

        let built = build_submission(&input, SubmissionPolicy::default(), Utc::now()).unwrap();
        assert!(built.submission.email.is_none());

        let json = serde_json::to_value(&built.submission).unwrap();
        assert!(json.get("email").is_none());

        let contact = built.contact.unwrap();
        assert!(contact.data_opt_out);
        assert_eq!(contact.email, "visitor@example.org");
    }

    #[test]
    fn later_duplicate_overwrites_earlier() {
        let mut input = payload();
        input.items.push(placed("HAL", 50.0, 50.0));
        input.average_prediction = None;

        let built = build_submission(&input, SubmissionPolicy::default(), Utc::now()).unwrap();
        assert_eq!(built.submission.predictions.len(), 2);
        assert_eq!(built.submission.predictions["HAL"], Prediction::ORIGIN);
        // mean of the surviving (50, 50) and (20, 60) is (35, 55)
        assert_eq!(built.submission.average_prediction, Prediction { x: -15, y: -5 });
    }

    #[test]
    fn average_ignores_overwritten_duplicates() {
        let input = SavePredictionsPayload {
            items: vec![placed("HAL", 100.0, 50.0), placed("HAL", 0.0, 50.0)],
            email: Some("visitor@example.org".into()),
            ..Default::default()
        };

        let built = build_submission(&input, SubmissionPolicy::default(), Utc::now()).unwrap();
        assert_eq!(built.submission.predictions["HAL"], Prediction { x: -50, y: 0 });
        assert_eq!(built.submission.average_prediction, Prediction { x: -50, y: 0 });
    }

    #[test]
    fn rejects_average_that_contradicts_items() {
        let input = SavePredictionsPayload {
            items: vec![placed("HAL", 100.0, 0.0), placed("HER", 100.0, 0.0)],
            email: Some("visitor@example.org".into()),
            average_prediction: Some(RawPosition::new(0.0, 100.0)),
            ..Default::default()
        };

        assert!(matches!(
            build_submission(&input, SubmissionPolicy::default(), Utc::now()),
            Err(SurveyError::Validation(_))
        ));
    }

    #[test]
    fn accepts_average_within_tolerance() {
        let mut input = payload();
        input.average_prediction = Some(RawPosition::new(50.4, 39.6));

        let built = build_submission(&input, SubmissionPolicy::default(), Utc::now()).unwrap();
        assert_eq!(built.submission.average_prediction, Prediction { x: 0, y: 10 });
    }

    #[test]
    fn anonymized_contact_keeps_only_the_day() {
        let now = DateTime::parse_from_rfc3339("2026-03-14T15:09:26.535Z")
            .unwrap()
            .with_timezone(&Utc);

        let mut input = payload();
        input.anonymize_data = true;
        let built = build_submission(&input, SubmissionPolicy::default(), now).unwrap();
        let contact = built.contact.unwrap();
        assert_eq!(built.submission.created_at, now);
        assert_eq!(contact.created_at.to_rfc3339(), "2026-03-14T00:00:00+00:00");
        assert_ne!(contact.created_at, built.submission.created_at);

        let built = build_submission(&payload(), SubmissionPolicy::default(), now).unwrap();
        assert_eq!(built.contact.unwrap().created_at, now);
    }

    #[test]
    fn unknown_item_names_are_rejected() {
        let catalog = Catalog::default();
        assert!(validate_items(&payload(), &catalog).is_ok());

        let mut input = payload();
        input.items.push(placed("ROBBY", 10.0, 10.0));
        assert!(matches!(
            validate_items(&input, &catalog),
            Err(SurveyError::Validation(msg)) if msg.contains("ROBBY")
        ));
    }

    #[test]
    fn derives_average_when_missing() {
        let mut input = payload();
        input.average_prediction = None;

        let built = build_submission(&input, SubmissionPolicy::default(), Utc::now()).unwrap();
        // mean of (80, 20) and (20, 60) is (50, 40)
        assert_eq!(built.submission.average_prediction, Prediction { x: 0, y: 10 });
    }

    #[test]
    fn stored_average_matches_prediction_mean() {
        let input = SavePredictionsPayload {
            items: vec![
                placed("A", 12.3, 88.8),
                placed("B", 71.6, 5.2),
                placed("C", 49.9, 33.3),
            ],
            email: None,
            ..Default::default()
        };
        let policy = SubmissionPolicy {
            require_email: false,
        };

        let built = build_submission(&input, policy, Utc::now()).unwrap();
        let preds = &built.submission.predictions;
        let n = preds.len() as f64;
        let mean_x = preds.values().map(|p| f64::from(p.x)).sum::<f64>() / n;
        let mean_y = preds.values().map(|p| f64::from(p.y)).sum::<f64>() / n;

        let avg = built.submission.average_prediction;
        assert!((f64::from(avg.x) - mean_x).abs() <= 1.0);
        assert!((f64::from(avg.y) - mean_y).abs() <= 1.0);
    }

    #[test]
    fn email_rules() {
        assert!(validate_email(None, true).is_err());
        assert!(validate_email(Some("   "), true).is_err());
        assert!(validate_email(Some("not-an-email"), false).is_err());
        assert!(validate_email(Some("a b@c.d"), false).is_err());
        assert_eq!(validate_email(None, false).unwrap(), None);
        assert_eq!(
            validate_email(Some(" a@b.co "), true).unwrap().as_deref(),
            Some("a@b.co")
        );
    }

    #[test]
    fn optional_email_produces_no_contact() {
        let mut input = payload();
        input.email = None;
        let policy = SubmissionPolicy {
            require_email: false,
        };

        let built = build_submission(&input, policy, Utc::now()).unwrap();
        assert!(built.contact.is_none());
        assert!(built.submission.email.is_none());
    }

    #[test]
    fn rejects_out_of_range_and_empty() {
        let mut input = payload();
        input.items.push(placed("TALOS", 101.0, 50.0));
        assert!(matches!(
            build_submission(&input, SubmissionPolicy::default(), Utc::now()),
            Err(SurveyError::Validation(_))
        ));

        let mut empty = payload();
        empty.items.clear();
        assert!(build_submission(&empty, SubmissionPolicy::default(), Utc::now()).is_err());
    }
}
