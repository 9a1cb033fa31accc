//! Forecast submissions and the community comparison built from them.

pub mod aggregate;
pub mod builder;
pub mod catalog;
pub mod handlers;
pub mod normalize;

use chrono::Utc;
use log::info;

use crate::{db::models::Submission, db::Database, error::SurveyError};
use builder::{build_submission, validate_items, SavePredictionsPayload, SubmissionPolicy};
use catalog::Catalog;

/// Validates, builds, and stores one visitor's forecast.
pub async fn save_predictions(
    db: &Database,
    catalog: &Catalog,
    payload: &SavePredictionsPayload,
    policy: SubmissionPolicy,
) -> Result<(), SurveyError> {
    validate_items(payload, catalog)?;
    let built = build_submission(payload, policy, Utc::now())?;

    db.insert_submission(&built.submission, built.contact.as_ref())
        .await
        .map_err(SurveyError::Write)?;

    info!(
        "Stored submission with {} predictions (anonymized: {})",
        built.submission.predictions.len(),
        built.submission.anonymize
    );
    Ok(())
}

pub async fn load_submissions(db: &Database) -> Result<Vec<Submission>, SurveyError> {
    db.get_all_submissions().await.map_err(SurveyError::Fetch)
}
