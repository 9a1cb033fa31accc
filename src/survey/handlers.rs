use std::{collections::BTreeMap, sync::Arc};

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::SurveyError,
    survey::{
        aggregate::{
            aggregate_predictions, average_predictions, compare, AggregatedPrediction, Comparison,
        },
        builder::SavePredictionsPayload,
        catalog::Item,
        load_submissions,
        normalize::Prediction,
        save_predictions,
    },
    AppState,
};

pub async fn list_items_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Item>> {
    Json(state.catalog.items().to_vec())
}

pub async fn save_predictions_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SavePredictionsPayload>,
) -> Result<StatusCode, SurveyError> {
    save_predictions(&state.db, &state.catalog, &payload, state.policy).await?;
    Ok(StatusCode::CREATED)
}

pub async fn average_predictions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Prediction>>, SurveyError> {
    let submissions = load_submissions(&state.db).await?;
    Ok(Json(average_predictions(&submissions)))
}

pub async fn aggregated_predictions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, AggregatedPrediction>>, SurveyError> {
    let submissions = load_submissions(&state.db).await?;
    Ok(Json(aggregate_predictions(&submissions)))
}

pub async fn comparison_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Comparison>, SurveyError> {
    let submissions = load_submissions(&state.db).await?;
    Ok(Json(compare(&submissions)))
}
