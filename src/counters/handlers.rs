use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    counters::{record_event, CounterEvent},
    db::models::{CounterValues, VISITOR_COUNTER},
    error::SurveyError,
    AppState,
};

pub async fn record_event_handler(
    State(state): State<Arc<AppState>>,
    Path(event): Path<String>,
) -> Result<StatusCode, SurveyError> {
    let event: CounterEvent = event.parse()?;
    record_event(&state.db, event).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_counters_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterValues>, SurveyError> {
    let mut values = state
        .db
        .get_counter(VISITOR_COUNTER)
        .await
        .map_err(SurveyError::Fetch)?;

    for event in CounterEvent::ALL {
        values.entry(event.as_str().to_string()).or_insert(0);
    }

    Ok(Json(values))
}
