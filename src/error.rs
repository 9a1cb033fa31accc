use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("{0}")]
    Validation(String),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Could not save predictions")]
    Write(anyhow::Error),

    #[error("Could not load comparison data")]
    Fetch(anyhow::Error),
}

impl SurveyError {
    pub fn validation(message: impl Into<String>) -> Self {
        SurveyError::Validation(message.into())
    }
}

impl IntoResponse for SurveyError {
    fn into_response(self) -> Response {
        let status = match &self {
            SurveyError::Validation(_) | SurveyError::UnknownEvent(_) => StatusCode::BAD_REQUEST,
            SurveyError::Write(source) => {
                error!("Error writing submission: {source:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SurveyError::Fetch(source) => {
                error!("Error reading submissions: {source:#}");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, self.to_string()).into_response()
    }
}
