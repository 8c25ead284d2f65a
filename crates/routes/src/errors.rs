use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("GPX parsing error: {0}")]
    GpxParsing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Batch of {got} routes exceeds the limit of {max}")]
    BatchTooLarge { got: usize, max: usize },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::GpxParsing(msg) | AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::BatchTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::Internal(e) => {
                error!("Internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
