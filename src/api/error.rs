use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::merge::MergeError;
use crate::services::workspace::StagingError;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No files uploaded")]
    NoFilesUploaded,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Staging and merge failures are not distinguished for the client;
        // the cause is logged server-side only.
        let (status, message) = match self {
            AppError::NoFilesUploaded => (StatusCode::BAD_REQUEST, "No files uploaded".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Staging(e) => {
                tracing::error!("Staging error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Merge(e) => {
                tracing::error!("Merge error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
