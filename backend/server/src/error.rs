use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use process::models::UnknownPostsType;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use upstream::SourceError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing query parameter 'type', expected 'latest' or 'popular'")]
    MissingPostsType,

    #[error("Invalid query parameter: {0}")]
    InvalidPostsType(#[from] UnknownPostsType),

    #[error("Upstream error: {0}")]
    Source(#[from] SourceError),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingPostsType | AppError::InvalidPostsType(_) => StatusCode::BAD_REQUEST,
            AppError::Source(_) | AppError::Cache(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
