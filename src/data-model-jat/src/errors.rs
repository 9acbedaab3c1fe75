use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::db::PoolError;

/// Message sent to clients in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Error returned by every job application endpoint.
///
/// Serialized as `{"error": <kind>, "details": <message>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error", content = "details")]
pub enum ApiError {
    /// Missing, malformed or out-of-range input
    #[serde(rename = "validation_error")]
    #[error("Validation error: {0}")]
    Validation(String),
    /// No job application has the requested id
    #[serde(rename = "not_found")]
    #[error("Not found: {0}")]
    NotFound(String),
    /// Storage failure; the request's transaction was rolled back
    #[serde(rename = "internal_error")]
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("Job application {} not found", id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Internal(details) => {
                tracing::error!(details = %details, "request failed with an internal error");
                ApiError::Internal(INTERNAL_ERROR_MESSAGE.to_string())
            }
            other => other,
        };
        (status, Json(body)).into_response()
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ApiError::NotFound("Job application not found".to_string()),
            _ => ApiError::Internal(format!("{:?}", err)),
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        ApiError::Internal(format!("Database pool error: {:?}", err))
    }
}

macro_rules! from_rejection {
    ($rejection:ty) => {
        /// Malformed request input is a validation failure, reported in the structured error shape.
        impl From<$rejection> for ApiError {
            fn from(rejection: $rejection) -> Self {
                ApiError::Validation(rejection.body_text())
            }
        }
    };
}

from_rejection!(JsonRejection);
from_rejection!(QueryRejection);
from_rejection!(PathRejection);
