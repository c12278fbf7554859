//! API error handling
//!
//! Maps service errors onto HTTP statuses: missing aggregates are 404,
//! rejected input is 422, lifecycle conflicts are 409 and anything the
//! caller may retry is 503.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use app_services::AssemblyError;
use core_kernel::PortError;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Vec<String>>,
    },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into(), details: None }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
        };

        let details = match self {
            ApiError::Validation { details, .. } => details,
            _ => None,
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AssemblyError> for ApiError {
    fn from(err: AssemblyError) -> Self {
        let message = err.to_string();
        match err {
            AssemblyError::CustomerNotFound(_)
            | AssemblyError::PolicyNotFound(_)
            | AssemblyError::ClaimNotFound(_) => ApiError::NotFound(message),
            AssemblyError::MissingRequiredCoverage { missing, .. } => ApiError::Validation {
                message,
                details: Some(missing),
            },
            AssemblyError::Validation(_) => ApiError::validation(message),
            AssemblyError::InvalidTransition(_) => ApiError::Conflict(message),
            AssemblyError::AllocatorUnavailable(ref e) if e.is_transient() => {
                ApiError::ServiceUnavailable(message)
            }
            AssemblyError::Persistence(ref e) if e.is_transient() => ApiError::ServiceUnavailable(message),
            AssemblyError::Persistence(PortError::Conflict { .. }) => ApiError::Conflict(message),
            AssemblyError::Persistence(PortError::Validation { .. }) => ApiError::validation(message),
            other => {
                error!(error = %other, "Unhandled service error");
                ApiError::Internal(message)
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        ApiError::Validation {
            message: errors.to_string(),
            details: Some(fields),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized
    }
}
