/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Uniform conversion of credential / authorization / handler / envelope errors
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::DenialPolicy;
use crate::services::auth::{AccessJwtError, AuthorizationDenied, ClaimsError};
use crate::services::consent::{EnvelopeError, HandlerError, RegistryError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{code}: {message}")]
    Unauthorized { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    // Status chosen by the consent admin handler (or a body rejection).
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Map a guard denial according to the configured policy.
    pub fn denied(policy: DenialPolicy, denied: AuthorizationDenied) -> Self {
        match policy {
            DenialPolicy::Unauthorized => Self::unauthorized("unauthorized", denied.reason),
            DenialPolicy::NotFound => Self::not_found("consent data"),
        }
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::REQUEST_TIMEOUT => "request_timeout",
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        s if s.is_server_error() => "internal_error",
        _ => "request_failed",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized { code, message } => (StatusCode::UNAUTHORIZED, code, message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} not found."),
            ),
            AppError::Status { status, message } => (status, status_code_name(status), message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClaimsError> for AppError {
    fn from(e: ClaimsError) -> Self {
        // Missing header, wrong scheme and undecodable tokens are all client input errors.
        AppError::bad_request("malformed_credential", e.to_string())
    }
}

impl From<AccessJwtError> for AppError {
    fn from(e: AccessJwtError) -> Self {
        match e {
            AccessJwtError::Claims(e) => e.into(),
            AccessJwtError::Jwt(e) => {
                tracing::warn!(error = %e, "bearer credential rejected");
                AppError::unauthorized("invalid_token", "invalid bearer credential")
            }
        }
    }
}

impl From<HandlerError> for AppError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Status { status, message } => AppError::status(status, message),
            HandlerError::Context(e) => {
                tracing::error!(error = %e, "consent admin handler misused the request context");
                AppError::Internal
            }
            HandlerError::Other(e) => {
                tracing::error!(error = ?e, "consent admin handler failed");
                AppError::Internal
            }
        }
    }
}

impl From<EnvelopeError> for AppError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::InternalInconsistency => AppError::Internal,
            EnvelopeError::Serialize(e) => {
                tracing::error!(error = %e, "failed to encode consent admin response");
                AppError::Internal
            }
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Unavailable(reason) => {
                tracing::error!(%reason, "no consent admin handler");
                AppError::Internal
            }
        }
    }
}
