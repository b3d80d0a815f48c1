//! Consent admin handler interface used by the dispatcher.
use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

use crate::services::consent::context::{ContextError, RequestContext};

/// Errors raised by a consent admin handler.
///
/// `Status` carries a client-facing outcome chosen by the handler; anything
/// else is reported as an internal error.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// The pluggable component that performs consent admin operations.
///
/// Every method must record an outcome on the context (`respond` /
/// `respond_empty`) before returning `Ok`.
#[async_trait]
pub trait ConsentAdminHandler: Send + Sync + 'static {
    // Handler name (for logging).
    fn name(&self) -> &'static str;

    async fn handle_search(&self, ctx: &mut RequestContext) -> HandlerResult;

    async fn handle_consent_status_audit_search(&self, ctx: &mut RequestContext) -> HandlerResult;

    async fn handle_consent_file_search(&self, ctx: &mut RequestContext) -> HandlerResult;

    async fn handle_consent_amendment_history_retrieval(
        &self,
        ctx: &mut RequestContext,
    ) -> HandlerResult;

    async fn handle_revoke(&self, ctx: &mut RequestContext) -> HandlerResult;
}
