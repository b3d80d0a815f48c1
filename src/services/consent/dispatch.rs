/*
 * Responsibility
 * - The closed set of consent admin operations
 * - Which operations need the subject check, and on which query parameter
 * - Invoke the matching handler method (no business logic, handler errors pass through)
 */
use std::fmt;

use crate::services::consent::context::RequestContext;
use crate::services::consent::handler::{ConsentAdminHandler, HandlerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentOperation {
    Search,
    SearchStatusAudit,
    SearchConsentFile,
    GetAmendmentHistory,
    Revoke,
}

impl ConsentOperation {
    pub const ALL: [ConsentOperation; 5] = [
        Self::Search,
        Self::SearchStatusAudit,
        Self::SearchConsentFile,
        Self::GetAmendmentHistory,
        Self::Revoke,
    ];

    /// Query parameter naming the user whose data is touched, for operations
    /// scoped to a single subject. `None` means no subject check.
    pub fn subject_param(self) -> Option<&'static str> {
        match self {
            Self::Search => Some("userIds"),
            Self::Revoke => Some("userId"),
            Self::SearchStatusAudit | Self::SearchConsentFile | Self::GetAmendmentHistory => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::SearchStatusAudit => "search_status_audit",
            Self::SearchConsentFile => "search_consent_file",
            Self::GetAmendmentHistory => "get_amendment_history",
            Self::Revoke => "revoke",
        }
    }
}

impl fmt::Display for ConsentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub async fn dispatch(
    operation: ConsentOperation,
    ctx: &mut RequestContext,
    handler: &dyn ConsentAdminHandler,
) -> HandlerResult {
    tracing::debug!(%operation, handler = handler.name(), path = %ctx.path(), "dispatching");

    match operation {
        ConsentOperation::Search => handler.handle_search(ctx).await,
        ConsentOperation::SearchStatusAudit => handler.handle_consent_status_audit_search(ctx).await,
        ConsentOperation::SearchConsentFile => handler.handle_consent_file_search(ctx).await,
        ConsentOperation::GetAmendmentHistory => {
            handler.handle_consent_amendment_history_retrieval(ctx).await
        }
        ConsentOperation::Revoke => handler.handle_revoke(ctx).await,
    }
}
