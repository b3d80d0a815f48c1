//! Subject-level authorization for consent admin operations.
//!
//! A caller may act on a user's consent data when
//! - the credential carries the customer care officer scope, or
//! - the first value of the target query parameter is the caller's own user id
//!   (both sides tenant-qualified before comparison).
//!
//! There is no fallback to the caller's own id when the parameter is missing.

use crate::services::auth::claims::Claims;
use crate::services::auth::identity::TenantContext;
use crate::services::consent::context::RequestContext;

pub const SUBJECT_MISMATCH: &str = "requested subject and authenticated subject do not match";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct AuthorizationDenied {
    pub reason: &'static str,
}

impl AuthorizationDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), AuthorizationDenied> {
        if self.allowed {
            Ok(())
        } else {
            Err(AuthorizationDenied {
                reason: self.reason.unwrap_or(SUBJECT_MISMATCH),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    tenant: TenantContext,
    elevated_scope: String,
}

impl AuthorizationGuard {
    pub fn new(tenant: TenantContext, elevated_scope: impl Into<String>) -> Self {
        Self {
            tenant,
            elevated_scope: elevated_scope.into(),
        }
    }

    pub fn is_elevated(&self, claims: &Claims) -> bool {
        claims.has_scope(&self.elevated_scope)
    }

    pub fn authorize(
        &self,
        claims: &Claims,
        ctx: &RequestContext,
        target_param: &str,
    ) -> AuthorizationDecision {
        if self.is_elevated(claims) {
            tracing::debug!(
                path = %ctx.path(),
                "elevated scope present, subject check skipped"
            );
            return AuthorizationDecision::allow();
        }

        // Only the first value counts; extra values are ignored.
        let target = self
            .tenant
            .qualify(ctx.first_query_value(target_param).unwrap_or_default());
        let subject = self.tenant.qualify(&claims.subject);

        if !target.is_empty() && target == subject {
            return AuthorizationDecision::allow();
        }

        tracing::warn!(
            path = %ctx.path(),
            request_id = ctx.request_id().unwrap_or("-"),
            target_param,
            "invalid self care portal request: {}",
            SUBJECT_MISMATCH
        );
        AuthorizationDecision::deny(SUBJECT_MISMATCH)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, Method};

    use super::*;

    const OFFICER: &str = "consents:read_all";

    fn guard() -> AuthorizationGuard {
        AuthorizationGuard::new(TenantContext::new("t1"), OFFICER)
    }

    fn claims(subject: &str, scopes: &[&str]) -> Claims {
        Claims {
            subject: subject.to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ctx(query: &str) -> RequestContext {
        RequestContext::new(Method::GET, "/admin/search", HeaderMap::new()).with_query(Some(query))
    }

    #[test]
    fn elevated_scope_allows_any_target() {
        let officer = claims("agent", &["accounts", OFFICER]);

        for query in ["userIds=bob", "userIds=", "", "other=1"] {
            let decision = guard().authorize(&officer, &ctx(query), "userIds");
            assert!(decision.allowed, "officer denied for {query:?}");
        }
    }

    #[test]
    fn elevated_scope_must_match_exactly() {
        let almost = claims("agent", &["consents:read_all_lite"]);
        assert!(!guard().authorize(&almost, &ctx("userIds=bob"), "userIds").allowed);
    }

    #[test]
    fn own_identifier_is_allowed_bare_or_qualified() {
        let alice = claims("alice", &["accounts"]);

        assert!(guard().authorize(&alice, &ctx("userIds=alice"), "userIds").allowed);
        assert!(guard().authorize(&alice, &ctx("userIds=alice%40t1"), "userIds").allowed);

        let qualified = claims("alice@t1", &[]);
        assert!(guard().authorize(&qualified, &ctx("userIds=alice"), "userIds").allowed);
    }

    #[test]
    fn other_subject_is_denied_with_fixed_reason() {
        let alice = claims("alice", &["accounts"]);
        let decision = guard().authorize(&alice, &ctx("userIds=bob"), "userIds");

        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(SUBJECT_MISMATCH));
        assert_eq!(
            decision.into_result(),
            Err(AuthorizationDenied {
                reason: SUBJECT_MISMATCH
            })
        );
    }

    #[test]
    fn missing_or_empty_target_is_denied() {
        let alice = claims("alice", &["accounts"]);

        for query in ["", "userIds=", "userId=alice"] {
            let decision = guard().authorize(&alice, &ctx(query), "userIds");
            assert!(!decision.allowed, "allowed for {query:?}");
        }
    }

    #[test]
    fn empty_subject_never_matches_empty_target() {
        let nobody = claims("", &[]);
        assert!(!guard().authorize(&nobody, &ctx("userId="), "userId").allowed);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let alice = claims("alice", &[]);
        assert!(!guard().authorize(&alice, &ctx("userId=Alice"), "userId").allowed);
    }

    #[test]
    fn only_first_target_value_is_consulted() {
        let alice = claims("alice", &[]);

        assert!(guard().authorize(&alice, &ctx("userIds=alice&userIds=bob"), "userIds").allowed);
        assert!(!guard().authorize(&alice, &ctx("userIds=bob&userIds=alice"), "userIds").allowed);
    }
}
