/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - credential service, authorization guard, consent admin handler registry, denial policy
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::config::DenialPolicy;
use crate::services::auth::{AuthorizationGuard, CredentialService};
use crate::services::consent::HandlerRegistry;

#[derive(Clone, Debug)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub guard: Arc<AuthorizationGuard>,
    pub handlers: Arc<HandlerRegistry>,
    pub denial_policy: DenialPolicy,
}

impl AppState {
    pub fn new(
        credentials: Arc<CredentialService>,
        guard: Arc<AuthorizationGuard>,
        handlers: Arc<HandlerRegistry>,
        denial_policy: DenialPolicy,
    ) -> Self {
        Self {
            credentials,
            guard,
            handlers,
            denial_policy,
        }
    }
}
