/// Factory: build the credential and authorization services from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AccessTokenVerifier, AuthorizationGuard, CredentialService, TenantContext};

pub fn build_credential_service(config: &Config) -> anyhow::Result<Arc<CredentialService>> {
    let verifier = match &config.token_verification {
        Some(settings) => {
            let verifier = AccessTokenVerifier::new(settings).map_err(anyhow::Error::msg)?;
            tracing::info!(
                issuer = settings.issuer.as_deref().unwrap_or("-"),
                audience = settings.audience.as_deref().unwrap_or("-"),
                "bearer credential signatures will be verified"
            );
            Some(verifier)
        }
        None => {
            tracing::info!("bearer credential signatures are assumed to be verified upstream");
            None
        }
    };

    Ok(Arc::new(CredentialService::new(verifier)))
}

pub fn build_authorization_guard(config: &Config) -> Arc<AuthorizationGuard> {
    Arc::new(AuthorizationGuard::new(
        TenantContext::new(config.tenant_domain.clone()),
        config.customer_care_officer_scope.clone(),
    ))
}
