pub mod access_jwt;
pub mod claims;
pub mod factory;
pub mod guard;
pub mod identity;

pub use access_jwt::{AccessJwtError, AccessTokenVerifier, CredentialService};
pub use claims::{Claims, ClaimsError};
pub use factory::{build_authorization_guard, build_credential_service};
pub use guard::{AuthorizationDecision, AuthorizationDenied, AuthorizationGuard};
pub use identity::TenantContext;
