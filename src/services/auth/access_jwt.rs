use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::IgnoredAny;
use std::{error::Error as StdError, fmt};

use crate::config::TokenVerification;
use crate::services::auth::claims::{self, Claims, ClaimsError};

// Errors returned by credential decoding + (optional) signature verification.
#[derive(Debug)]
pub enum AccessJwtError {
    Claims(ClaimsError),
    Jwt(jsonwebtoken::errors::Error),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claims(e) => write!(f, "{}", e),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Claims(e) => Some(e),
            Self::Jwt(e) => Some(e),
        }
    }
}

impl From<ClaimsError> for AccessJwtError {
    fn from(e: ClaimsError) -> Self {
        Self::Claims(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// EdDSA (Ed25519) signature check for bearer credentials.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AccessTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenVerifier {
    pub fn new(settings: &TokenVerification) -> Result<Self, String> {
        let decoding_key = DecodingKey::from_ed_pem(settings.public_key_pem.as_bytes())
            .map_err(|e| format!("invalid ed25519 public key pem: {}", e))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = settings.leeway_seconds;
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify signature, exp and (when configured) iss/aud.
    // The claims themselves are read by `claims::extract`.
    pub fn verify(&self, token: &str) -> Result<(), jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<IgnoredAny>(token, &self.decoding_key, &self.validation)?;
        Ok(())
    }
}

/// Turns the `Authorization` header into `Claims`.
///
/// The body is always decoded first so structural problems are reported as
/// malformed credentials even when signature verification is enabled.
#[derive(Clone, Debug, Default)]
pub struct CredentialService {
    verifier: Option<AccessTokenVerifier>,
}

impl CredentialService {
    pub fn new(verifier: Option<AccessTokenVerifier>) -> Self {
        Self { verifier }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn claims(&self, raw_authorization: &str) -> Result<Claims, AccessJwtError> {
        let claims = claims::extract(raw_authorization)?;

        if let Some(verifier) = &self.verifier {
            let token = claims::bearer_token(raw_authorization)?;
            verifier.verify(token)?;
        }

        Ok(claims)
    }
}
