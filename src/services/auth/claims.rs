//! Bearer credential → claims (`sub`, `scope`).
//!
//! Only the body segment of the JWT is decoded here. Signature checks are done
//! upstream, or by `AccessTokenVerifier` when a public key is configured.

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("authorization header is not a bearer credential")]
    UnsupportedScheme,
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
}

/// Claims read from the body of a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub scopes: Vec<String>,
}

impl Claims {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

// `scope` is normally a space separated string; some issuers send an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScopeClaim {
    Joined(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    sub: Option<String>,
    #[serde(default)]
    scope: Option<ScopeClaim>,
}

/// Read the raw `Authorization` header value from a header map.
pub fn authorization_value(headers: &HeaderMap) -> Result<&str, ClaimsError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ClaimsError::MissingHeader)?;

    value.to_str().map_err(|_| {
        ClaimsError::MalformedCredential("authorization header is not valid ascii".into())
    })
}

/// Strip the `Bearer` scheme and return the credential.
pub fn bearer_token(raw: &str) -> Result<&str, ClaimsError> {
    let (scheme, token) = raw
        .trim()
        .split_once(' ')
        .ok_or(ClaimsError::UnsupportedScheme)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ClaimsError::UnsupportedScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ClaimsError::MalformedCredential("empty credential".into()));
    }

    Ok(token)
}

/// Decode the claims carried by `Authorization: Bearer <jwt>`.
pub fn extract(raw_authorization: &str) -> Result<Claims, ClaimsError> {
    let token = bearer_token(raw_authorization)?;
    decode_body(token)
}

fn decode_body(token: &str) -> Result<Claims, ClaimsError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::MalformedCredential(format!(
            "expected 3 segments, got {}",
            segments.len()
        )));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| ClaimsError::MalformedCredential(format!("body is not base64url: {e}")))?;

    let body: TokenBody = serde_json::from_slice(&bytes)
        .map_err(|e| ClaimsError::MalformedCredential(format!("body is not a json object: {e}")))?;

    let subject = body
        .sub
        .ok_or_else(|| ClaimsError::MalformedCredential("missing 'sub' claim".into()))?;

    let scopes = match body.scope {
        Some(ScopeClaim::Joined(s)) => s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(ScopeClaim::List(list)) => list,
        None => Vec::new(),
    };

    Ok(Claims { subject, scopes })
}
