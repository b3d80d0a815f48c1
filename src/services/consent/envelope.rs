//! Turns the outcome a handler left on the `RequestContext` into an HTTP response.

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::Response,
};

use crate::services::consent::context::RequestContext;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    // The handler returned without recording a status.
    #[error("response data unavailable")]
    InternalInconsistency,
    #[error("failed to serialize response payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn build(ctx: RequestContext) -> Result<Response, EnvelopeError> {
    let path = ctx.path().to_string();
    let (status, payload) = ctx.into_response_parts();

    let Some(status) = status else {
        tracing::error!(
            path = %path,
            "consent admin handler returned without setting a response status"
        );
        return Err(EnvelopeError::InternalInconsistency);
    };

    let mut response = match payload {
        Some(payload) => {
            let body = serde_json::to_vec(&payload)?;
            let mut response = Response::new(Body::from(body));
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
            response
        }
        None => Response::new(Body::empty()),
    };
    *response.status_mut() = status;

    Ok(response)
}
