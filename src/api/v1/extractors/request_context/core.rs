use axum::{
    body::Bytes,
    extract::{FromRequest, OriginalUri, Request},
    http::{HeaderMap, header},
};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::services::consent::RequestContext;
use crate::state::AppState;

/// Handler argument carrying the consent admin `RequestContext`.
/// Consumes the body, so it must be the last extractor.
#[derive(Debug)]
pub struct AdminRequest(pub RequestContext);

fn media_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// JSON body as-is, form body as a flat JSON object of strings; no body means no payload.
pub(super) fn parse_payload(headers: &HeaderMap, body: &[u8]) -> Result<Option<Value>, AppError> {
    if body.is_empty() {
        return Ok(None);
    }

    let media_type = media_type(headers);
    if media_type == "application/json" || media_type.ends_with("+json") {
        return serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| AppError::bad_request("invalid_body", format!("invalid JSON body: {e}")));
    }

    if media_type == "application/x-www-form-urlencoded" {
        let fields: Map<String, Value> = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        return Ok(Some(Value::Object(fields)));
    }

    Err(AppError::bad_request(
        "unsupported_media_type",
        "request body must be JSON or form encoded",
    ))
}

impl FromRequest<AppState> for AdminRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        // Nested routers strip their prefix from `uri`; log the full path.
        let path = req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let query = req.uri().query().map(str::to_string);
        let method = req.method().clone();
        let headers = req.headers().clone();

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::status(rejection.status(), rejection.body_text()))?;
        let payload = parse_payload(&headers, &body)?;

        let ctx = RequestContext::new(method, path, headers)
            .with_query(query.as_deref())
            .with_payload(payload);

        Ok(Self(ctx))
    }
}
