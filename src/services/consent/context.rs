/*
 * Responsibility
 * - Per-request data shared by the guard, the dispatcher and the consent admin handler
 *   (headers, query params, payload, path) plus the outcome the handler writes back
 * - Response status is written exactly once; the envelope builder consumes the context
 */
use std::collections::HashMap;

use axum::http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

pub type QueryParams = HashMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("response status already set to {0}")]
    AlreadyResolved(StatusCode),
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    headers: HeaderMap,
    query_params: QueryParams,
    payload: Option<Value>,
    path: String,
    method: Method,
    request_id: Option<String>,

    response_status: Option<StatusCode>,
    response_payload: Option<Value>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            headers,
            query_params: QueryParams::new(),
            payload: None,
            path: path.into(),
            method,
            request_id,
            response_status: None,
            response_payload: None,
        }
    }

    /// Parse a raw query string (`a=1&a=2&b=x`), keeping repeated keys in order.
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                self.query_params
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        self
    }

    pub fn with_payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// All values of a parameter, in the order they were received.
    pub fn query_values(&self, name: &str) -> &[String] {
        self.query_params
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first_query_value(&self, name: &str) -> Option<&str> {
        self.query_values(name).first().map(String::as_str)
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    pub fn response_payload(&self) -> Option<&Value> {
        self.response_payload.as_ref()
    }

    /// Record the outcome with a JSON body.
    pub fn respond(&mut self, status: StatusCode, payload: Value) -> Result<(), ContextError> {
        self.resolve(status, Some(payload))
    }

    /// Record the outcome without a body.
    pub fn respond_empty(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.resolve(status, None)
    }

    fn resolve(&mut self, status: StatusCode, payload: Option<Value>) -> Result<(), ContextError> {
        if let Some(existing) = self.response_status {
            return Err(ContextError::AlreadyResolved(existing));
        }
        self.response_status = Some(status);
        self.response_payload = payload;
        Ok(())
    }

    pub(crate) fn into_response_parts(self) -> (Option<StatusCode>, Option<Value>) {
        (self.response_status, self.response_payload)
    }
}
