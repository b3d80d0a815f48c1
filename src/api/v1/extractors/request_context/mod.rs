/*!
 * Consent admin request extractor
 *
 * Responsibility:
 * - Build the `RequestContext` (headers, query params, payload, path) from an HTTP request
 * - Keep the axum plumbing in core; the context type itself lives in services::consent
 *
 * Public API:
 * - AdminRequest
 */

mod core;

pub use core::AdminRequest;
