/*
 * Responsibility
 * - Router-level middleware (cors, http, security headers)
 */
pub mod cors;
pub mod http;
pub mod security_headers;
