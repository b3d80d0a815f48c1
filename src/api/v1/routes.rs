/*
 * Responsibility
 * - v1 URL layout
 * - /health and the /admin consent admin operations
 */
use axum::{
    Router,
    routing::{delete, get},
};

use crate::api::v1::handlers::{admin, health::health};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/admin/search", get(admin::search))
        .route(
            "/admin/search/consent-status-audit",
            get(admin::search_status_audit),
        )
        .route("/admin/search/consent-file", get(admin::search_consent_file))
        .route(
            "/admin/consent-amendment-history",
            get(admin::amendment_history),
        )
        .route("/admin/revoke", delete(admin::revoke))
}
