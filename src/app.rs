/*
 * Responsibility
 * - Tracing / panic hook setup
 * - Config -> services -> AppState -> Router
 * - Middleware (security headers, CORS, request id / limits / tracing)
 * - axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::{TenantContext, build_authorization_guard, build_credential_service};
use crate::services::consent::{HandlerRegistry, InMemoryBuilder};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,consent_admin=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics through tracing; stderr may not be collected.
        tracing::error!(?info, "panic");

        // Development: crash so the bug is noticed. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting consent admin API in {:?} mode on {} (tenant {})",
        config.app_env,
        config.addr,
        config.tenant_domain
    );

    let state = build_state(&config, default_registry(&config))?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Registry that lazily builds the in-memory handler on first use.
pub fn default_registry(config: &Config) -> Arc<HandlerRegistry> {
    let builder = InMemoryBuilder::new(
        TenantContext::new(config.tenant_domain.clone()),
        config.consent_seed_file.clone(),
    );
    Arc::new(HandlerRegistry::new(Arc::new(builder)))
}

pub fn build_state(config: &Config, handlers: Arc<HandlerRegistry>) -> Result<AppState> {
    let credentials = build_credential_service(config)?;
    let guard = build_authorization_guard(config);

    Ok(AppState::new(
        credentials,
        guard,
        handlers,
        config.denial_policy,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}
