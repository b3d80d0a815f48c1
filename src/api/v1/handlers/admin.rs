/*
 * Responsibility
 * - /admin consent admin handlers
 * - Subject-scoped operations: bearer claims -> authorization guard (denial mapped per policy)
 * - Resolve the handler, dispatch, and turn the context outcome into the response
 */
use axum::{extract::State, response::Response};

use crate::api::v1::extractors::AdminRequest;
use crate::error::AppError;
use crate::services::auth::claims;
use crate::services::consent::{ConsentOperation, RequestContext, dispatch, envelope};
use crate::state::AppState;

async fn process(
    state: &AppState,
    operation: ConsentOperation,
    mut ctx: RequestContext,
) -> Result<Response, AppError> {
    if let Some(target_param) = operation.subject_param() {
        let authorization = claims::authorization_value(ctx.headers())?;
        let claims = state.credentials.claims(authorization)?;

        state
            .guard
            .authorize(&claims, &ctx, target_param)
            .into_result()
            .map_err(|denied| {
                tracing::info!(%operation, path = %ctx.path(), "consent admin request denied");
                AppError::denied(state.denial_policy, denied)
            })?;
    }

    let handler = state.handlers.resolve().await?;
    dispatch(operation, &mut ctx, handler.as_ref()).await?;

    Ok(envelope::build(ctx)?)
}

pub async fn search(
    State(state): State<AppState>,
    AdminRequest(ctx): AdminRequest,
) -> Result<Response, AppError> {
    process(&state, ConsentOperation::Search, ctx).await
}

pub async fn search_status_audit(
    State(state): State<AppState>,
    AdminRequest(ctx): AdminRequest,
) -> Result<Response, AppError> {
    process(&state, ConsentOperation::SearchStatusAudit, ctx).await
}

pub async fn search_consent_file(
    State(state): State<AppState>,
    AdminRequest(ctx): AdminRequest,
) -> Result<Response, AppError> {
    process(&state, ConsentOperation::SearchConsentFile, ctx).await
}

pub async fn amendment_history(
    State(state): State<AppState>,
    AdminRequest(ctx): AdminRequest,
) -> Result<Response, AppError> {
    process(&state, ConsentOperation::GetAmendmentHistory, ctx).await
}

pub async fn revoke(
    State(state): State<AppState>,
    AdminRequest(ctx): AdminRequest,
) -> Result<Response, AppError> {
    process(&state, ConsentOperation::Revoke, ctx).await
}
