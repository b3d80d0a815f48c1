/*
 * Responsibility
 * - Reference ConsentAdminHandler backed by InMemoryConsentStore
 * - Query parameter parsing / validation for each operation (400 on bad input)
 * - Writes status + payload to the RequestContext (every path sets a status or returns an error)
 */
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::services::auth::identity::TenantContext;
use crate::services::consent::context::RequestContext;
use crate::services::consent::handler::{ConsentAdminHandler, HandlerError, HandlerResult};
use crate::services::consent::registry::ConsentAdminBuilder;
use crate::services::consent::store::{
    ConsentFilter, InMemoryConsentStore, Page, RevokeError, StatusAuditFilter,
};

/// Values of a multi-valued parameter; accepts repeated keys and comma lists.
fn list_param(ctx: &RequestContext, name: &str) -> Vec<String> {
    ctx.query_values(name)
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn single_param<'a>(ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
    ctx.first_query_value(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn required_param<'a>(ctx: &'a RequestContext, name: &str) -> Result<&'a str, HandlerError> {
    single_param(ctx, name)
        .ok_or_else(|| HandlerError::bad_request(format!("missing required parameter '{name}'")))
}

fn number_param<T: std::str::FromStr>(
    ctx: &RequestContext,
    name: &str,
) -> Result<Option<T>, HandlerError> {
    single_param(ctx, name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| HandlerError::bad_request(format!("invalid value for '{name}'")))
        })
        .transpose()
}

fn page(ctx: &RequestContext) -> Result<Page, HandlerError> {
    Ok(Page {
        limit: number_param(ctx, "limit")?,
        offset: number_param(ctx, "offset")?.unwrap_or(0),
    })
}

fn metadata(count: usize, page: Page, total: usize) -> Value {
    json!({
        "count": count,
        "offset": page.offset,
        "limit": page.limit,
        "total": total,
    })
}

#[derive(Debug, Clone)]
pub struct InMemoryConsentAdminHandler {
    store: Arc<InMemoryConsentStore>,
}

impl InMemoryConsentAdminHandler {
    pub fn new(store: Arc<InMemoryConsentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<InMemoryConsentStore> {
        &self.store
    }
}

#[async_trait]
impl ConsentAdminHandler for InMemoryConsentAdminHandler {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn handle_search(&self, ctx: &mut RequestContext) -> HandlerResult {
        let filter = ConsentFilter {
            consent_ids: list_param(ctx, "consentIDs"),
            client_ids: list_param(ctx, "clientIDs"),
            consent_types: list_param(ctx, "consentTypes"),
            consent_statuses: list_param(ctx, "consentStatuses"),
            // Only the first user id is authorized by the guard; extra values are ignored.
            user_ids: single_param(ctx, "userIds")
                .map(|u| vec![u.to_string()])
                .unwrap_or_default(),
            from_time: number_param(ctx, "fromTime")?,
            to_time: number_param(ctx, "toTime")?,
        };
        let page = page(ctx)?;

        let (records, total) = self.store.search(&filter, page).await;
        let body = json!({
            "metadata": metadata(records.len(), page, total),
            "data": records,
        });

        ctx.respond(StatusCode::OK, body)?;
        Ok(())
    }

    async fn handle_consent_status_audit_search(&self, ctx: &mut RequestContext) -> HandlerResult {
        let filter = StatusAuditFilter {
            consent_ids: list_param(ctx, "consentIDs"),
            statuses: list_param(ctx, "status"),
            action_by: single_param(ctx, "actionBy").map(str::to_string),
            from_time: number_param(ctx, "fromTime")?,
            to_time: number_param(ctx, "toTime")?,
        };
        let page = page(ctx)?;

        let (entries, total) = self.store.search_status_audit(&filter, page).await;
        let body = json!({
            "metadata": metadata(entries.len(), page, total),
            "data": entries,
        });

        ctx.respond(StatusCode::OK, body)?;
        Ok(())
    }

    async fn handle_consent_file_search(&self, ctx: &mut RequestContext) -> HandlerResult {
        let consent_id = required_param(ctx, "consentID")?.to_string();

        let file = self
            .store
            .get(&consent_id)
            .await
            .and_then(|record| record.consent_file)
            .ok_or_else(|| HandlerError::not_found("consent file not found"))?;

        ctx.respond(
            StatusCode::OK,
            json!({ "consentID": consent_id, "consentFile": file }),
        )?;
        Ok(())
    }

    async fn handle_consent_amendment_history_retrieval(
        &self,
        ctx: &mut RequestContext,
    ) -> HandlerResult {
        let consent_id = required_param(ctx, "consentID")?.to_string();

        let record = self
            .store
            .get(&consent_id)
            .await
            .ok_or_else(|| HandlerError::not_found("consent not found"))?;

        let history = record.amendment_history.clone();
        let body = json!({
            "consentID": consent_id,
            "totalAmendments": history.len(),
            "currentConsent": record,
            "consentAmendmentHistory": history,
        });

        ctx.respond(StatusCode::OK, body)?;
        Ok(())
    }

    async fn handle_revoke(&self, ctx: &mut RequestContext) -> HandlerResult {
        let consent_id = required_param(ctx, "consentID")?.to_string();
        let user_id = single_param(ctx, "userId").map(str::to_string);
        let reason = ctx
            .payload()
            .and_then(|p| p.get("revocationReason"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let now = chrono::Utc::now().timestamp();
        match self
            .store
            .revoke(&consent_id, user_id.as_deref(), reason, now)
            .await
        {
            Ok(_) => {
                tracing::info!(consent_id = %consent_id, "consent revoked");
                ctx.respond_empty(StatusCode::NO_CONTENT)?;
                Ok(())
            }
            Err(RevokeError::NotFound) => Err(HandlerError::not_found("consent not found")),
            Err(err @ RevokeError::AlreadyRevoked) => Err(HandlerError::bad_request(err.to_string())),
        }
    }
}

/// Builds the in-memory handler, loading the optional seed file on first use.
#[derive(Debug, Clone)]
pub struct InMemoryBuilder {
    tenant: TenantContext,
    seed_file: Option<PathBuf>,
}

impl InMemoryBuilder {
    pub fn new(tenant: TenantContext, seed_file: Option<PathBuf>) -> Self {
        Self { tenant, seed_file }
    }
}

#[async_trait]
impl ConsentAdminBuilder for InMemoryBuilder {
    async fn build(&self) -> anyhow::Result<Arc<dyn ConsentAdminHandler>> {
        let store = Arc::new(InMemoryConsentStore::new(self.tenant.clone()));

        if let Some(path) = &self.seed_file {
            let count = store.load_seed_file(path).await?;
            tracing::info!(path = %path.display(), count, "consent seed data loaded");
        }

        Ok(Arc::new(InMemoryConsentAdminHandler::new(store)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, Method};

    use super::*;
    use crate::services::consent::store::fixtures::record;
    use crate::services::consent::store::STATUS_REVOKED;

    async fn handler() -> InMemoryConsentAdminHandler {
        let store = Arc::new(InMemoryConsentStore::new(TenantContext::new("t1")));
        store.insert(record("c-1", "alice", 100)).await;
        let mut with_file = record("c-2", "bob", 200);
        with_file.consent_file = Some("signed-file".to_string());
        store.insert(with_file).await;
        InMemoryConsentAdminHandler::new(store)
    }

    fn request(method: Method, query: &str) -> RequestContext {
        RequestContext::new(method, "/admin", HeaderMap::new()).with_query(Some(query))
    }

    fn status_of(err: HandlerError) -> StatusCode {
        match err {
            HandlerError::Status { status, .. } => status,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_returns_data_and_metadata() {
        let handler = handler().await;
        let mut ctx = request(Method::GET, "limit=1");

        handler.handle_search(&mut ctx).await.unwrap();

        assert_eq!(ctx.response_status(), Some(StatusCode::OK));
        let body = ctx.response_payload().unwrap();
        assert_eq!(body["metadata"]["total"], 2);
        assert_eq!(body["metadata"]["count"], 1);
        assert_eq!(body["metadata"]["limit"], 1);
        assert_eq!(body["data"][0]["consentID"], "c-2");
        assert!(body["data"][0].get("consentFile").is_none());
    }

    #[tokio::test]
    async fn search_uses_only_the_first_user_id() {
        let handler = handler().await;
        let mut ctx = request(Method::GET, "userIds=alice&userIds=bob");

        handler.handle_search(&mut ctx).await.unwrap();

        let body = ctx.response_payload().unwrap();
        assert_eq!(body["metadata"]["total"], 1);
        assert_eq!(body["data"][0]["consentID"], "c-1");
    }

    #[tokio::test]
    async fn invalid_paging_is_a_bad_request() {
        let handler = handler().await;
        let mut ctx = request(Method::GET, "limit=ten");

        let err = handler.handle_search(&mut ctx).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.response_status(), None);
    }

    #[tokio::test]
    async fn consent_file_requires_known_consent() {
        let handler = handler().await;

        let mut found = request(Method::GET, "consentID=c-2");
        handler.handle_consent_file_search(&mut found).await.unwrap();
        assert_eq!(found.response_payload().unwrap()["consentFile"], "signed-file");

        let mut no_file = request(Method::GET, "consentID=c-1");
        let err = handler.handle_consent_file_search(&mut no_file).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);

        let mut missing = request(Method::GET, "");
        let err = handler.handle_consent_file_search(&mut missing).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn amendment_history_includes_current_consent() {
        let handler = handler().await;
        let mut ctx = request(Method::GET, "consentID=c-1");

        handler
            .handle_consent_amendment_history_retrieval(&mut ctx)
            .await
            .unwrap();

        let body = ctx.response_payload().unwrap();
        assert_eq!(body["currentConsent"]["consentID"], "c-1");
        assert_eq!(body["totalAmendments"], 0);
    }

    #[tokio::test]
    async fn revoke_sets_no_content_and_records_reason() {
        let handler = handler().await;
        let mut ctx = request(Method::DELETE, "consentID=c-1&userId=alice")
            .with_payload(Some(json!({"revocationReason": "moved bank"})));

        handler.handle_revoke(&mut ctx).await.unwrap();
        assert_eq!(ctx.response_status(), Some(StatusCode::NO_CONTENT));
        assert_eq!(ctx.response_payload(), None);

        let record = handler.store().get("c-1").await.unwrap();
        assert_eq!(record.current_status, STATUS_REVOKED);
        let audit = record.status_audit.last().unwrap();
        assert_eq!(audit.reason.as_deref(), Some("moved bank"));

        let mut again = request(Method::DELETE, "consentID=c-1&userId=alice");
        let err = handler.handle_revoke(&mut again).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn builder_loads_nothing_without_seed() {
        let builder = InMemoryBuilder::new(TenantContext::new("t1"), None);
        let handler = builder.build().await.unwrap();
        assert_eq!(handler.name(), "in-memory");

        let mut ctx = request(Method::GET, "");
        handler.handle_search(&mut ctx).await.unwrap();
        assert_eq!(ctx.response_payload().unwrap()["metadata"]["total"], 0);
    }

    #[tokio::test]
    async fn builder_fails_on_missing_seed_file() {
        let builder = InMemoryBuilder::new(
            TenantContext::new("t1"),
            Some(PathBuf::from("/nonexistent/consents.json")),
        );
        assert!(builder.build().await.is_err());
    }
}
