//! In-memory consent records for the reference consent admin handler.
//!
//! Records are keyed by consent id. Nothing is persisted; an optional JSON
//! seed file can be loaded when the handler is first built.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::auth::identity::TenantContext;

pub const STATUS_REVOKED: &str = "revoked";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub authorization_status: String,
    #[serde(default)]
    pub authorization_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAuditRecord {
    #[serde(rename = "statusAuditID")]
    pub status_audit_id: String,
    #[serde(rename = "consentID")]
    pub consent_id: String,
    pub current_status: String,
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub action_by: Option<String>,
    pub action_time: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendmentRecord {
    #[serde(rename = "amendmentID")]
    pub amendment_id: String,
    pub amended_timestamp: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub previous_receipt: Value,
}

/// A consent as exposed by the search operation.
///
/// The consent file, status audit and amendment history are only returned by
/// their dedicated operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    #[serde(rename = "consentID")]
    pub consent_id: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub consent_type: String,
    pub current_status: String,
    pub created_timestamp: i64,
    pub updated_timestamp: i64,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    #[serde(default)]
    pub receipt: Value,

    #[serde(default, skip_serializing)]
    pub consent_file: Option<String>,
    #[serde(default, skip_serializing)]
    pub status_audit: Vec<StatusAuditRecord>,
    #[serde(default, skip_serializing)]
    pub amendment_history: Vec<AmendmentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsentFilter {
    pub consent_ids: Vec<String>,
    pub client_ids: Vec<String>,
    pub consent_types: Vec<String>,
    pub consent_statuses: Vec<String>,
    pub user_ids: Vec<String>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusAuditFilter {
    pub consent_ids: Vec<String>,
    pub statuses: Vec<String>,
    pub action_by: Option<String>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let items = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RevokeError {
    #[error("consent not found")]
    NotFound,
    #[error("consent is already revoked")]
    AlreadyRevoked,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read consent seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid consent seed file: {0}")]
    Json(#[from] serde_json::Error),
}

fn matches_any(filter: &[String], value: &str) -> bool {
    filter.is_empty() || filter.iter().any(|v| v == value)
}

fn within(from: Option<i64>, to: Option<i64>, at: i64) -> bool {
    from.is_none_or(|from| at >= from) && to.is_none_or(|to| at <= to)
}

#[derive(Debug)]
pub struct InMemoryConsentStore {
    tenant: TenantContext,
    records: RwLock<BTreeMap<String, ConsentRecord>>,
}

impl InMemoryConsentStore {
    pub fn new(tenant: TenantContext) -> Self {
        Self {
            tenant,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn load_seed_file(&self, path: &Path) -> Result<usize, SeedError> {
        let raw = tokio::fs::read(path).await?;
        let records: Vec<ConsentRecord> = serde_json::from_slice(&raw)?;
        let count = records.len();
        for record in records {
            self.insert(record).await;
        }
        Ok(count)
    }

    pub async fn insert(&self, record: ConsentRecord) {
        self.records
            .write()
            .await
            .insert(record.consent_id.clone(), record);
    }

    pub async fn get(&self, consent_id: &str) -> Option<ConsentRecord> {
        self.records.read().await.get(consent_id).cloned()
    }

    fn authorizes(&self, record: &ConsentRecord, qualified_user: &str) -> bool {
        record
            .authorizations
            .iter()
            .any(|a| self.tenant.qualify(&a.user_id) == qualified_user)
    }

    /// Matching consents (newest first) and the total before paging.
    pub async fn search(&self, filter: &ConsentFilter, page: Page) -> (Vec<ConsentRecord>, usize) {
        let user_ids: Vec<String> = filter
            .user_ids
            .iter()
            .map(|u| self.tenant.qualify(u))
            .collect();

        let records = self.records.read().await;
        let mut found: Vec<ConsentRecord> = records
            .values()
            .filter(|r| matches_any(&filter.consent_ids, &r.consent_id))
            .filter(|r| matches_any(&filter.client_ids, &r.client_id))
            .filter(|r| matches_any(&filter.consent_types, &r.consent_type))
            .filter(|r| matches_any(&filter.consent_statuses, &r.current_status))
            .filter(|r| user_ids.is_empty() || user_ids.iter().any(|u| self.authorizes(r, u)))
            .filter(|r| within(filter.from_time, filter.to_time, r.created_timestamp))
            .cloned()
            .collect();
        drop(records);

        found.sort_by(|a, b| {
            b.created_timestamp
                .cmp(&a.created_timestamp)
                .then_with(|| a.consent_id.cmp(&b.consent_id))
        });

        let total = found.len();
        (page.apply(found), total)
    }

    /// Matching status audit entries (oldest first) and the total before paging.
    pub async fn search_status_audit(
        &self,
        filter: &StatusAuditFilter,
        page: Page,
    ) -> (Vec<StatusAuditRecord>, usize) {
        let records = self.records.read().await;
        let mut found: Vec<StatusAuditRecord> = records
            .values()
            .filter(|r| matches_any(&filter.consent_ids, &r.consent_id))
            .flat_map(|r| r.status_audit.iter())
            .filter(|a| matches_any(&filter.statuses, &a.current_status))
            .filter(|a| match &filter.action_by {
                Some(actor) => a.action_by.as_deref() == Some(actor.as_str()),
                None => true,
            })
            .filter(|a| within(filter.from_time, filter.to_time, a.action_time))
            .cloned()
            .collect();
        drop(records);

        found.sort_by(|a, b| {
            a.action_time
                .cmp(&b.action_time)
                .then_with(|| a.status_audit_id.cmp(&b.status_audit_id))
        });

        let total = found.len();
        (page.apply(found), total)
    }

    /// Revoke a consent and its authorizations, recording a status audit entry.
    ///
    /// With `user_id` set the consent must be authorized for that user; a
    /// consent owned by somebody else is reported as not found.
    pub async fn revoke(
        &self,
        consent_id: &str,
        user_id: Option<&str>,
        reason: Option<String>,
        now: i64,
    ) -> Result<ConsentRecord, RevokeError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(consent_id).ok_or(RevokeError::NotFound)?;

        if let Some(user_id) = user_id
            && !self.authorizes(record, &self.tenant.qualify(user_id))
        {
            return Err(RevokeError::NotFound);
        }

        if record.current_status.eq_ignore_ascii_case(STATUS_REVOKED) {
            return Err(RevokeError::AlreadyRevoked);
        }

        let previous_status = std::mem::replace(&mut record.current_status, STATUS_REVOKED.to_string());
        record.updated_timestamp = now;
        for authorization in &mut record.authorizations {
            authorization.authorization_status = STATUS_REVOKED.to_string();
        }
        record.status_audit.push(StatusAuditRecord {
            status_audit_id: Uuid::new_v4().to_string(),
            consent_id: record.consent_id.clone(),
            current_status: STATUS_REVOKED.to_string(),
            previous_status: Some(previous_status),
            action_by: user_id.map(|u| self.tenant.qualify(u)),
            action_time: now,
            reason,
        });

        Ok(record.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    async fn store() -> InMemoryConsentStore {
        let store = InMemoryConsentStore::new(TenantContext::new("t1"));
        store.insert(record("c-1", "alice", 100)).await;
        store.insert(record("c-2", "bob@t1", 200)).await;
        let mut other = record("c-3", "alice", 300);
        other.client_id = "client-2".to_string();
        other.consent_type = "payments".to_string();
        store.insert(other).await;
        store
    }

    fn ids(records: &[ConsentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.consent_id.as_str()).collect()
    }

    #[tokio::test]
    async fn search_filters_by_tenant_qualified_user() {
        let store = store().await;

        let filter = ConsentFilter {
            user_ids: vec!["alice@t1".to_string()],
            ..Default::default()
        };
        let (found, total) = store.search(&filter, Page::default()).await;
        assert_eq!(ids(&found), ["c-3", "c-1"]);
        assert_eq!(total, 2);

        let filter = ConsentFilter {
            user_ids: vec!["bob".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&store.search(&filter, Page::default()).await.0), ["c-2"]);
    }

    #[tokio::test]
    async fn search_combines_filters_and_pages() {
        let store = store().await;

        let filter = ConsentFilter {
            client_ids: vec!["client-1".to_string()],
            consent_types: vec!["accounts".to_string()],
            from_time: Some(150),
            ..Default::default()
        };
        assert_eq!(ids(&store.search(&filter, Page::default()).await.0), ["c-2"]);

        let page = Page {
            limit: Some(1),
            offset: 1,
        };
        let (found, total) = store.search(&ConsentFilter::default(), page).await;
        assert_eq!(ids(&found), ["c-2"]);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn revoke_updates_status_and_audit() {
        let store = store().await;

        let revoked = store
            .revoke("c-1", Some("alice"), Some("user request".to_string()), 500)
            .await
            .unwrap();

        assert_eq!(revoked.current_status, STATUS_REVOKED);
        assert_eq!(revoked.updated_timestamp, 500);
        assert!(
            revoked
                .authorizations
                .iter()
                .all(|a| a.authorization_status == STATUS_REVOKED)
        );

        let last = revoked.status_audit.last().unwrap();
        assert_eq!(last.previous_status.as_deref(), Some("authorised"));
        assert_eq!(last.action_by.as_deref(), Some("alice@t1"));
        assert_eq!(last.reason.as_deref(), Some("user request"));

        assert_eq!(
            store.revoke("c-1", None, None, 600).await,
            Err(RevokeError::AlreadyRevoked)
        );
    }

    #[tokio::test]
    async fn revoke_hides_consents_of_other_users() {
        let store = store().await;

        assert_eq!(
            store.revoke("c-2", Some("alice"), None, 500).await,
            Err(RevokeError::NotFound)
        );
        assert_eq!(
            store.revoke("missing", None, None, 500).await,
            Err(RevokeError::NotFound)
        );
        assert_eq!(store.get("c-2").await.unwrap().current_status, "authorised");
    }

    #[tokio::test]
    async fn status_audit_search_filters_and_orders() {
        let store = store().await;
        store.revoke("c-1", Some("alice"), None, 400).await.unwrap();

        let filter = StatusAuditFilter {
            consent_ids: vec!["c-1".to_string()],
            ..Default::default()
        };
        let (found, total) = store.search_status_audit(&filter, Page::default()).await;
        assert_eq!(total, 2);
        assert_eq!(found[0].current_status, "authorised");
        assert_eq!(found[1].current_status, STATUS_REVOKED);

        let filter = StatusAuditFilter {
            statuses: vec![STATUS_REVOKED.to_string()],
            action_by: Some("alice@t1".to_string()),
            ..Default::default()
        };
        let (found, _) = store.search_status_audit(&filter, Page::default()).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].consent_id, "c-1");
    }

    #[tokio::test]
    async fn seed_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("consent-seed-{}.json", Uuid::new_v4()));
        let seed = serde_json::to_vec(&serde_json::json!([{
            "consentID": "seed-1",
            "clientID": "client-9",
            "consentType": "accounts",
            "currentStatus": "authorised",
            "createdTimestamp": 1,
            "updatedTimestamp": 1,
            "authorizations": [{"userID": "carol", "authorizationStatus": "authorised"}],
            "consentFile": "file-body"
        }]))
        .unwrap();
        tokio::fs::write(&path, seed).await.unwrap();

        let store = InMemoryConsentStore::new(TenantContext::new("t1"));
        assert_eq!(store.load_seed_file(&path).await.unwrap(), 1);
        let record = store.get("seed-1").await.unwrap();
        assert_eq!(record.consent_file.as_deref(), Some("file-body"));

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn broken_seed_file_is_reported() {
        let store = InMemoryConsentStore::new(TenantContext::new("t1"));
        let missing = std::env::temp_dir().join(format!("missing-{}.json", Uuid::new_v4()));
        assert!(matches!(
            store.load_seed_file(&missing).await,
            Err(SeedError::Io(_))
        ));
    }
}
