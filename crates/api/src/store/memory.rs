//! In-memory store
//!
//! Mirrors the PostgreSQL semantics (unique principal codes, composite-key
//! upsert) and counts every access so callers can assert that validation
//! happened before any I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    CredentialStore, FormFields, PageKey, PageStateRecord, PageStateRepository, Principal,
    StoreError,
};

#[derive(Default)]
pub struct InMemoryStore {
    principals: RwLock<HashMap<String, Principal>>,
    page_states: RwLock<HashMap<PageKey, PageStateRecord>>,
    accesses: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a principal; the code is stored exactly as given
    pub async fn insert_principal(&self, identity_code: &str, password_hash: &str) {
        self.principals.write().await.insert(
            identity_code.to_string(),
            Principal {
                identity_code: identity_code.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
    }

    /// Number of store operations issued so far
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Number of stored page state rows
    pub async fn page_state_count(&self) -> usize {
        self.page_states.read().await.len()
    }

    /// Make every subsequent operation fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin_access(&self) -> Result<(), StoreError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_principal(&self, identity_code: &str) -> Result<Option<Principal>, StoreError> {
        self.begin_access()?;
        Ok(self.principals.read().await.get(identity_code).cloned())
    }
}

#[async_trait]
impl PageStateRepository for InMemoryStore {
    async fn upsert_page_state(
        &self,
        key: &PageKey,
        form_fields: &FormFields,
        annotation: Option<&Value>,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.begin_access()?;
        // One write-lock acquisition gives the same match-or-insert atomicity
        self.page_states.write().await.insert(
            key.clone(),
            PageStateRecord {
                key: key.clone(),
                form_fields: form_fields.clone(),
                annotation: annotation.filter(|v| !v.is_null()).cloned(),
                updated_at,
            },
        );
        Ok(())
    }

    async fn find_page_state(&self, key: &PageKey) -> Result<Option<PageStateRecord>, StoreError> {
        self.begin_access()?;
        Ok(self.page_states.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = InMemoryStore::new();
        let key = PageKey::new("AB123", 1);

        let mut first = FormFields::new();
        first.insert("q1".to_string(), json!("yes"));
        store
            .upsert_page_state(&key, &first, None, OffsetDateTime::UNIX_EPOCH)
            .await
            .unwrap();

        let mut second = FormFields::new();
        second.insert("q2".to_string(), json!(3));
        store
            .upsert_page_state(&key, &second, Some(&json!("ink")), OffsetDateTime::UNIX_EPOCH)
            .await
            .unwrap();

        assert_eq!(store.page_state_count().await, 1);
        let record = store.find_page_state(&key).await.unwrap().unwrap();
        assert_eq!(record.form_fields, second);
        assert_eq!(record.annotation, Some(json!("ink")));
        assert_eq!(store.access_count(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_and_counts() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);

        let result = store.find_principal("AB123").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.access_count(), 1);
    }

    #[tokio::test]
    async fn test_principal_lookup_is_exact() {
        let store = InMemoryStore::new();
        store.insert_principal("AB123", "hash").await;

        assert!(store.find_principal("AB123").await.unwrap().is_some());
        assert!(store.find_principal("ab123").await.unwrap().is_none());
    }
}
