//! Persistence seams
//!
//! The core talks to storage only through the traits below. Production uses
//! [`postgres::PgStore`]; tests and local runs can use [`memory::InMemoryStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Opaque form-field mapping saved per page
pub type FormFields = Map<String, Value>;

/// A provisioned student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Canonical (uppercase) identity code
    pub identity_code: String,
    pub password_hash: String,
}

/// Composite key of a page state row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub identity_code: String,
    pub page_number: i32,
}

impl PageKey {
    pub fn new(identity_code: impl Into<String>, page_number: i32) -> Self {
        Self {
            identity_code: identity_code.into(),
            page_number,
        }
    }
}

/// Stored form state for one student and page
#[derive(Debug, Clone, PartialEq)]
pub struct PageStateRecord {
    pub key: PageKey,
    pub form_fields: FormFields,
    pub annotation: Option<Value>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to provisioned principals
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a principal by its already-normalized identity code
    async fn find_principal(&self, identity_code: &str) -> Result<Option<Principal>, StoreError>;
}

/// Page state persistence
///
/// `upsert_page_state` must be a single match-or-insert write so that
/// concurrent saves for one key never produce two rows.
#[async_trait]
pub trait PageStateRepository: Send + Sync {
    async fn upsert_page_state(
        &self,
        key: &PageKey,
        form_fields: &FormFields,
        annotation: Option<&Value>,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    async fn find_page_state(&self, key: &PageKey) -> Result<Option<PageStateRecord>, StoreError>;
}
