//! PostgreSQL-backed stores
//!
//! Principals live in `principals`, page states in `page_states` with a
//! composite primary key on `(identity_code, page_number)`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;

use super::{
    CredentialStore, FormFields, PageKey, PageStateRecord, PageStateRepository, Principal,
    StoreError,
};

/// Database row for principal lookup
#[derive(Debug, FromRow)]
struct PrincipalRow {
    identity_code: String,
    password_hash: String,
}

/// Database row for page state lookup
#[derive(Debug, FromRow)]
struct PageStateRow {
    identity_code: String,
    page_number: i32,
    form_fields: Json<Value>,
    annotation: Option<Json<Value>>,
    updated_at: OffsetDateTime,
}

impl From<PageStateRow> for PageStateRecord {
    fn from(row: PageStateRow) -> Self {
        let form_fields = match row.form_fields.0 {
            Value::Object(map) => map,
            _ => FormFields::new(),
        };
        let annotation = row
            .annotation
            .map(|Json(v)| v)
            .filter(|v| !v.is_null());

        Self {
            key: PageKey::new(row.identity_code, row.page_number),
            form_fields,
            annotation,
            updated_at: row.updated_at,
        }
    }
}

/// Store backed by a shared connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a principal, replacing the hash if the code already exists
    ///
    /// Only the provisioning tool calls this; the request path never writes
    /// principals.
    pub async fn upsert_principal(&self, principal: &Principal) -> Result<bool, StoreError> {
        let inserted: (bool,) = sqlx::query_as(
            r#"
            INSERT INTO principals (identity_code, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (identity_code) DO UPDATE SET
                password_hash = EXCLUDED.password_hash
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&principal.identity_code)
        .bind(&principal.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted.0)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_principal(&self, identity_code: &str) -> Result<Option<Principal>, StoreError> {
        let row: Option<PrincipalRow> = sqlx::query_as(
            r#"
            SELECT identity_code, password_hash
            FROM principals
            WHERE identity_code = $1
            "#,
        )
        .bind(identity_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Principal {
            identity_code: r.identity_code,
            password_hash: r.password_hash,
        }))
    }
}

#[async_trait]
impl PageStateRepository for PgStore {
    async fn upsert_page_state(
        &self,
        key: &PageKey,
        form_fields: &FormFields,
        annotation: Option<&Value>,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        // Single statement: the primary key makes this match-or-insert atomic
        sqlx::query(
            r#"
            INSERT INTO page_states (
                identity_code,
                page_number,
                form_fields,
                annotation,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (identity_code, page_number) DO UPDATE SET
                form_fields = EXCLUDED.form_fields,
                annotation = EXCLUDED.annotation,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&key.identity_code)
        .bind(key.page_number)
        .bind(Json(form_fields))
        .bind(annotation.map(Json))
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_page_state(&self, key: &PageKey) -> Result<Option<PageStateRecord>, StoreError> {
        let row: Option<PageStateRow> = sqlx::query_as(
            r#"
            SELECT identity_code, page_number, form_fields, annotation, updated_at
            FROM page_states
            WHERE identity_code = $1
              AND page_number = $2
            "#,
        )
        .bind(&key.identity_code)
        .bind(key.page_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PageStateRecord::from))
    }
}
