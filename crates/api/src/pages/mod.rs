//! Per-student page state
//!
//! Form fields and annotations are opaque JSON; this module only owns the
//! key (identity code, page number) and the save/load contract around it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::auth::normalize_identity_code;
use crate::store::{FormFields, PageKey, PageStateRepository, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum PageStateError {
    #[error("Incomplete data: studentCode and page are required")]
    IncompleteInput,
    #[error("Missing parameters: studentCode and page are required")]
    MissingParameter,
    #[error("Invalid page number: {0}")]
    InvalidPageNumber(String),
    #[error("Page state store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

/// What `load` returns; an unsaved page loads as the empty view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageStateView {
    #[serde(rename = "formFields")]
    pub form_fields: FormFields,
    pub annotation: Option<Value>,
}

/// Outcome of reading a page number out of a request
enum PageNumber {
    Missing,
    Invalid(String),
    Valid(i32),
}

fn parse_page_number(raw: Option<&Value>) -> PageNumber {
    match parse_raw_page_number(raw) {
        // Pages are numbered from 1; zero is treated as not supplied
        PageNumber::Valid(0) => PageNumber::Missing,
        parsed => parsed,
    }
}

fn parse_raw_page_number(raw: Option<&Value>) -> PageNumber {
    match raw {
        None | Some(Value::Null) => PageNumber::Missing,
        Some(Value::String(s)) if s.trim().is_empty() => PageNumber::Missing,
        Some(Value::String(s)) => match s.trim().parse::<i32>() {
            Ok(n) => PageNumber::Valid(n),
            Err(_) => PageNumber::Invalid(s.clone()),
        },
        Some(Value::Number(n)) => {
            let integral = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
            match integral.and_then(|i| i32::try_from(i).ok()) {
                Some(page) => PageNumber::Valid(page),
                None => PageNumber::Invalid(n.to_string()),
            }
        }
        Some(other) => PageNumber::Invalid(other.to_string()),
    }
}

/// Normalized identity code, or `None` when absent or blank
fn identity_from(identity_code: Option<&str>) -> Option<String> {
    identity_code
        .map(normalize_identity_code)
        .filter(|code| !code.is_empty())
}

#[derive(Clone)]
pub struct PageStateStore {
    repository: Arc<dyn PageStateRepository>,
}

impl PageStateStore {
    pub fn new(repository: Arc<dyn PageStateRepository>) -> Self {
        Self { repository }
    }

    /// Upsert the state for (identity, page), replacing fields and annotation
    pub async fn save(
        &self,
        identity_code: Option<&str>,
        page_number: Option<&Value>,
        form_fields: FormFields,
        annotation: Option<Value>,
    ) -> Result<(), PageStateError> {
        let identity = identity_from(identity_code);
        let page = match parse_page_number(page_number) {
            PageNumber::Valid(page) => Some(page),
            PageNumber::Missing => None,
            PageNumber::Invalid(raw) => return Err(PageStateError::InvalidPageNumber(raw)),
        };
        let (Some(identity), Some(page)) = (identity, page) else {
            return Err(PageStateError::IncompleteInput);
        };

        let key = PageKey::new(identity, page);
        let annotation = annotation.filter(|a| !a.is_null());

        self.repository
            .upsert_page_state(&key, &form_fields, annotation.as_ref(), OffsetDateTime::now_utc())
            .await
            .map_err(|e| {
                tracing::error!(
                    identity_code = %key.identity_code,
                    page = key.page_number,
                    error = %e,
                    "Failed to save page state"
                );
                PageStateError::StoreUnavailable(e)
            })?;

        tracing::debug!(
            identity_code = %key.identity_code,
            page = key.page_number,
            fields = form_fields.len(),
            "Page state saved"
        );
        Ok(())
    }

    /// Point lookup; a page never saved loads as the empty view
    pub async fn load(
        &self,
        identity_code: Option<&str>,
        page_number: Option<&Value>,
    ) -> Result<PageStateView, PageStateError> {
        let identity = identity_from(identity_code);
        let page = match parse_page_number(page_number) {
            PageNumber::Valid(page) => Some(page),
            PageNumber::Missing => None,
            PageNumber::Invalid(raw) => return Err(PageStateError::InvalidPageNumber(raw)),
        };
        let (Some(identity), Some(page)) = (identity, page) else {
            return Err(PageStateError::MissingParameter);
        };

        let key = PageKey::new(identity, page);
        let record = self.repository.find_page_state(&key).await.map_err(|e| {
            tracing::error!(
                identity_code = %key.identity_code,
                page = key.page_number,
                error = %e,
                "Failed to load page state"
            );
            PageStateError::StoreUnavailable(e)
        })?;

        Ok(record
            .map(|r| PageStateView {
                form_fields: r.form_fields,
                annotation: r.annotation,
            })
            .unwrap_or_default())
    }
}
