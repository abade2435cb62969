//! Student credential verification

use std::sync::Arc;

use crate::store::{CredentialStore, StoreError};

use super::password::{self, PasswordError};

/// Message returned for every credential failure, whatever the cause
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Credential store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

/// Canonical identity code of an authenticated student, as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalIdentity(pub String);

impl CanonicalIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Normalize a caller-supplied identity code to its stored form
pub fn normalize_identity_code(identity_code: &str) -> String {
    identity_code.trim().to_uppercase()
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Check a (code, password) pair
    ///
    /// Unknown codes and wrong passwords both yield `InvalidCredentials`, and
    /// both pay for one adaptive-hash verification.
    pub async fn authenticate(
        &self,
        identity_code: &str,
        password: &str,
    ) -> Result<CanonicalIdentity, AuthFailure> {
        let normalized = normalize_identity_code(identity_code);
        if normalized.is_empty() || password.is_empty() {
            return Err(AuthFailure::MissingCredentials);
        }

        let principal = self
            .store
            .find_principal(&normalized)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Credential lookup failed");
                AuthFailure::StoreUnavailable(e)
            })?;

        let Some(principal) = principal else {
            // Same cost as a real mismatch
            let _ = verify_blocking(password, None).await;
            tracing::info!(identity_code = %normalized, "Login rejected");
            return Err(AuthFailure::InvalidCredentials);
        };

        match verify_blocking(password, Some(&principal.password_hash)).await {
            Ok(true) => {
                tracing::info!(identity_code = %principal.identity_code, "Login succeeded");
                Ok(CanonicalIdentity(principal.identity_code))
            }
            Ok(false) => {
                tracing::info!(identity_code = %normalized, "Login rejected");
                Err(AuthFailure::InvalidCredentials)
            }
            Err(e) => {
                tracing::warn!(
                    identity_code = %principal.identity_code,
                    error = %e,
                    "Stored password hash could not be verified"
                );
                Err(AuthFailure::InvalidCredentials)
            }
        }
    }
}

/// Run the adaptive hash off the async worker threads
///
/// `None` verifies against the timing dummy hash, which is generated on the
/// blocking pool the first time it is needed.
async fn verify_blocking(
    password: &str,
    stored_hash: Option<&str>,
) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.map(str::to_owned);
    tokio::task::spawn_blocking(move || {
        let stored_hash = stored_hash
            .as_deref()
            .unwrap_or_else(|| password::timing_dummy_hash());
        password::verify_password(&password, stored_hash)
    })
    .await
    .map_err(|e| PasswordError::Hash(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    async fn store_with(code: &str, password: &str) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let hash = password::hash_password(password).unwrap();
        store.insert_principal(code, &hash).await;
        store
    }

    #[tokio::test]
    async fn test_authenticate_returns_canonical_code_for_any_casing() {
        let store = store_with("AB123", "pa55word").await;
        let service = AuthService::new(store);

        let identity = service.authenticate("ab123", "pa55word").await.unwrap();
        assert_eq!(identity.as_str(), "AB123");

        let identity = service.authenticate("Ab123", "pa55word").await.unwrap();
        assert_eq!(identity, CanonicalIdentity("AB123".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_code_are_indistinguishable() {
        let store = store_with("AB123", "pa55word").await;
        let service = AuthService::new(store);

        let wrong_password = service.authenticate("AB123", "nope").await.unwrap_err();
        let unknown_code = service.authenticate("ZZ999", "pa55word").await.unwrap_err();

        assert!(matches!(wrong_password, AuthFailure::InvalidCredentials));
        assert!(matches!(unknown_code, AuthFailure::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_code.to_string());
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(store.clone());

        for (code, password) in [("", "pw"), ("AB123", ""), ("   ", "pw"), ("", "")] {
            let result = service.authenticate(code, password).await;
            assert!(matches!(result, Err(AuthFailure::MissingCredentials)));
        }
        assert_eq!(store.access_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_infrastructure_error() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);
        let service = AuthService::new(store);

        let result = service.authenticate("AB123", "pw").await;
        assert!(matches!(result, Err(AuthFailure::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_is_invalid_credentials() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_principal("AB123", "plaintext-password").await;
        let service = AuthService::new(store);

        let result = service.authenticate("AB123", "plaintext-password").await;
        assert!(matches!(result, Err(AuthFailure::InvalidCredentials)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_unknown_principal_verifies_against_dummy_hash() {
        assert!(!verify_blocking("pa55word", None).await.unwrap());
        assert!(password::timing_dummy_hash().starts_with("$argon2id$"));
    }

    #[test]
    fn test_normalize_identity_code() {
        assert_eq!(normalize_identity_code(" ab123 "), "AB123");
        assert_eq!(normalize_identity_code("AB123"), "AB123");
    }
}
