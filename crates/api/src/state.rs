//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::AuthService,
    config::Config,
    meeting::MeetingTokenService,
    pages::PageStateStore,
    store::{CredentialStore, PageStateRepository, PgStore},
};

/// Shared application state
///
/// Holds no per-request or per-session data; every component is a cheap
/// clone around an injected store handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub meetings: MeetingTokenService,
    pub pages: PageStateStore,
}

impl AppState {
    /// Wire the components to a PostgreSQL pool
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let store = Arc::new(PgStore::new(pool));

        let meetings = MeetingTokenService::new(
            config.zoom_sdk_key.clone(),
            config.zoom_sdk_secret.clone(),
        );
        if meetings.is_configured() {
            tracing::info!("Meeting token signing enabled");
        } else {
            tracing::warn!(
                "Meeting token signing not configured (missing ZOOM_SDK_KEY or ZOOM_SDK_SECRET)"
            );
        }

        Self::with_stores(store.clone(), store, meetings)
    }

    /// Wire the components to explicit store implementations
    pub fn with_stores(
        credentials: Arc<dyn CredentialStore>,
        page_states: Arc<dyn PageStateRepository>,
        meetings: MeetingTokenService,
    ) -> Self {
        Self {
            auth: AuthService::new(credentials),
            meetings,
            pages: PageStateStore::new(page_states),
        }
    }
}
