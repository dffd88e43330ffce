//! Application state shared across handlers.

use std::sync::Arc;

use tracing::warn;

use crate::config::CrmConfig;
use crate::error::StartupError;
use crate::llm::{AiError, ChatClient};
use crate::services::{AuthService, SessionStore};
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CrmConfig,
    store: Store,
    sessions: SessionStore,
    llm: ChatClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Opened JSON data store
    ///
    /// # Errors
    ///
    /// Returns an error if the chat-completion client cannot be built.
    pub fn new(config: CrmConfig, store: Store) -> Result<Self, AiError> {
        let llm = ChatClient::new(&config.llm)?;
        let sessions = SessionStore::new(config.auth.session_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sessions,
                llm,
            }),
        })
    }

    /// Open the data file, seed the admin user if needed, and build the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the admin user cannot
    /// be seeded, or the chat-completion client cannot be built.
    pub async fn bootstrap(config: CrmConfig) -> Result<Self, StartupError> {
        let store = Store::open(&config.data_file).await?;
        let state = Self::new(config, store)?;

        let seeded = AuthService::new(state.store(), state.sessions())
            .ensure_admin(&state.config().auth.admin_password)
            .await?;
        if seeded.is_some() && state.config().auth.admin_password_is_default {
            warn!("Admin user seeded with the default password; set CRM_ADMIN_PASSWORD");
        }

        Ok(state)
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &CrmConfig {
        &self.inner.config
    }

    /// Get a reference to the data store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the login sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get a reference to the chat-completion client.
    #[must_use]
    pub fn llm(&self) -> &ChatClient {
        &self.inner.llm
    }
}
