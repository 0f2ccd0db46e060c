//! Explicit application context handed to the presentation layer.

use std::sync::Arc;

use docportal_core::{ApiError, DashboardSummary, Session};
use thiserror::Error;

use crate::api::ApiClient;
use crate::auth::AuthController;
use crate::config::{ClientConfig, ConfigError};
use crate::loader::ResourceLoader;
use crate::portal::PortalApi;
use crate::session::SessionStore;
use crate::storage::{SessionStorage, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("session storage failed at startup: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to create API client: {0}")]
    Client(#[from] ApiError),
}

/// Everything a view needs, wired once at startup.
///
/// `bootstrap` reads the stored session (no network call); `logout` through
/// [`AuthController`] is the teardown.
#[derive(Debug, Clone)]
pub struct PortalState {
    pub sessions: SessionStore,
    pub api: ApiClient,
    pub auth: AuthController,
    pub portal: PortalApi,
    initial_session: Option<Session>,
}

impl PortalState {
    pub async fn bootstrap(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, StartupError> {
        let sessions = SessionStore::new(storage);
        let initial_session = sessions.load().await?;

        let api = ApiClient::new(config, sessions.clone())?;
        let auth = AuthController::new(api.clone(), sessions.clone());
        let portal = PortalApi::new(api.clone());

        match &initial_session {
            Some(session) => tracing::info!(
                user = %session.display_name(),
                role = %session.role(),
                "restored session"
            ),
            None => tracing::info!("no stored session"),
        }

        Ok(Self {
            sessions,
            api,
            auth,
            portal,
            initial_session,
        })
    }

    /// Identity found in storage at startup.
    pub fn initial_session(&self) -> Option<&Session> {
        self.initial_session.as_ref()
    }

    pub fn dashboard_loader(&self) -> ResourceLoader<DashboardSummary> {
        self.portal.dashboard_loader()
    }
}
