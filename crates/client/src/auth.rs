//! Login/logout orchestration.

use docportal_core::{ApiError, Credentials, LoginResult, Session};
use docportal_core::session::LoginResponse;

use crate::api::ApiClient;
use crate::session::SessionStore;
use crate::storage::StorageError;

pub const LOGIN_ENDPOINT: &str = "/auth/login";

/// Drives login and logout against the API and the session store.
///
/// The store is the single source of truth for "who is logged in"; this
/// controller is its only writer.
#[derive(Debug, Clone)]
pub struct AuthController {
    api: ApiClient,
    sessions: SessionStore,
}

impl AuthController {
    pub fn new(api: ApiClient, sessions: SessionStore) -> Self {
        Self { api, sessions }
    }

    /// Authenticate and persist the returned session.
    ///
    /// Never fails: every error becomes `LoginResult { success: false, .. }`
    /// carrying the server's message when it sent one. The store is only
    /// touched on success.
    pub async fn login(&self, email: &str, password: &str) -> LoginResult {
        match self.try_login(Credentials::new(email, password)).await {
            Ok(session) => {
                tracing::info!(user = %session.display_name(), role = %session.role(), "login succeeded");
                LoginResult::succeeded()
            }
            Err(err) => {
                tracing::info!(%email, error = %err, "login failed");
                LoginResult::failed(err.to_string())
            }
        }
    }

    async fn try_login(&self, credentials: Credentials) -> Result<Session, LoginError> {
        let body = serde_json::to_value(&credentials)
            .map_err(|e| LoginError::Api(ApiError::request(e.to_string())))?;

        let value = self.api.post(LOGIN_ENDPOINT, body).await.map_err(LoginError::Api)?;

        let response: LoginResponse = serde_json::from_value(value)
            .map_err(|e| LoginError::Api(ApiError::decode(200, e.to_string())))?;
        if response.token.is_empty() {
            return Err(LoginError::Api(ApiError::decode(200, "login response has an empty token")));
        }

        let session = Session::from(response);
        self.sessions.save(&session).await.map_err(LoginError::Storage)?;
        Ok(session)
    }

    /// Forget the current session. Does not call the network.
    pub async fn logout(&self) -> Result<(), StorageError> {
        self.sessions.clear().await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// The persisted session, read without a network round-trip.
    pub async fn current_session(&self) -> Result<Option<Session>, StorageError> {
        self.sessions.load().await
    }

    pub async fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self.current_session().await?.is_some())
    }
}

#[derive(Debug, thiserror::Error)]
enum LoginError {
    #[error("{0}")]
    Api(ApiError),
    #[error("failed to persist session: {0}")]
    Storage(StorageError),
}
