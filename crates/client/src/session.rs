//! Durable holder of the current identity and bearer token.
//!
//! The record is split over two storage entries: `token` holds the raw token
//! and `user` the JSON-encoded identity. They are written and removed
//! together. Anything other than "both present and decodable" reads back as
//! no session, and the leftovers are cleared on the way.

use std::sync::Arc;

use docportal_core::{BearerToken, Session, UserProfile};
use tokio::sync::Mutex;

use crate::storage::{SessionStorage, StorageError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Session persistence over a [`SessionStorage`] backend.
///
/// Cheap to clone; clones share the same backend. `load`, `save` and `clear`
/// are serialized across clones, so clearing a broken record never removes a
/// session saved concurrently.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    guard: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Read the persisted session.
    ///
    /// Both entries come from one storage snapshot. A corrupted or partial
    /// record is cleared and reported as absent. `Err` is reserved for the
    /// storage itself failing.
    pub async fn load(&self) -> Result<Option<Session>, StorageError> {
        let _guard = self.guard.lock().await;

        let mut entries = self
            .storage
            .get_many(&[TOKEN_KEY, USER_KEY])
            .await?
            .into_iter();
        let token = entries.next().flatten();
        let user = entries.next().flatten();

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => match serde_json::from_str::<UserProfile>(&user) {
                Ok(profile) if !token.is_empty() => {
                    Ok(Some(Session::new(profile, BearerToken::new(token))))
                }
                Ok(_) => {
                    tracing::warn!("stored session has an empty token; clearing it");
                    self.remove_entries().await?;
                    Ok(None)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stored identity is corrupted; clearing session");
                    self.remove_entries().await?;
                    Ok(None)
                }
            },
            (token, _) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    "stored session is incomplete; clearing it"
                );
                self.remove_entries().await?;
                Ok(None)
            }
        }
    }

    /// Persist `session`, replacing any previous one.
    pub async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        let _guard = self.guard.lock().await;
        self.storage
            .set_many(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, &user)])
            .await?;

        tracing::debug!(user = %session.display_name(), "session saved");
        Ok(())
    }

    /// Remove any persisted session. Idempotent.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        self.remove_entries().await
    }

    async fn remove_entries(&self) -> Result<(), StorageError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY]).await
    }

    /// Token of the current session, if a complete one exists.
    pub async fn token(&self) -> Result<Option<BearerToken>, StorageError> {
        Ok(self.load().await?.map(|s| s.token))
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
