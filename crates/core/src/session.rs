//! Session, identity and credential types.
//!
//! A [`Session`] is the identity record returned by a successful login plus
//! the bearer token that proves it. Both halves travel together: there is no
//! way to build a session from only one of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Role, UserId};

/// Opaque credential sent as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Identity record as returned under `user` by `POST /auth/login`.
///
/// Fields the client does not interpret are kept in `extra` so that a stored
/// record reads back exactly as it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(rename = "nome")]
    pub display_name: String,
    #[serde(rename = "tipo")]
    pub role: Role,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Some(id.into()),
            display_name: display_name.into(),
            role,
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }

    /// The user's id, falling back to the e-mail for servers that omit `id`.
    pub fn user_id(&self) -> Option<UserId> {
        self.id
            .clone()
            .or_else(|| self.email().map(UserId::text))
    }
}

/// The current authenticated identity and its token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub token: BearerToken,
}

impl Session {
    pub fn new(user: UserProfile, token: BearerToken) -> Self {
        Self { user, token }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.user_id()
    }

    pub fn display_name(&self) -> &str {
        &self.user.display_name
    }

    pub fn role(&self) -> &Role {
        &self.user.role
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// Successful body of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: BearerToken,
    pub user: UserProfile,
}

impl From<LoginResponse> for Session {
    fn from(value: LoginResponse) -> Self {
        Session::new(value.user, value.token)
    }
}

/// Login form input. Never persisted.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of a login attempt: `{"success": true}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
