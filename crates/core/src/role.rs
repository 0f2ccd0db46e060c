use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role flag returned by the authentication endpoint (`tipo`).
///
/// Kept as an opaque string so unknown roles survive a save/load cycle;
/// the two roles the portal knows about get named constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const CARRIER: &'static str = "transportadora";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed(Self::ADMIN))
    }

    pub fn carrier() -> Self {
        Self(Cow::Borrowed(Self::CARRIER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Portal operator with access to carrier and user management.
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    pub fn is_carrier(&self) -> bool {
        self.0 == Self::CARRIER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
