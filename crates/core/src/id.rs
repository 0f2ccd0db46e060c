//! Identifiers handed out by the portal API.

use serde::{Deserialize, Serialize};

/// Identifier of a portal user.
///
/// The API is not consistent about the JSON type of ids, so both numbers and
/// strings are accepted and written back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl UserId {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_json_type_it_was_given() {
        let numeric: UserId = serde_json::from_str("7").unwrap();
        let text: UserId = serde_json::from_str("\"u-7\"").unwrap();

        assert_eq!(numeric, UserId::Numeric(7));
        assert_eq!(text, UserId::text("u-7"));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "7");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"u-7\"");
    }
}
