//! API error model.

use thiserror::Error;

/// Result type returned by API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a call against the portal API.
///
/// Transport failures carry no status code; everything the server actually
/// answered does.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The network call itself failed (DNS, refused connection, timeout).
    #[error("{message}")]
    Network { message: String },

    /// The server answered outside the 2xx range.
    ///
    /// `message` is the server's `{"error": ...}` payload when present, else
    /// `HTTP <status>`. `authenticated` records whether the request carried a
    /// bearer token.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        authenticated: bool,
    },

    /// A 2xx response whose body was not the expected JSON.
    #[error("invalid response body: {message}")]
    Decode { status: u16, message: String },

    /// The request could not be prepared locally (session storage, header
    /// or body encoding). Nothing was sent, so retrying cannot help.
    #[error("{message}")]
    Request { message: String },
}

impl ApiError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
        }
    }

    pub fn http(status: u16, msg: impl Into<String>, authenticated: bool) -> Self {
        Self::Http {
            status,
            message: msg.into(),
            authenticated,
        }
    }

    pub fn decode(status: u16, msg: impl Into<String>) -> Self {
        Self::Decode {
            status,
            message: msg.into(),
        }
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request {
            message: msg.into(),
        }
    }

    /// HTTP status code, absent when no response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { .. } | Self::Request { .. } => None,
            Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
        }
    }

    /// Human readable message (the server's message when it sent one).
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message }
            | Self::Http { message, .. }
            | Self::Decode { message, .. }
            | Self::Request { message } => message,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// A 401 answered to a request that carried a bearer token.
    ///
    /// Distinguishes "the stored session was rejected" from "there was no
    /// session to begin with"; callers decide whether to force a logout.
    pub fn is_session_rejected(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: 401,
                authenticated: true,
                ..
            }
        )
    }

    /// Whether a retry could plausibly succeed (transport failure or 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => (500..600).contains(status),
            Self::Decode { .. } | Self::Request { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_resolved_message_verbatim() {
        let err = ApiError::http(500, "HTTP 500", false);
        assert_eq!(err.to_string(), "HTTP 500");
        assert_eq!(err.status_code(), Some(500));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ApiError::network("connection refused");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.message(), "connection refused");
        assert!(err.is_transient());
    }

    #[test]
    fn session_rejection_requires_a_token() {
        let with_token = ApiError::http(401, "Token inválido", true);
        let without = ApiError::http(401, "Token requerido", false);

        assert!(with_token.is_unauthorized());
        assert!(with_token.is_session_rejected());
        assert!(without.is_unauthorized());
        assert!(!without.is_session_rejected());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!ApiError::http(404, "HTTP 404", true).is_transient());
        assert!(ApiError::http(503, "HTTP 503", true).is_transient());
        assert!(!ApiError::decode(200, "expected value").is_transient());
    }

    #[test]
    fn local_request_failures_are_final_and_have_no_status() {
        let err = ApiError::request("session token is not a valid header value");
        assert!(!err.is_transient());
        assert!(!err.is_network());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "session token is not a valid header value");
    }
}
