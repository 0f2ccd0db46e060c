//! Authenticated JSON client for the portal API.

use docportal_core::{ApiError, ApiResult};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::session::SessionStore;

/// One outgoing call, as seen by [`ApiClient::execute`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header; it takes precedence over the client's defaults.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    fn is_idempotent(&self) -> bool {
        matches!(
            self.method,
            Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
        )
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the portal's JSON API.
///
/// Every request carries `Content-Type: application/json` and, when the
/// session store holds a session, `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    sessions: SessionStore,
}

impl ApiClient {
    pub fn new(config: ClientConfig, sessions: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            sessions,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Execute `descriptor` and return the decoded JSON body.
    ///
    /// Idempotent requests are retried on transport failures and 5xx answers
    /// within the configured [`crate::RetryPolicy`]; POST is attempted once.
    /// Failures are logged before they are returned.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> ApiResult<Value> {
        self.execute_with_status(descriptor)
            .await
            .map(|(_, value)| value)
    }

    /// Like [`ApiClient::execute`], also returning the 2xx status received.
    async fn execute_with_status(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<(StatusCode, Value)> {
        let max_attempts = if descriptor.is_idempotent() {
            self.config.retry.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            match self.execute_once(&descriptor).await {
                Ok(answer) => return Ok(answer),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.config.retry.backoff_for(attempt);
                    tracing::warn!(
                        method = %descriptor.method,
                        endpoint = %descriptor.endpoint,
                        attempt,
                        max_attempts,
                        error = %err,
                        "request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        method = %descriptor.method,
                        endpoint = %descriptor.endpoint,
                        status = ?err.status_code(),
                        error = %err,
                        "API error"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn execute_once(&self, descriptor: &RequestDescriptor) -> ApiResult<(StatusCode, Value)> {
        let url = self.config.url_for(&descriptor.endpoint);

        let token = self
            .sessions
            .token()
            .await
            .map_err(|e| ApiError::request(format!("session storage unavailable: {e}")))?;
        let authenticated = token.is_some();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &token {
            let value = HeaderValue::from_str(&token.header_value())
                .map_err(|_| ApiError::request("session token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &descriptor.headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut req = self
            .http
            .request(descriptor.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &descriptor.body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| ApiError::request(format!("failed to encode request body: {e}")))?;
            req = req.body(payload);
        }

        tracing::debug!(method = %descriptor.method, %url, authenticated, "sending request");

        let resp = req.send().await.map_err(|e| ApiError::network(e.to_string()))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ApiError::network(e.to_string()))?;

        tracing::debug!(method = %descriptor.method, %url, status = status.as_u16(), "response received");

        if status.is_success() {
            decode_success(status, &bytes).map(|value| (status, value))
        } else {
            Err(classify_failure(status, &bytes, authenticated))
        }
    }

    /// Execute and decode the body into `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> ApiResult<T> {
        let (status, value) = self.execute_with_status(descriptor).await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(status.as_u16(), e.to_string()))
    }

    pub async fn get(&self, endpoint: &str) -> ApiResult<Value> {
        self.execute(RequestDescriptor::new(Method::GET, endpoint)).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
        self.execute(RequestDescriptor::new(Method::POST, endpoint).with_body(body))
            .await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
        self.execute(RequestDescriptor::new(Method::PUT, endpoint).with_body(body))
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> ApiResult<Value> {
        self.execute(RequestDescriptor::new(Method::DELETE, endpoint)).await
    }
}

/// An empty 2xx body decodes to `null`.
fn decode_success(status: StatusCode, bytes: &[u8]) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::decode(status.as_u16(), e.to_string()))
}

/// Non-2xx: the server's `{"error": ...}` message, else `HTTP <status>`.
fn classify_failure(status: StatusCode, bytes: &[u8], authenticated: bool) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
    ApiError::http(status.as_u16(), message, authenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use docportal_core::{BearerToken, Role, Session, UserProfile};

    use crate::config::RetryPolicy;
    use crate::storage::MemoryStorage;

    #[test]
    fn failure_uses_server_message_when_present() {
        let err = classify_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Credenciais inválidas"}"#.as_bytes(),
            false,
        );
        assert_eq!(err.message(), "Credenciais inválidas");
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn failure_falls_back_to_status_line() {
        let html = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, b"<h1>oops</h1>", true);
        assert_eq!(html.to_string(), "HTTP 500");

        let wrong_shape = classify_failure(StatusCode::BAD_GATEWAY, br#"{"message":"x"}"#, true);
        assert_eq!(wrong_shape.to_string(), "HTTP 502");
    }

    #[test]
    fn success_body_decoding() {
        assert_eq!(decode_success(StatusCode::NO_CONTENT, b"").unwrap(), Value::Null);
        assert_eq!(
            decode_success(StatusCode::OK, br#"{"ok":true}"#).unwrap(),
            serde_json::json!({ "ok": true })
        );
        assert!(matches!(
            decode_success(StatusCode::OK, b"not json"),
            Err(ApiError::Decode { status: 200, .. })
        ));
    }

    #[test]
    fn only_post_is_excluded_from_retries() {
        assert!(RequestDescriptor::new(Method::GET, "/dashboard").is_idempotent());
        assert!(RequestDescriptor::new(Method::PUT, "/x").is_idempotent());
        assert!(RequestDescriptor::new(Method::DELETE, "/x").is_idempotent());
        assert!(!RequestDescriptor::new(Method::POST, "/auth/login").is_idempotent());
    }

    #[tokio::test]
    async fn unusable_token_fails_once_without_retrying() {
        let sessions = SessionStore::new(Arc::new(MemoryStorage::new()));
        let session = Session::new(
            UserProfile::new(1i64, "Admin NIMO", Role::admin()),
            BearerToken::new("abc\ndef"),
        );
        sessions.save(&session).await.unwrap();

        // Any retry would sleep for the full backoff and trip the timeout.
        let config = ClientConfig::new("http://127.0.0.1:9/api").with_retry(
            RetryPolicy::new(3).with_backoff(Duration::from_secs(5), Duration::from_secs(5)),
        );
        let api = ApiClient::new(config, sessions).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(1), api.get("/dashboard"))
            .await
            .expect("request was retried")
            .unwrap_err();
        assert!(matches!(err, ApiError::Request { .. }));
        assert_eq!(err.message(), "session token is not a valid header value");
        assert!(!err.is_transient());
    }
}
