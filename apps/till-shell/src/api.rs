//! # HTTP API Client
//!
//! [`ApiClient`] over reqwest. Every request carries the bearer token held
//! in the `token` state key, if any.
//!
//! ## Response Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Response                         Result                                │
//! │  ────────                         ──────                                │
//! │  2xx with JSON body               Ok(body)                              │
//! │  2xx with empty body              Ok(Value::Null)                       │
//! │  4xx / 5xx                        ApiError { status, body.message }     │
//! │  no response / bad JSON           ApiError { status: 0, .. }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use till_store::StateManager;
use till_view::{ApiClient, ApiError, Method};
use tracing::{debug, warn};

use crate::config::ApiSection;
use crate::context::TOKEN_KEY;
use crate::error::ShellResult;

/// reqwest-backed API client.
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    state: Arc<StateManager>,
}

impl HttpApiClient {
    pub fn new(config: &ApiSection, state: Arc<StateManager>) -> ShellResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(HttpApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            state,
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> Option<String> {
        match self.state.get_state(TOKEN_KEY) {
            Some(Value::String(token)) if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Error message from a failed response body, else the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let url = self.url(path);
        let mut request = self.client.request(http_method(method), &url);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(%method, %url, "API request");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        if !status.is_success() {
            let err = ApiError::new(status.as_u16(), error_message(&text, status));
            warn!(%method, %url, status = err.status, message = %err.message, "API request failed");
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::transport(format!("Invalid JSON response: {e}")))
    }
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> HttpApiClient {
        let config = ApiSection {
            base_url: base_url.into(),
            ..ApiSection::default()
        };
        HttpApiClient::new(&config, Arc::new(StateManager::in_memory())).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("http://localhost:3000/api/");
        assert_eq!(api.url("/sales/summary"), "http://localhost:3000/api/sales/summary");
        assert_eq!(api.url("products"), "http://localhost:3000/api/products");
    }

    #[test]
    fn test_bearer_comes_from_state() {
        let api = client("http://localhost:3000/api");
        assert_eq!(api.bearer(), None);

        api.state.set_state(TOKEN_KEY, json!("t-123"));
        assert_eq!(api.bearer().as_deref(), Some("t-123"));

        api.state.set_state(TOKEN_KEY, json!(""));
        assert_eq!(api.bearer(), None);
    }

    #[test]
    fn test_error_message_extraction() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        assert_eq!(error_message(r#"{"message":"Token expired"}"#, status), "Token expired");
        assert_eq!(error_message(r#"{"error":"nope"}"#, status), "nope");
        assert_eq!(error_message("<html>", status), "Unauthorized");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let api = client("http://127.0.0.1:9");
        let err = api.get("/products").await.unwrap_err();
        assert_eq!(err.status, 0);
        assert!(err.is_retryable());
    }
}
