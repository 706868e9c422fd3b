//! # API Client Collaborator
//!
//! Views issue `(method, path, body)` requests and get parsed JSON back or
//! an [`ApiError`] carrying an HTTP-like status.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ApiError;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response collaborator.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError>;

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Post, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Put, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Delete, path, None).await
    }
}

/// A request seen by [`MemoryApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Canned responses keyed by method and path. Unknown routes answer 404.
///
/// Backs the shell's offline mode and its tests.
#[derive(Debug, Default)]
pub struct MemoryApi {
    responses: Mutex<HashMap<(Method, String), Result<Value, ApiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method path` with `response` from now on.
    pub fn respond(&self, method: Method, path: &str, response: Result<Value, ApiError>) -> &Self {
        self.responses
            .lock()
            .insert((method, path.to_string()), response);
        self
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ApiClient for MemoryApi {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        self.responses
            .lock()
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_else(|| Err(ApiError::new(404, format!("{method} {path} not found"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_api_answers_and_records() {
        let api = MemoryApi::new();
        api.respond(Method::Get, "/products", Ok(json!([{"sku": "COKE"}])));

        assert_eq!(api.get("/products").await.unwrap(), json!([{"sku": "COKE"}]));
        let err = api.post("/sales", json!({"total": 5})).await.unwrap_err();
        assert_eq!(err.status, 404);

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body, Some(json!({"total": 5})));
    }
}
