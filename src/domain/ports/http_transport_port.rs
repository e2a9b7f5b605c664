//! Outbound HTTP transport port definition.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::entities::RequestKey;
use crate::domain::errors::RawFailure;

/// HTTP verbs used against resource endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Safe to coalesce with concurrent duplicates.
    #[must_use]
    pub const fn is_idempotent_read(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource request, independent of authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    operation: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            operation: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Names the logical operation used in the request key.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Logical identity: operation (or method and path) plus query parameters.
    #[must_use]
    pub fn key(&self) -> RequestKey {
        let operation = self
            .operation
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path));

        RequestKey::builder(operation)
            .params(self.query.iter().map(|(k, v)| (k.clone(), v)))
            .build()
    }
}

/// Headers attached by the authenticated client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    pub authorization: Option<String>,
    pub accept_language: Option<String>,
}

/// Response with any status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    #[must_use]
    pub const fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body into `T`; an empty body decodes from `null`.
    ///
    /// # Errors
    /// Returns error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.body.clone().unwrap_or(Value::Null))
    }

    /// Converts a non-success response into a raw failure.
    #[must_use]
    pub fn into_failure(self) -> RawFailure {
        RawFailure::http(self.status, self.body)
    }
}

/// Port performing the actual network exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request. Non-success statuses are returned as `Ok`.
    async fn execute(
        &self,
        request: &ApiRequest,
        headers: &RequestHeaders,
    ) -> Result<ApiResponse, RawFailure>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_query_order() {
        let a = ApiRequest::get("/tasks")
            .with_query("page", 2)
            .with_query("filter", "open");
        let b = ApiRequest::get("/tasks")
            .with_query("filter", "open")
            .with_query("page", 2);

        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_distinguishes_methods() {
        let get = ApiRequest::get("/tasks/1");
        let delete = ApiRequest::delete("/tasks/1");

        assert_ne!(get.key(), delete.key());
    }

    #[test]
    fn test_named_operation_replaces_path() {
        let a = ApiRequest::get("/v1/tasks").with_operation("tasks.list");
        let b = ApiRequest::get("/v2/tasks").with_operation("tasks.list");

        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_empty_body_decodes_as_unit() {
        let response = ApiResponse::new(204, None);
        let decoded: Option<u32> = response.json().unwrap();

        assert!(decoded.is_none());
    }
}
