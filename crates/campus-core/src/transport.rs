//! HTTP transport abstraction and the response envelope of the backend.
//!
//! The service layer only needs "send this method/path/body, give me back a
//! status and a JSON body". Keeping that behind [`ApiTransport`] lets the
//! service logic be exercised without a network.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// HTTP methods used by the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and decoded JSON body of a response. An empty body is `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reads the `{data, status, success, msg}` envelope.
    pub fn envelope(&self) -> Result<ApiEnvelope, ApiError> {
        match &self.body {
            Value::Object(_) => Ok(ApiEnvelope::deserialize(&self.body)?),
            Value::Null => Ok(ApiEnvelope::default()),
            other => Err(ApiError::deserialization(format!(
                "expected a JSON object envelope, got {other}"
            ))),
        }
    }

    /// Turns a non-2xx response into [`ApiError::Status`].
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(self.into_status_error())
    }

    /// [`ApiError::Status`] for this response, using the server's message
    /// when the body has one.
    pub fn into_status_error(self) -> ApiError {
        let message = self
            .envelope()
            .ok()
            .and_then(|envelope| envelope.message)
            .or_else(|| self.body.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("request failed with status {}", self.status));
        ApiError::Status {
            status: self.status,
            message,
        }
    }
}

/// Standard response wrapper of the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Whether `data` carries anything (see [`is_truthy`]).
    pub fn has_data(&self) -> bool {
        is_truthy(&self.data)
    }

    /// Decodes `data` into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.data).map_err(ApiError::from)
    }
}

/// Emptiness as the backend contract defines it: `null`, `false`, `0` and
/// `""` are empty; objects and arrays are not, even when they have no
/// elements.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Sends requests to the backend.
///
/// Implementations return every HTTP status as an [`ApiResponse`], except
/// 401, which is reported as [`ApiError::Unauthorized`] after the
/// implementation has dropped its credentials.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
