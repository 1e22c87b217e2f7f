//! `reqwest`-backed [`ApiTransport`].

use async_trait::async_trait;
use campus_core::config::ClientConfig;
use campus_core::error::ApiError;
use campus_core::transport::{ApiRequest, ApiResponse, ApiTransport, Method};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Bearer token shared between the transport and whoever logs in.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Transport that talks to the backend over HTTP.
///
/// Attaches `Authorization: Bearer <token>` when a token is set. A 401
/// response clears the token and is reported as [`ApiError::Unauthorized`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::transport(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an already configured client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens: TokenStore::default(),
        }
    }

    /// Creates a transport from the client configuration, including its
    /// stored token.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        transport.tokens.set(config.token.clone());
        Ok(transport)
    }

    /// Shares an existing token store instead of the transport's own.
    pub fn with_token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins a base URL and a path with exactly one slash between them. A
/// trailing slash on `path` is kept.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Decodes a response body. Empty bodies are `Null`; a body that is not JSON
/// is an error on success and kept as a string on failure statuses.
fn decode_body(status: StatusCode, bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => {
            Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
        }
        Err(err) => Err(ApiError::deserialization(format!(
            "response body is not valid JSON: {err}"
        ))),
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "Sending admin API request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.tokens.get() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| ApiError::Transport {
            message: format!("{} {url} failed: {err}", request.method),
            is_timeout: err.is_timeout(),
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Admin API rejected the token, clearing it");
            self.tokens.clear();
            return Err(ApiError::Unauthorized);
        }

        let bytes = response.bytes().await.map_err(|err| ApiError::Transport {
            message: format!("Failed to read response body from {url}: {err}"),
            is_timeout: err.is_timeout(),
        })?;
        let body = decode_body(status, &bytes)?;

        debug!(status = status.as_u16(), url = %url, "Admin API responded");
        Ok(ApiResponse::new(status.as_u16(), body))
    }
}
