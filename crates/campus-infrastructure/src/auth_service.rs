//! Login and logout against `/api/auth/`.

use crate::transport::TokenStore;
use campus_core::config::DEFAULT_AUTH_PREFIX;
use campus_core::error::ApiError;
use campus_core::transport::{ApiRequest, ApiTransport};
use campus_core::user::LoginResponse;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Obtains and drops the bearer token used by the admin endpoints.
pub struct AuthService {
    transport: Arc<dyn ApiTransport>,
    tokens: TokenStore,
    auth_prefix: String,
}

impl AuthService {
    /// `tokens` must be the store the transport reads its bearer token from.
    pub fn new(transport: Arc<dyn ApiTransport>, tokens: TokenStore) -> Self {
        Self {
            transport,
            tokens,
            auth_prefix: DEFAULT_AUTH_PREFIX.to_string(),
        }
    }

    pub fn with_auth_prefix(mut self, auth_prefix: impl Into<String>) -> Self {
        let mut auth_prefix = auth_prefix.into();
        if !auth_prefix.ends_with('/') {
            auth_prefix.push('/');
        }
        self.auth_prefix = auth_prefix;
        self
    }

    /// Posts the credentials and stores the returned access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let request = ApiRequest::post(format!("{}login", self.auth_prefix))
            .with_body(json!({ "username": username, "password": password }));
        let envelope = self
            .transport
            .send(request)
            .await?
            .error_for_status()?
            .envelope()?;

        let login: LoginResponse = envelope.decode().map_err(|err| {
            ApiError::deserialization(format!("Login response is missing user or token: {err}"))
        })?;

        self.tokens.set(Some(login.access_token.clone()));
        info!(username = %login.user.username, role = %login.user.role, "Logged in");
        Ok(login)
    }

    /// Forgets the current token. Nothing is sent to the server.
    pub fn logout(&self) {
        self.tokens.clear();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }
}
