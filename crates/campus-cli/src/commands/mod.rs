pub mod auth;
pub mod stats;
pub mod users;
pub mod values;

use anyhow::{Context as _, Result};
use campus_application::{UserAdminUseCase, UserStore};
use campus_core::config::ClientConfig;
use campus_infrastructure::{AuthService, ConfigStorage, HttpUserService, ReqwestTransport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

/// Everything a command needs: the config it was started with and the
/// services built from it.
pub struct Context {
    storage: ConfigStorage,
    config: ClientConfig,
    transport: Arc<ReqwestTransport>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, base_url: Option<String>) -> Result<Self> {
        let storage = match config_path {
            Some(path) => ConfigStorage::with_path(path),
            None => ConfigStorage::new()?,
        };
        let mut config = storage
            .load_with_env()
            .with_context(|| format!("Failed to load {}", storage.path().display()))?;
        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }

        let transport = Arc::new(ReqwestTransport::from_config(&config)?);
        Ok(Self {
            storage,
            config,
            transport,
        })
    }

    pub fn usecase(&self) -> UserAdminUseCase {
        let service =
            HttpUserService::new(self.transport.clone()).with_base_path(&self.config.api_prefix);
        UserAdminUseCase::new(Arc::new(UserStore::new(Arc::new(service))))
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.transport.clone(), self.transport.tokens().clone())
            .with_auth_prefix(&self.config.auth_prefix)
    }

    /// Writes `token` to the config file, leaving environment overrides out
    /// of it.
    pub fn store_token(&self, token: Option<String>) -> Result<()> {
        let mut on_disk = self.storage.load()?;
        on_disk.token = token;
        self.storage
            .save(&on_disk)
            .with_context(|| format!("Failed to write {}", self.storage.path().display()))
    }

    /// Removes the saved token if the server rejected it during this run.
    pub fn forget_expired_token(&self) -> Result<()> {
        if self.config.token.is_some() && !self.transport.tokens().is_authenticated() {
            warn!("Stored token was rejected, run `campus login` again");
            self.store_token(None)?;
        }
        Ok(())
    }

    /// Runs the post-command cleanup for a command that used the token.
    /// A cleanup failure is logged so it never replaces `result`.
    pub fn finish(&self, result: Result<()>) -> Result<()> {
        if let Err(err) = self.forget_expired_token() {
            error!("Failed to forget the rejected token: {err:#}");
        }
        result
    }
}
