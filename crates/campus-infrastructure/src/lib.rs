pub mod auth_service;
pub mod config_storage;
pub mod paths;
pub mod transport;
pub mod user_service;

pub use auth_service::{AuthError, AuthService};
pub use config_storage::{ConfigError, ConfigStorage};
pub use paths::CampusPaths;
pub use transport::{ReqwestTransport, TokenStore};
pub use user_service::HttpUserService;
