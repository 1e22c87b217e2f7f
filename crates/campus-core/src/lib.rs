pub mod config;
pub mod error;
pub mod patch;
pub mod transport;
pub mod user;

// Re-export common error types
pub use error::{ApiError, ErrorCode, PatchError, ServiceError, StoreError};
