//! Error types for the campus admin client.
//!
//! Every failure that reaches a caller of the store or the service is a
//! [`StoreError`]: a message meant for display, a machine-readable
//! [`ErrorCode`], and an optional cause. Lower layers use their own enums
//! ([`ApiError`] for transport and payload problems, [`PatchError`] for
//! dotted-path expansion) which end up as the cause of a `StoreError`.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Machine-readable failure code carried by every [`StoreError`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoUsersFound,
    UserNotFound,
    CreateUserFailed,
    UpdateUserFailed,
    DeleteUserFailed,
    EditUserDetailFailed,
    CompareGrowthStatsByRoleFailed,
    AlreadyLoadingUsers,
    AlreadyLoadingUserDetails,
    FetchUsersFailed,
    FetchUserDetailsFailed,
    UpdateUserDetailsFailed,
}

impl ErrorCode {
    /// True for the codes raised by a single-flight guard rejecting a
    /// duplicate request.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::AlreadyLoadingUsers | Self::AlreadyLoadingUserDetails)
    }
}

/// Shared, cloneable handle to the error that caused a [`StoreError`].
pub type ErrorCause = Arc<dyn StdError + Send + Sync + 'static>;

/// The structured error returned by the service and the store.
///
/// Callers branch on [`StoreError::code`] and show [`StoreError::message`]
/// to the user. The cause, when present, is reachable through
/// [`std::error::Error::source`] and [`StoreError::cause_as`].
#[derive(Debug, Clone)]
pub struct StoreError {
    pub message: String,
    pub code: ErrorCode,
    pub cause: Option<ErrorCause>,
}

impl StoreError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an error without a cause.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            cause: None,
        }
    }

    /// Creates an error wrapping a lower-level cause.
    pub fn wrap<E>(code: ErrorCode, message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            code,
            cause: Some(Arc::new(cause)),
        }
    }

    /// Attaches a cause to an existing error.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Creates an `ALREADY_LOADING_USERS` error.
    pub fn already_loading_users() -> Self {
        Self::new(ErrorCode::AlreadyLoadingUsers, "Already loading users...")
    }

    /// Creates an `ALREADY_LOADING_USER_DETAILS` error.
    pub fn already_loading_user_details() -> Self {
        Self::new(
            ErrorCode::AlreadyLoadingUserDetails,
            "Already loading user details...",
        )
    }

    /// Creates a `USER_NOT_FOUND` error for the given id.
    pub fn user_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("No user details found for id {id}"),
        )
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    /// Checks the error code.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    /// True when a single-flight guard rejected the call.
    pub fn is_busy(&self) -> bool {
        self.code.is_busy()
    }

    /// Downcasts the cause to a concrete error type.
    pub fn cause_as<T: StdError + 'static>(&self) -> Option<&T> {
        self.cause.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Failures below the structured layer: transport, HTTP status and payload
/// shape problems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, timeout, ...).
    #[error("Transport error: {message}")]
    Transport { message: String, is_timeout: bool },

    /// The server answered with a status the operation does not accept.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The server rejected the bearer token. The transport has already
    /// cleared it.
    #[error("Unauthorized: authentication token missing or expired")]
    Unauthorized,

    /// The response body did not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    /// The response carried a payload that does not satisfy the operation's
    /// contract (empty data, missing success flag, ...).
    #[error("Unexpected payload: {payload}")]
    UnexpectedPayload { payload: serde_json::Value },
}

impl ApiError {
    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            is_timeout: false,
        }
    }

    /// Creates a Deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Creates an UnexpectedPayload error
    pub fn unexpected_payload(payload: serde_json::Value) -> Self {
        Self::UnexpectedPayload { payload }
    }

    /// Check if this is a deserialization error
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// Check if this is an authentication failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status code, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization {
            message: err.to_string(),
        }
    }
}

/// Errors raised while expanding dotted keys into a nested structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Two keys disagree on whether `path` is a leaf or a nested node, or
    /// assign it different leaf values.
    #[error("Conflicting values for field path '{path}'")]
    Conflict { path: String },

    /// A key is empty or contains an empty segment (`a..b`, `.a`, `a.`).
    #[error("Field path '{key}' contains an empty segment")]
    EmptySegment { key: String },
}

/// What a [`crate::user::UserService`] returns: either an error that is
/// already structured, or a foreign one the caller decides how to wrap.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ServiceError {
    /// Keeps a structured error unchanged and wraps a foreign one under
    /// `code`.
    pub fn into_store_error(self, code: ErrorCode, message: impl Into<String>) -> StoreError {
        match self {
            Self::Store(err) => err,
            Self::Api(err) => StoreError::wrap(code, message, err),
        }
    }

    /// The structured code, if there is one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Store(err) => Some(err.code),
            Self::Api(_) => None,
        }
    }
}

/// A type alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
