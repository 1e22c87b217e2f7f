//! HTTP implementation of [`UserService`] over the `/api/admin/` endpoints.

use async_trait::async_trait;
use campus_core::config::DEFAULT_API_PREFIX;
use campus_core::error::{ApiError, ErrorCode, ServiceResult, StoreError};
use campus_core::transport::{ApiEnvelope, ApiRequest, ApiTransport};
use campus_core::user::{
    CreateUserRequest, DateRange, EditDetailOutcome, GrowthStats, RoleCounts, UpdateUserRequest,
    User, UserDetail, UserService,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// [`UserService`] that sends every operation through an [`ApiTransport`].
///
/// The transport only moves bytes; this type owns the per-operation
/// contracts (expected status, required payload, error codes).
#[derive(Clone)]
pub struct HttpUserService {
    transport: Arc<dyn ApiTransport>,
    base_path: String,
}

impl HttpUserService {
    /// Creates a service rooted at `/api/admin/`.
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            base_path: DEFAULT_API_PREFIX.to_string(),
        }
    }

    /// Overrides the base path. A trailing slash is added when missing.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let mut base_path = base_path.into();
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        self.base_path = base_path;
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.base_path, suffix)
    }

    /// Sends a request that must come back with a 2xx status and returns its
    /// envelope.
    async fn send_expecting_success(&self, request: ApiRequest) -> Result<ApiEnvelope, ApiError> {
        let response = self.transport.send(request).await?.error_for_status()?;
        response.envelope()
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|err| ApiError::deserialization(format!("Failed to encode request: {err}")))
}

#[async_trait]
impl UserService for HttpUserService {
    async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let envelope = self
            .send_expecting_success(ApiRequest::get(self.path("")))
            .await?;

        let users: Vec<User> = if envelope.data.is_null() {
            Vec::new()
        } else {
            envelope.decode()?
        };
        if users.is_empty() {
            return Err(StoreError::new(ErrorCode::NoUsersFound, "No users found").into());
        }

        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    async fn get_user_details(&self, id: &str) -> ServiceResult<UserDetail> {
        let envelope = self
            .send_expecting_success(ApiRequest::get(self.path(&format!("users/detail/{id}"))))
            .await?;

        if !envelope.has_data() {
            return Err(StoreError::user_not_found(id)
                .with_cause(ApiError::unexpected_payload(envelope.data))
                .into());
        }
        Ok(envelope.decode()?)
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<User> {
        let response = self
            .transport
            .send(ApiRequest::post(self.path("users")).with_body(to_body(request)?))
            .await?;

        let envelope = response.envelope().unwrap_or_default();
        let succeeded = match envelope.success {
            Some(flag) => flag,
            None => envelope.status == Some(true),
        };
        if response.status != 201 || !succeeded {
            let message = envelope
                .message
                .clone()
                .unwrap_or_else(|| "Failed to create user".to_string());
            return Err(StoreError::wrap(
                ErrorCode::CreateUserFailed,
                message,
                ApiError::unexpected_payload(response.body),
            )
            .into());
        }

        let user: User = envelope.decode()?;
        info!(id = %user.id, username = %user.username, role = %user.role, "Created user");
        Ok(user)
    }

    async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> ServiceResult<User> {
        let envelope = self
            .send_expecting_success(
                ApiRequest::patch(self.path(&format!("users/{id}"))).with_body(to_body(request)?),
            )
            .await?;

        if !envelope.has_data() {
            return Err(StoreError::wrap(
                ErrorCode::UpdateUserFailed,
                "Failed to update user",
                ApiError::unexpected_payload(envelope.data),
            )
            .into());
        }

        let user: User = envelope.decode()?;
        info!(id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let cause = match self
            .transport
            .send(ApiRequest::delete(self.path(&format!("users/{id}"))))
            .await
        {
            Ok(response) if response.status == 200 => {
                info!(id, "Deleted user");
                return Ok(());
            }
            Ok(response) => response.into_status_error(),
            Err(err) => err,
        };

        Err(StoreError::wrap(ErrorCode::DeleteUserFailed, "Failed to delete user", cause).into())
    }

    async fn count_by_role(&self) -> ServiceResult<RoleCounts> {
        let envelope = self
            .send_expecting_success(ApiRequest::get(self.path("users/count-by-role")))
            .await?;
        Ok(envelope.decode()?)
    }

    async fn compare_growth_stats_by_role(&self, range: &DateRange) -> ServiceResult<GrowthStats> {
        let envelope = self
            .send_expecting_success(
                ApiRequest::get(self.path("users/growth-stats-by-role"))
                    .with_query(range.query_pairs()),
            )
            .await?;

        if !envelope.has_data() {
            return Err(StoreError::wrap(
                ErrorCode::CompareGrowthStatsByRoleFailed,
                "Failed to compare growth stats by role",
                ApiError::unexpected_payload(envelope.data),
            )
            .into());
        }
        Ok(envelope.decode()?)
    }

    async fn edit_user_detail(
        &self,
        id: &str,
        partial: &Value,
    ) -> ServiceResult<EditDetailOutcome> {
        let envelope = self
            .send_expecting_success(
                ApiRequest::patch(self.path(&format!("users/edit-user-detail/{id}")))
                    .with_body(partial.clone()),
            )
            .await?;

        if !envelope.has_data() {
            return Err(StoreError::wrap(
                ErrorCode::EditUserDetailFailed,
                "Failed to edit user detail",
                ApiError::unexpected_payload(envelope.data),
            )
            .into());
        }
        Ok(envelope.decode()?)
    }
}
