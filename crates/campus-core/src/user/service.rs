//! The admin user API as seen by the rest of the client.

use super::detail::UserDetail;
use super::model::{
    CreateUserRequest, DateRange, EditDetailOutcome, GrowthStats, RoleCounts, UpdateUserRequest,
    User,
};
use crate::error::ServiceResult;
use async_trait::async_trait;
use serde_json::Value;

/// Operations of the admin user API.
///
/// Each operation either succeeds with a typed value or fails with a
/// [`crate::error::ServiceError`]. Contract violations the operation knows
/// about (an empty user list, an empty detail payload, a create without the
/// success flag, ...) are reported as structured `StoreError`s with their own
/// code; everything else (network failures, unexpected statuses, malformed
/// bodies) is an `ApiError` left for the caller to wrap.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Lists all users. An empty list is a `NO_USERS_FOUND` error.
    async fn list_users(&self) -> ServiceResult<Vec<User>>;

    /// Fetches the detail of one user. An empty payload is `USER_NOT_FOUND`.
    async fn get_user_details(&self, id: &str) -> ServiceResult<UserDetail>;

    /// Creates a user. Anything but HTTP 201 with a success flag is
    /// `CREATE_USER_FAILED`.
    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<User>;

    /// Shallow update of username/email. An empty payload is
    /// `UPDATE_USER_FAILED`.
    async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> ServiceResult<User>;

    /// Deletes a user. Every failure, transport errors included, is
    /// `DELETE_USER_FAILED`.
    async fn delete_user(&self, id: &str) -> ServiceResult<()>;

    /// Number of users per role.
    async fn count_by_role(&self) -> ServiceResult<RoleCounts>;

    /// Growth statistics for the given window. An empty payload is
    /// `COMPARE_GROWTH_STATS_BY_ROLE_FAILED`.
    async fn compare_growth_stats_by_role(&self, range: &DateRange) -> ServiceResult<GrowthStats>;

    /// Applies a nested partial update to a user's detail. An empty payload
    /// is `EDIT_USER_DETAIL_FAILED`.
    async fn edit_user_detail(&self, id: &str, partial: &Value)
    -> ServiceResult<EditDetailOutcome>;
}
