//! User administration flows.
//!
//! `UserAdminUseCase` combines direct service calls (create, update, delete,
//! statistics) with the [`UserStore`] so that the cached list and details
//! are refreshed after every mutation.

use crate::user_store::UserStore;
use campus_core::error::{ErrorCode, Result, StoreError};
use campus_core::patch::{FieldValue, FlatPatch, is_editable_field};
use campus_core::user::{
    AttendanceRecord, CreateUserRequest, DateRange, GrowthStats, RoleCounts, UpdateUserRequest,
    User, UserDetail, UserService,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Dotted path of a student's attendance map.
pub const ATTENDANCE_FIELD: &str = "student_info.attendance_record";

pub struct UserAdminUseCase {
    store: Arc<UserStore>,
}

impl UserAdminUseCase {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    fn service(&self) -> &Arc<dyn UserService> {
        self.store.service()
    }

    /// Loads the user list into the store.
    pub async fn load_users(&self) -> Result<Vec<User>> {
        self.store.fetch_users().await
    }

    /// Re-fetches the list after a mutation. An empty list is not an error
    /// here: the last user may just have been removed.
    async fn refresh_users(&self) -> Result<Vec<User>> {
        match self.store.fetch_users().await {
            Err(err) if err.is(ErrorCode::NoUsersFound) => {
                debug!("User list is empty after refresh");
                self.store.set_users(Vec::new());
                Ok(Vec::new())
            }
            other => other,
        }
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User> {
        let user = self
            .service()
            .create_user(request)
            .await
            .map_err(|err| {
                err.into_store_error(ErrorCode::CreateUserFailed, "Failed to create user")
            })?;

        self.refresh_users().await?;
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<User> {
        let user = self
            .service()
            .update_user(id, request)
            .await
            .map_err(|err| {
                err.into_store_error(ErrorCode::UpdateUserFailed, "Failed to update user")
            })?;

        self.refresh_users().await?;
        Ok(user)
    }

    /// Deletes a user, drops their cached detail and refreshes the list.
    pub async fn delete_user(&self, id: &str) -> Result<Vec<User>> {
        self.service()
            .delete_user(id)
            .await
            .map_err(|err| {
                err.into_store_error(ErrorCode::DeleteUserFailed, "Failed to delete user")
            })?;

        self.store.clear_user_details_cache(Some(id));
        info!(id, "User deleted");
        self.refresh_users().await
    }

    pub async fn user_details(&self, id: &str) -> Result<UserDetail> {
        self.store.get_user_details(id).await
    }

    /// Edits one dotted field of a user's detail and returns the detail as
    /// the server now has it.
    ///
    /// Timestamp fields (`*.created_at`, `*.updated_at`) are rejected with
    /// `UPDATE_USER_DETAILS_FAILED` before anything is sent.
    pub async fn edit_detail_field(
        &self,
        id: &str,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<UserDetail> {
        if !is_editable_field(key) {
            return Err(StoreError::new(
                ErrorCode::UpdateUserDetailsFailed,
                format!("Field '{key}' is read-only"),
            ));
        }

        let patch = FlatPatch::new().with(key, value);
        self.store.update_user_patch(id, &patch).await?;

        self.store.clear_user_details_cache(Some(id));
        let detail = self.store.get_user_details(id).await?;
        self.refresh_users().await?;
        Ok(detail)
    }

    /// Replaces a student's attendance record.
    pub async fn save_attendance(&self, id: &str, record: &AttendanceRecord) -> Result<UserDetail> {
        let value = FieldValue::from_serialize(record).map_err(|err| {
            StoreError::wrap(
                ErrorCode::UpdateUserDetailsFailed,
                "Failed to encode attendance record",
                err,
            )
        })?;
        self.edit_detail_field(id, ATTENDANCE_FIELD, value).await
    }

    /// Number of accounts per role.
    pub async fn dashboard(&self) -> Result<RoleCounts> {
        self.service().count_by_role().await.map_err(|err| {
            err.into_store_error(ErrorCode::FetchUsersFailed, "Failed to count users by role")
        })
    }

    pub async fn growth(&self, range: &DateRange) -> Result<GrowthStats> {
        self.service()
            .compare_growth_stats_by_role(range)
            .await
            .map_err(|err| {
                err.into_store_error(
                    ErrorCode::CompareGrowthStatsByRoleFailed,
                    "Failed to compare growth stats by role",
                )
            })
    }
}
