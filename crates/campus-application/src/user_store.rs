//! In-memory user list and detail cache in front of a [`UserService`].

use crate::request_state::{RequestState, RequestStates};
use campus_core::error::{ErrorCode, Result, StoreError};
use campus_core::patch::FlatPatch;
use campus_core::user::{EditDetailOutcome, User, UserDetail, UserService};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

const FETCH_USERS_FAILED: &str = "Failed to fetch users";
const FETCH_USER_DETAILS_FAILED: &str = "Failed to fetch user details";
const UPDATE_USER_DETAILS_FAILED: &str = "Failed to update user details";

/// Session-scoped cache of users and user details.
///
/// - The list fetch and each per-id detail fetch are single-flight: a second
///   caller while one is outstanding gets an `ALREADY_LOADING_*` error
///   instead of a second request.
/// - Cached details never expire. They are dropped with
///   [`UserStore::clear_user_details_cache`].
/// - [`UserStore::update_user_patch`] only writes. Callers re-fetch to see
///   the change.
///
/// Locks are never held across an `.await`.
pub struct UserStore {
    service: Arc<dyn UserService>,
    users: RwLock<Vec<User>>,
    detail_cache: RwLock<HashMap<String, UserDetail>>,
    list_request: RequestStates<()>,
    detail_requests: RequestStates<String>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl UserStore {
    pub fn new(service: Arc<dyn UserService>) -> Self {
        Self {
            service,
            users: RwLock::new(Vec::new()),
            detail_cache: RwLock::new(HashMap::new()),
            list_request: RequestStates::new(),
            detail_requests: RequestStates::new(),
        }
    }

    /// The service this store reads through.
    pub fn service(&self) -> &Arc<dyn UserService> {
        &self.service
    }

    /// Fetches the user list and replaces the cached one.
    ///
    /// # Errors
    ///
    /// - `ALREADY_LOADING_USERS` if a list fetch is already in flight.
    /// - Structured service errors (e.g. `NO_USERS_FOUND`) unchanged.
    /// - `FETCH_USERS_FAILED` wrapping any other failure.
    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        let Some(guard) = self.list_request.begin(()) else {
            warn!("User list fetch already in flight");
            return Err(StoreError::already_loading_users());
        };

        let users: Vec<User> = self
            .service
            .list_users()
            .await
            .map_err(|err| {
                err.into_store_error(ErrorCode::FetchUsersFailed, FETCH_USERS_FAILED)
            })?
            .into_iter()
            .map(User::normalized)
            .collect();

        *write(&self.users) = users.clone();
        guard.succeed();

        debug!(count = users.len(), "User list refreshed");
        Ok(users)
    }

    /// Returns the detail of `id`, from the cache when present.
    ///
    /// # Errors
    ///
    /// - `ALREADY_LOADING_USER_DETAILS` if `id` is not cached and already
    ///   being fetched.
    /// - Structured service errors (e.g. `USER_NOT_FOUND`) unchanged.
    /// - `FETCH_USER_DETAILS_FAILED` wrapping any other failure.
    pub async fn get_user_details(&self, id: &str) -> Result<UserDetail> {
        if let Some(detail) = self.cached_user_details(id) {
            debug!(id, "User detail cache hit");
            return Ok(detail);
        }

        let Some(guard) = self.detail_requests.begin(id.to_string()) else {
            warn!(id, "User detail fetch already in flight");
            return Err(StoreError::already_loading_user_details());
        };

        let detail = self.service.get_user_details(id).await.map_err(|err| {
            err.into_store_error(ErrorCode::FetchUserDetailsFailed, FETCH_USER_DETAILS_FAILED)
        })?;

        write(&self.detail_cache).insert(id.to_string(), detail.clone());
        guard.succeed();

        debug!(id, role = %detail.role(), "User detail cached");
        Ok(detail)
    }

    /// Drops the cached detail of `id`, or every cached detail when `id` is
    /// `None`. Unknown ids are ignored.
    pub fn clear_user_details_cache(&self, id: Option<&str>) {
        match id {
            Some(id) => {
                write(&self.detail_cache).remove(id);
                self.detail_requests.reset(id);
            }
            None => {
                write(&self.detail_cache).clear();
                self.detail_requests.reset_all();
            }
        }
    }

    /// Sends a dotted-path partial update of a user's detail.
    ///
    /// The patch is expanded into a nested object with date leaves rendered
    /// as ISO-8601 strings. The detail cache is left untouched.
    ///
    /// # Errors
    ///
    /// `UPDATE_USER_DETAILS_FAILED` when the patch cannot be expanded, the
    /// call fails with a foreign error, or the server does not confirm the
    /// edit. Structured service errors pass through unchanged.
    pub async fn update_user_patch(
        &self,
        id: &str,
        patch: &FlatPatch,
    ) -> Result<EditDetailOutcome> {
        let nested = patch.to_nested_json().map_err(|err| {
            StoreError::wrap(
                ErrorCode::UpdateUserDetailsFailed,
                UPDATE_USER_DETAILS_FAILED,
                err,
            )
        })?;

        let outcome = self
            .service
            .edit_user_detail(id, &nested)
            .await
            .map_err(|err| {
                err.into_store_error(ErrorCode::UpdateUserDetailsFailed, UPDATE_USER_DETAILS_FAILED)
            })?;

        if !outcome.is_confirmed() {
            error!(id, msg = ?outcome.msg, "Server did not confirm the user detail edit");
            return Err(StoreError::new(
                ErrorCode::UpdateUserDetailsFailed,
                outcome
                    .msg
                    .unwrap_or_else(|| UPDATE_USER_DETAILS_FAILED.to_string()),
            ));
        }

        info!(id, fields = patch.len(), "User detail updated");
        Ok(outcome)
    }

    /// Snapshot of the last fetched user list.
    pub fn users(&self) -> Vec<User> {
        read(&self.users).clone()
    }

    pub fn find_user(&self, id: &str) -> Option<User> {
        read(&self.users).iter().find(|user| user.id == id).cloned()
    }

    /// Replaces the cached list without a fetch.
    pub fn set_users(&self, users: Vec<User>) {
        *write(&self.users) = users;
    }

    pub fn cached_user_details(&self, id: &str) -> Option<UserDetail> {
        read(&self.detail_cache).get(id).cloned()
    }

    pub fn list_state(&self) -> RequestState {
        self.list_request.get(&())
    }

    pub fn detail_state(&self, id: &str) -> RequestState {
        self.detail_requests.get(id)
    }

    pub fn is_loading_users(&self) -> bool {
        self.list_state().is_in_flight()
    }

    pub fn is_loading_user_details(&self, id: &str) -> bool {
        self.detail_requests.is_in_flight(id)
    }
}
