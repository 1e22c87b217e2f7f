#![allow(dead_code)]

use async_trait::async_trait;
use campus_core::error::{ErrorCode, ServiceError, ServiceResult, StoreError};
use campus_core::user::{
    CreateUserRequest, DateRange, EditDetailOutcome, GrowthStats, Role, RoleCounts,
    UpdateUserRequest, User, UserDetail, UserService,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a mocked fetch behaves.
#[derive(Clone, Default)]
pub enum Behavior {
    #[default]
    Normal,
    Fail(ServiceError),
    /// Never completes.
    Hang,
}

/// In-memory [`UserService`] that counts calls and yields once per call so
/// concurrent callers interleave.
#[derive(Default)]
pub struct MockUserService {
    pub users: Mutex<Vec<User>>,
    /// Detail payloads as JSON, so edits can be merged into them.
    pub details: Mutex<HashMap<String, Value>>,
    pub list_behavior: Mutex<Behavior>,
    pub detail_behavior: Mutex<Behavior>,
    pub edit_outcome: Mutex<Option<EditDetailOutcome>>,
    pub edits: Mutex<Vec<(String, Value)>>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub edit_calls: AtomicUsize,
}

impl MockUserService {
    pub fn with_users(users: Vec<User>) -> Self {
        let service = Self::default();
        *service.users.lock().unwrap() = users;
        service
    }

    pub fn add_detail(&self, id: &str, detail: Value) {
        self.details.lock().unwrap().insert(id.to_string(), detail);
    }

    pub fn set_list_behavior(&self, behavior: Behavior) {
        *self.list_behavior.lock().unwrap() = behavior;
    }

    pub fn set_detail_behavior(&self, behavior: Behavior) {
        *self.detail_behavior.lock().unwrap() = behavior;
    }

    pub fn set_edit_outcome(&self, outcome: EditDetailOutcome) {
        *self.edit_outcome.lock().unwrap() = Some(outcome);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn edit_calls(&self) -> usize {
        self.edit_calls.load(Ordering::SeqCst)
    }

    pub fn last_edit(&self) -> Option<(String, Value)> {
        self.edits.lock().unwrap().last().cloned()
    }
}

async fn apply(behavior: Behavior) -> ServiceResult<()> {
    match behavior {
        Behavior::Normal => Ok(()),
        Behavior::Fail(err) => Err(err),
        Behavior::Hang => std::future::pending().await,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait]
impl UserService for MockUserService {
    async fn list_users(&self) -> ServiceResult<Vec<User>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let behavior = self.list_behavior.lock().unwrap().clone();
        apply(behavior).await?;

        let users = self.users.lock().unwrap().clone();
        if users.is_empty() {
            return Err(StoreError::new(ErrorCode::NoUsersFound, "No users found").into());
        }
        Ok(users)
    }

    async fn get_user_details(&self, id: &str) -> ServiceResult<UserDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let behavior = self.detail_behavior.lock().unwrap().clone();
        apply(behavior).await?;

        let detail = self.details.lock().unwrap().get(id).cloned();
        match detail {
            Some(detail) => Ok(serde_json::from_value(detail)
                .map_err(campus_core::error::ApiError::from)?),
            None => Err(StoreError::user_not_found(id).into()),
        }
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ServiceResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: format!("u{}", users.len() + 1),
            role: request.role,
            username: request.username.clone(),
            email: request.email.clone(),
            created_at: Some("2024-09-01T00:00:00".to_string()),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> ServiceResult<User> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            let err = StoreError::new(ErrorCode::UpdateUserFailed, "Failed to update user");
            return Err(err.into());
        };
        if let Some(username) = &request.username {
            user.username = username.clone();
        }
        if let Some(email) = &request.email {
            user.email = Some(email.clone());
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != id);
        if users.len() == before {
            let err = StoreError::new(ErrorCode::DeleteUserFailed, "Failed to delete user");
            return Err(err.into());
        }
        Ok(())
    }

    async fn count_by_role(&self) -> ServiceResult<RoleCounts> {
        let mut counts = RoleCounts::new();
        for user in self.users.lock().unwrap().iter() {
            *counts.entry(user.role).or_default() += 1;
        }
        Ok(counts)
    }

    async fn compare_growth_stats_by_role(
        &self,
        _range: &DateRange,
    ) -> ServiceResult<GrowthStats> {
        Ok(GrowthStats::from([("student".to_string(), 10.0)]))
    }

    async fn edit_user_detail(
        &self,
        id: &str,
        partial: &Value,
    ) -> ServiceResult<EditDetailOutcome> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.edits
            .lock()
            .unwrap()
            .push((id.to_string(), partial.clone()));

        let outcome = self
            .edit_outcome
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| EditDetailOutcome::confirmed("User detail updated successfully"));
        if outcome.is_confirmed() {
            if let Some(detail) = self.details.lock().unwrap().get_mut(id) {
                merge(detail, partial);
            }
        }
        Ok(outcome)
    }
}

pub fn user(id: &str, role: Role, username: &str) -> User {
    User {
        id: id.to_string(),
        role,
        username: username.to_string(),
        email: None,
        created_at: None,
    }
}

pub fn student_detail(id: &str, username: &str) -> Value {
    json!({
        "profile": {"_id": id, "role": "student", "username": username},
        "student_info": {
            "student_id": format!("S-{id}"),
            "major": "Physics",
            "attendance_record": {"2024-05-01": "present"}
        }
    })
}
