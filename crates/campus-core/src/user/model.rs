//! User list entries and the request/response payloads of the admin API.

use crate::transport::is_truthy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Role of an account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    /// Human-readable badge label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Admin",
        }
    }
}

/// One row of the admin user list.
///
/// The backend serializes ids as `_id` and timestamps as `created_at` in some
/// responses; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        rename = "createdAt",
        alias = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl User {
    /// Trims username and email; an email that is blank after trimming is
    /// dropped.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.username.trim();
        if trimmed.len() != self.username.len() {
            self.username = trimmed.to_string();
        }
        self.email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());
        self
    }
}

/// Body of `POST /api/admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    pub role: Role,
}

/// Body of `PATCH /api/admin/users/{id}`. Only the fields that are set are
/// sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

/// Inclusive date window for the growth statistics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Query parameters in the `YYYY-MM-DD` form the backend parses.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            (
                "start_date".to_string(),
                self.start_date.format("%Y-%m-%d").to_string(),
            ),
            (
                "end_date".to_string(),
                self.end_date.format("%Y-%m-%d").to_string(),
            ),
        ]
    }
}

/// Number of accounts per role.
pub type RoleCounts = BTreeMap<Role, u64>;

/// Growth figures keyed by whatever labels the backend reports.
pub type GrowthStats = BTreeMap<String, f64>;

/// Result of `PATCH /api/admin/users/edit-user-detail/{id}`.
///
/// The backend confirms with either `status` or `success`, and not always as
/// a boolean, so both are kept as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditDetailOutcome {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub status: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub success: Value,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl EditDetailOutcome {
    pub fn confirmed(msg: impl Into<String>) -> Self {
        Self {
            status: Value::Bool(true),
            success: Value::Null,
            msg: Some(msg.into()),
        }
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self {
            status: Value::Bool(false),
            success: Value::Null,
            msg: Some(msg.into()),
        }
    }

    /// True when either indicator is truthy.
    pub fn is_confirmed(&self) -> bool {
        is_truthy(&self.status) || is_truthy(&self.success)
    }
}

/// Account returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `data` payload of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    pub access_token: String,
}
