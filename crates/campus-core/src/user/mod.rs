//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: list entries, roles and request/response payloads
//! - `detail`: the role-tagged `UserDetail` and its info blocks
//! - `service`: the `UserService` trait

mod detail;
mod model;
mod service;

// Re-export public API
pub use detail::{
    AdminInfo, AttendanceRecord, AttendanceStatus, RoleMismatch, StudentInfo, TeacherInfo,
    UserDetail, UserProfile,
};
pub use model::{
    AuthUser, CreateUserRequest, DateRange, EditDetailOutcome, GrowthStats, LoginResponse, Role,
    RoleCounts, UpdateUserRequest, User,
};
pub use service::UserService;
