//! Role-specific user detail.
//!
//! `GET /api/admin/users/detail/{id}` returns a `profile` object plus at most
//! one of `student_info`, `teacher_info` or `admin_info`, selected by
//! `profile.role`. The backend leaves the info block out when the role has no
//! record yet, so it is optional on every variant.

use super::model::Role;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The `profile` part of a detail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Attendance mark for a single day.
///
/// Marks outside the known set are carried verbatim in `Other`, so a record
/// read from the server is written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
    Other(String),
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AttendanceStatus::Other(_))
    }
}

impl From<String> for AttendanceStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "present" => AttendanceStatus::Present,
            "absent" => AttendanceStatus::Absent,
            "late" => AttendanceStatus::Late,
            "excused" => AttendanceStatus::Excused,
            _ => AttendanceStatus::Other(raw),
        }
    }
}

impl From<&str> for AttendanceStatus {
    fn from(raw: &str) -> Self {
        AttendanceStatus::from(raw.to_string())
    }
}

impl From<AttendanceStatus> for String {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance keyed by `YYYY-MM-DD`.
pub type AttendanceRecord = BTreeMap<String, AttendanceStatus>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attendance_record: AttendanceRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses_enrolled: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scholarships: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_gpa: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remaining_credits: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this client does not model, kept so nothing is lost.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub teacher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecturer_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full detail of one user, tagged by `profile.role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUserDetail", into = "RawUserDetail")]
pub enum UserDetail {
    Student {
        profile: UserProfile,
        student_info: Option<StudentInfo>,
    },
    Teacher {
        profile: UserProfile,
        teacher_info: Option<TeacherInfo>,
    },
    Admin {
        profile: UserProfile,
        admin_info: Option<AdminInfo>,
    },
}

impl UserDetail {
    pub fn profile(&self) -> &UserProfile {
        match self {
            UserDetail::Student { profile, .. }
            | UserDetail::Teacher { profile, .. }
            | UserDetail::Admin { profile, .. } => profile,
        }
    }

    pub fn id(&self) -> &str {
        &self.profile().id
    }

    pub fn role(&self) -> Role {
        self.profile().role
    }

    /// Name of the role-specific block, which is also the first segment of
    /// every dotted key that edits it.
    pub fn info_key(&self) -> &'static str {
        match self {
            UserDetail::Student { .. } => "student_info",
            UserDetail::Teacher { .. } => "teacher_info",
            UserDetail::Admin { .. } => "admin_info",
        }
    }

    pub fn student_info(&self) -> Option<&StudentInfo> {
        match self {
            UserDetail::Student { student_info, .. } => student_info.as_ref(),
            _ => None,
        }
    }

    pub fn teacher_info(&self) -> Option<&TeacherInfo> {
        match self {
            UserDetail::Teacher { teacher_info, .. } => teacher_info.as_ref(),
            _ => None,
        }
    }

    pub fn admin_info(&self) -> Option<&AdminInfo> {
        match self {
            UserDetail::Admin { admin_info, .. } => admin_info.as_ref(),
            _ => None,
        }
    }

    /// Attendance of a student; empty for other roles.
    pub fn attendance(&self) -> AttendanceRecord {
        self.student_info()
            .map(|info| info.attendance_record.clone())
            .unwrap_or_default()
    }
}

/// Wire shape of [`UserDetail`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawUserDetail {
    profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    student_info: Option<StudentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    teacher_info: Option<TeacherInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_info: Option<AdminInfo>,
}

/// Raised when the info block present does not belong to the profile's role.
#[derive(Debug)]
pub struct RoleMismatch {
    role: Role,
    block: &'static str,
}

impl fmt::Display for RoleMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user detail with role '{}' must not carry '{}'",
            self.role, self.block
        )
    }
}

impl TryFrom<RawUserDetail> for UserDetail {
    type Error = RoleMismatch;

    fn try_from(raw: RawUserDetail) -> Result<Self, Self::Error> {
        let role = raw.profile.role;
        let mismatch = |block| Err(RoleMismatch { role, block });

        match role {
            Role::Student => {
                if raw.teacher_info.is_some() {
                    return mismatch("teacher_info");
                }
                if raw.admin_info.is_some() {
                    return mismatch("admin_info");
                }
                Ok(UserDetail::Student {
                    profile: raw.profile,
                    student_info: raw.student_info,
                })
            }
            Role::Teacher => {
                if raw.student_info.is_some() {
                    return mismatch("student_info");
                }
                if raw.admin_info.is_some() {
                    return mismatch("admin_info");
                }
                Ok(UserDetail::Teacher {
                    profile: raw.profile,
                    teacher_info: raw.teacher_info,
                })
            }
            Role::Admin => {
                if raw.student_info.is_some() {
                    return mismatch("student_info");
                }
                if raw.teacher_info.is_some() {
                    return mismatch("teacher_info");
                }
                Ok(UserDetail::Admin {
                    profile: raw.profile,
                    admin_info: raw.admin_info,
                })
            }
        }
    }
}

impl From<UserDetail> for RawUserDetail {
    fn from(detail: UserDetail) -> Self {
        let mut raw = RawUserDetail {
            profile: detail.profile().clone(),
            student_info: None,
            teacher_info: None,
            admin_info: None,
        };
        match detail {
            UserDetail::Student { student_info, .. } => raw.student_info = student_info,
            UserDetail::Teacher { teacher_info, .. } => raw.teacher_info = teacher_info,
            UserDetail::Admin { admin_info, .. } => raw.admin_info = admin_info,
        }
        raw
    }
}
