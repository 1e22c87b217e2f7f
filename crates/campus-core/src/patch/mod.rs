//! Dotted-path partial updates.
//!
//! Detail edits are collected as flat `path -> value` entries
//! (`"student_info.attendance_record"`), expanded into the nested shape the
//! backend expects, and have their date leaves rendered as ISO-8601 strings.

mod path;
mod value;

pub use path::{FlatPatch, flatten, is_editable_field, unflatten};
pub use value::{FieldValue, convert_dates_to_iso};
