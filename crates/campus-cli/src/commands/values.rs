//! Parsing of `key=value` command-line arguments.

use anyhow::{Result, anyhow, bail};
use campus_core::patch::{FieldValue, FlatPatch};
use campus_core::user::{AttendanceRecord, AttendanceStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Reads a value as JSON, then an RFC 3339 datetime, then a `YYYY-MM-DD`
/// date, and falls back to a plain string.
pub fn parse_value(raw: &str) -> FieldValue {
    if let Ok(json) = serde_json::from_str::<Value>(raw) {
        return FieldValue::from(json);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return FieldValue::DateTime(datetime.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return FieldValue::Date(date);
    }
    FieldValue::String(raw.to_string())
}

fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected key=value, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Missing key in '{arg}'");
    }
    Ok((key, value))
}

pub fn parse_patch(args: &[String]) -> Result<FlatPatch> {
    args.iter()
        .map(|arg| split_assignment(arg).map(|(key, value)| (key, parse_value(value))))
        .collect()
}

/// Parses `date=status` entries into an attendance record.
pub fn parse_attendance(args: &[String]) -> Result<AttendanceRecord> {
    let mut record = AttendanceRecord::new();
    for arg in args {
        let (date, raw_status) = split_assignment(arg)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|err| anyhow!("Invalid date '{date}': {err}"))?;
        let status = AttendanceStatus::from(raw_status.trim().to_lowercase());
        if !status.is_known() {
            bail!("Unknown attendance status '{raw_status}'");
        }
        record.insert(date.format("%Y-%m-%d").to_string(), status);
    }
    Ok(record)
}
