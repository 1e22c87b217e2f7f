use super::value::{FieldValue, convert_dates_to_iso};
use crate::error::PatchError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Segments that are maintained by the backend and never edited.
const READ_ONLY_SEGMENTS: [&str; 2] = ["created_at", "updated_at"];

/// A partial update expressed as dotted field paths
/// (`"student_info.attendance_record" -> {...}`).
///
/// Entries keep insertion order; the nested result of [`FlatPatch::unflatten`]
/// does not depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatPatch {
    entries: Vec<(String, FieldValue)>,
}

impl FlatPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FlatPatch::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Keys that target backend-maintained timestamps.
    pub fn read_only_keys(&self) -> Vec<&str> {
        self.keys().filter(|key| !is_editable_field(key)).collect()
    }

    /// Expands the dotted keys into a nested map.
    pub fn unflatten(&self) -> Result<BTreeMap<String, FieldValue>, PatchError> {
        unflatten(self.entries.iter().cloned())
    }

    /// Expands the dotted keys and renders dates, producing the JSON body of
    /// an edit-detail request.
    pub fn to_nested_json(&self) -> Result<Value, PatchError> {
        self.unflatten().map(|nested| convert_dates_to_iso(&nested))
    }
}

impl<K, V> FromIterator<(K, V)> for FlatPatch
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, FieldValue>> for FlatPatch {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl IntoIterator for FlatPatch {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Whether a dotted key may be edited: anything except `created_at` and
/// `updated_at` fields.
pub fn is_editable_field(key: &str) -> bool {
    let last = key.rsplit('.').next().unwrap_or(key);
    !READ_ONLY_SEGMENTS.contains(&last)
}

/// Expands `a.b.c -> v` entries into nested maps so that
/// `result["a"]["b"]["c"] == v`.
///
/// Map-valued entries are merged with the other entries as subtrees. A path
/// that is a leaf in one entry and a node in another, or two different leaves
/// for the same path, is a [`PatchError::Conflict`]. Identical duplicates are
/// accepted, which keeps the result independent of entry order.
pub fn unflatten<I, K>(entries: I) -> Result<BTreeMap<String, FieldValue>, PatchError>
where
    I: IntoIterator<Item = (K, FieldValue)>,
    K: AsRef<str>,
{
    let mut root = BTreeMap::new();
    for (key, value) in entries {
        let key = key.as_ref();
        let segments = split_path(key)?;
        insert_path(&mut root, &segments, 0, value)?;
    }
    Ok(root)
}

/// Inverse of [`unflatten`]: nested maps become dot-joined keys. Empty maps
/// and non-map values are leaves.
pub fn flatten(map: &BTreeMap<String, FieldValue>) -> BTreeMap<String, FieldValue> {
    let mut out = BTreeMap::new();
    flatten_into(map, None, &mut out);
    out
}

fn flatten_into(
    map: &BTreeMap<String, FieldValue>,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, FieldValue>,
) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            FieldValue::Map(inner) if !inner.is_empty() => flatten_into(inner, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

fn split_path(key: &str) -> Result<Vec<&str>, PatchError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(PatchError::EmptySegment {
            key: key.to_string(),
        });
    }
    Ok(segments)
}

fn insert_path(
    node: &mut BTreeMap<String, FieldValue>,
    segments: &[&str],
    depth: usize,
    value: FieldValue,
) -> Result<(), PatchError> {
    let segment = segments[depth];
    let is_last = depth + 1 == segments.len();

    if is_last {
        return match node.entry(segment.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(mut slot) => merge(slot.get_mut(), value, &segments.join(".")),
        };
    }

    let child = node
        .entry(segment.to_string())
        .or_insert_with(|| FieldValue::Map(BTreeMap::new()));
    match child {
        FieldValue::Map(inner) => insert_path(inner, segments, depth + 1, value),
        _ => Err(PatchError::Conflict {
            path: segments[..=depth].join("."),
        }),
    }
}

fn merge(existing: &mut FieldValue, incoming: FieldValue, path: &str) -> Result<(), PatchError> {
    match (existing, incoming) {
        (FieldValue::Map(existing), FieldValue::Map(incoming)) => {
            for (key, value) in incoming {
                let child_path = format!("{path}.{key}");
                match existing.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(mut slot) => merge(slot.get_mut(), value, &child_path)?,
                }
            }
            Ok(())
        }
        (existing, incoming) if *existing == incoming => Ok(()),
        _ => Err(PatchError::Conflict {
            path: path.to_string(),
        }),
    }
}
