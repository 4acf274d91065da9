//! Snapshot adapter
//!
//! Parses the JSON the presentation layer persists into a [`Snapshot`].
//! Malformed input is treated as empty, never as an error: a collection that
//! is missing or not an array reads as `[]`, and an element that cannot be
//! read as its record type is dropped. Only invalid JSON syntax fails.

use crate::error::EngineError;
use crate::profile::ProfileKey;
use crate::store::{
    KeyValueStore, FOCUS_SESSIONS_KEY, GOALS_KEY, MOODS_KEY, PLANNER_KEY, PROFILE_KEY, TASKS_KEY,
};
use crate::types::Snapshot;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Accepted document keys per collection, canonical name first
const TASK_KEYS: &[&str] = &[TASKS_KEY];
const FOCUS_KEYS: &[&str] = &[FOCUS_SESSIONS_KEY, "focusSessions", "focus"];
const MOOD_KEYS: &[&str] = &[MOODS_KEY, "mood_entries", "moodEntries"];
const PLANNER_KEYS: &[&str] = &[PLANNER_KEY, "plannerBlocks", "planner_items", "plannerItems"];
const GOAL_KEYS: &[&str] = &[GOALS_KEY];

/// Adapter from persisted JSON to snapshots
pub struct SnapshotAdapter;

impl SnapshotAdapter {
    /// Parse a snapshot document
    pub fn parse(raw_json: &str) -> Result<Snapshot, EngineError> {
        let value: Value =
            serde_json::from_str(raw_json).map_err(|e| EngineError::ParseError(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// Read a snapshot out of an already-parsed document
    pub fn from_value(value: &Value) -> Snapshot {
        let Some(doc) = value.as_object() else {
            tracing::debug!("snapshot document is not an object, using empty snapshot");
            return Snapshot::default();
        };

        let field = |keys: &[&str]| keys.iter().find_map(|k| doc.get(*k));

        Snapshot {
            tasks: read_collection(field(TASK_KEYS), TASKS_KEY),
            focus_sessions: read_collection(field(FOCUS_KEYS), FOCUS_SESSIONS_KEY),
            moods: read_collection(field(MOOD_KEYS), MOODS_KEY),
            planner: read_collection(field(PLANNER_KEYS), PLANNER_KEY),
            goals: read_collection(field(GOAL_KEYS), GOALS_KEY),
        }
    }

    /// Load every collection from the local store
    pub fn from_store(store: &dyn KeyValueStore) -> Snapshot {
        Snapshot {
            tasks: read_collection(store.get(TASKS_KEY).as_ref(), TASKS_KEY),
            focus_sessions: read_collection(
                store.get(FOCUS_SESSIONS_KEY).as_ref(),
                FOCUS_SESSIONS_KEY,
            ),
            moods: read_collection(store.get(MOODS_KEY).as_ref(), MOODS_KEY),
            planner: read_collection(store.get(PLANNER_KEY).as_ref(), PLANNER_KEY),
            goals: read_collection(store.get(GOALS_KEY).as_ref(), GOALS_KEY),
        }
    }

    /// Persisted profile selection, if one is stored and recognized
    pub fn profile_from_store(store: &dyn KeyValueStore) -> Option<ProfileKey> {
        let value = store.get(PROFILE_KEY)?;
        match value.as_str().map(str::parse::<ProfileKey>) {
            Some(Ok(key)) => Some(key),
            _ => {
                tracing::debug!(%value, "ignoring unrecognized stored profile");
                None
            }
        }
    }
}

/// Read an array of records, skipping elements that do not fit `T`
fn read_collection<T: DeserializeOwned>(value: Option<&Value>, name: &str) -> Vec<T> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::debug!(collection = name, kind = json_kind(other), "collection is not an array, treating as empty");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for item in items {
        if !item.is_object() {
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::debug!(collection = name, error = %e, "skipping unreadable record");
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(collection = name, kept = records.len(), skipped, "skipped malformed records");
    }

    records
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
