//! Record types consumed by the metrics engine
//!
//! These are the flat collections the presentation layer persists: tasks,
//! focus sessions, mood entries, planner blocks and goals. Field names accept
//! both the snake_case form and the camelCase form written by the host app.

use crate::time::{self, RecordTime};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// A user task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
    /// Whether the task is done
    #[serde(default, alias = "done")]
    pub completed: bool,
    /// When the task was created
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<RecordTime>,
    /// When the task was completed (set iff `completed`)
    #[serde(
        default,
        alias = "completedAt",
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<RecordTime>,
}

impl Task {
    /// Create an open task
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        priority: Priority,
        created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            priority,
            completed: false,
            created_at: Some(created_at.into()),
            completed_at: None,
        }
    }

    /// Mark the task completed (or reopened), keeping `completed_at` in step
    pub fn set_completed(&mut self, completed: bool, at: DateTime<FixedOffset>) {
        self.completed = completed;
        self.completed_at = if completed { Some(at.into()) } else { None };
    }

    /// The timestamp that counts as activity for this task
    pub fn activity_time(&self) -> Option<RecordTime> {
        self.completed_at.or(self.created_at)
    }
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let priority = match value.as_ref().and_then(|v| v.as_str()) {
        Some(s) if s.eq_ignore_ascii_case("high") => Priority::High,
        Some(s) if s.eq_ignore_ascii_case("low") => Priority::Low,
        _ => Priority::Medium,
    };
    Ok(priority)
}

/// A completed focus session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    /// Session length in seconds
    #[serde(default, alias = "duration", alias = "seconds", deserialize_with = "lenient_seconds")]
    pub duration_seconds: f64,
    /// When the session finished
    #[serde(
        default,
        alias = "timestamp",
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<RecordTime>,
}

impl FocusSession {
    /// A session produced by a countdown reaching zero
    pub fn completed(duration_seconds: u32, at: DateTime<FixedOffset>) -> Self {
        Self {
            duration_seconds: duration_seconds as f64,
            date: Some(at.into()),
        }
    }

    /// A manually logged block of focus minutes
    pub fn manual(minutes: u32, at: DateTime<FixedOffset>) -> Self {
        Self::completed(minutes.saturating_mul(60), at)
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let seconds = value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Ok(if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    })
}

/// A logged mood
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(
        default,
        alias = "timestamp",
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<RecordTime>,
    /// Mood label (great, calm, tired, ...)
    #[serde(default, alias = "mood", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Explicit 0-100 score, takes precedence over the label
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl MoodEntry {
    pub fn labeled(label: impl Into<String>, at: DateTime<FixedOffset>) -> Self {
        Self {
            date: Some(at.into()),
            label: Some(label.into()),
            score: None,
        }
    }

    pub fn scored(score: f64) -> Self {
        Self {
            date: None,
            label: None,
            score: Some(score),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_f64())
        .filter(|f| f.is_finite()))
}

/// A planner block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display time, sorted lexicographically (`08:30`, `13:00`)
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub title: String,
}

impl PlannerBlock {
    pub fn new(time: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            time: time.into(),
            title: title.into(),
        }
    }
}

/// A longer-term goal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Progress percentage (0-100)
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: f64,
}

fn lenient_progress<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = lenient_number(deserializer)?;
    Ok(value.unwrap_or(0.0).clamp(0.0, 100.0))
}

/// The read-only set of records passed into one engine evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub focus_sessions: Vec<FocusSession>,
    #[serde(default)]
    pub moods: Vec<MoodEntry>,
    #[serde(default)]
    pub planner: Vec<PlannerBlock>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Snapshot {
    /// True when no collection holds any record
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.focus_sessions.is_empty()
            && self.moods.is_empty()
            && self.planner.is_empty()
            && self.goals.is_empty()
    }

    /// Planner blocks in display order
    pub fn planner_sorted(&self) -> Vec<&PlannerBlock> {
        let mut blocks: Vec<&PlannerBlock> = self.planner.iter().collect();
        blocks.sort_by(|a, b| a.time.cmp(&b.time));
        blocks
    }
}
