//! Metrics data types
//!
//! Each engine stage produces one of these structs; `MetricsReport` flattens
//! them into the single record handed back to the presentation layer.

use crate::profile::ProfileKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single mood reading resolved to its 0-100 base score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Base score before the profile weight
    pub score: f64,
    /// Local calendar day of the entry (today when it had no usable date)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Focus minutes for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocus {
    pub date: NaiveDate,
    /// Short weekday label (`Mon`)
    pub weekday: String,
    pub focus_minutes: u32,
}

/// Raw aggregates over the snapshot (tasks, focus, streaks, mood, planner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    // Tasks
    pub total_tasks: u32,
    pub completed_tasks: u32,
    /// Tasks completed on the local "today"
    pub completed_today: u32,
    /// Completed share of all tasks (0-100)
    pub completion_rate: u32,

    // Focus
    pub focus_session_count: u32,
    /// Sum of session durations before the profile multiplier
    pub total_focus_seconds_raw: f64,
    /// Sum of session durations after the profile multiplier
    pub total_focus_seconds: f64,
    pub total_focus_minutes: u32,
    pub avg_daily_focus: u32,
    /// Raw focus minutes recorded today
    pub today_focus_minutes: u32,
    pub today_session_count: u32,
    /// Longest single session in raw minutes
    pub longest_session_minutes: u32,

    // Streaks
    /// Canonical streak (unscaled), anchored at today
    pub current_streak: u32,
    /// Streak scaled by the profile for display only
    pub display_streak: u32,
    /// Longest run of active days within the lookback window
    pub longest_streak: u32,

    // Mood
    pub mood_entry_count: u32,
    /// Weighted mood average (0-100), 0 when nothing was logged
    pub mood_score: u32,
    /// Most recent mood entry
    pub current_mood: Option<MoodReading>,
    /// Lowest mood entry
    pub lowest_mood: Option<MoodReading>,

    // Weekly curve
    /// Focus minutes per day, oldest first
    pub weekly_focus: Vec<DailyFocus>,
    pub best_focus_day: Option<DailyFocus>,
    /// Chart ceiling (at least 30 minutes)
    pub weekly_focus_max: u32,

    // Planner
    pub raw_planner_load: u32,
    /// Planner load after the planning sensitivity
    pub planner_load: u32,
}

/// Experience points and the level band they fall into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpLevel {
    pub xp: u32,
    pub level: u8,
    pub label: String,
    pub band_min: u32,
    pub band_max: u32,
    /// Position inside the band (0.0-1.0)
    pub progress: f64,
}

/// Conjunctive "champion" composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionScore {
    pub focus_factor: f64,
    pub consistency_factor: f64,
    pub balance_factor: f64,
    pub flow_factor: f64,
    /// Product of the factors scaled to 0-100
    pub score: u32,
}

/// Composite scores derived from aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// Productivity score (0-100)
    pub productivity_score: u32,
    pub xp: XpLevel,
    pub champion: ChampionScore,
}

/// Four-axis banded habit classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSignature {
    pub focus_band: u8,
    pub mood_band: u8,
    pub streak_band: u8,
    pub planner_band: u8,
    /// `F3 – M2 – S1 – P2`
    pub code: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryLabel {
    Recharged,
    Balanced,
    #[serde(rename = "Under-recovered")]
    UnderRecovered,
}

impl RecoveryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryLabel::Recharged => "Recharged",
            RecoveryLabel::Balanced => "Balanced",
            RecoveryLabel::UnderRecovered => "Under-recovered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recovery {
    /// Recovery score (0-100)
    pub score: u32,
    pub label: RecoveryLabel,
    pub suggestion: String,
}

/// Burnout risk, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnoutRisk {
    Low,
    Medium,
    High,
}

/// Short-horizon forecast hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureWindow {
    pub burnout_risk: BurnoutRisk,
    pub best_deep_work_hint: String,
    pub mood_prediction: String,
    pub consistency_prediction: String,
    pub overload_hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityRank {
    Executor,
    Builder,
    Stabilizer,
    Creative,
    Strategist,
    Pusher,
    Recoverer,
}

/// Qualitative classification of the aggregates and scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub habit_signature: HabitSignature,
    pub recovery: Recovery,
    pub forecast: FutureWindow,
    pub identity_rank: IdentityRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Positive,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAlert {
    pub severity: AlertSeverity,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub title: String,
    pub body: String,
}

/// Rule-based text generated from the metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    /// Clause-by-clause behavioral summary
    pub brain: String,
    /// Next-day forecast paragraph
    pub forecast: String,
    pub alerts: Vec<SystemAlert>,
    /// Short actionable suggestions from tasks, goals and planner
    pub insights: Vec<String>,
    pub timeline: Timeline,
}

/// Everything the engine derives from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub profile: ProfileKey,
    #[serde(flatten)]
    pub aggregates: Aggregates,
    #[serde(flatten)]
    pub scores: Scores,
    #[serde(flatten)]
    pub classification: Classification,
    pub narrative: Narrative,
}
