//! Productivity metrics engine
//!
//! Turns a [`Snapshot`] of tasks, focus sessions, moods and planner blocks into
//! a [`MetricsReport`]. The engine is a pure function of the snapshot, the
//! selected profile and "now": it never reads a clock, a store or a global.
//!
//! Stages:
//! 1. [`ActivityAggregator`] - counts, totals, streaks, mood, weekly curve
//! 2. [`ScoreDeriver`] - productivity score, XP/level, champion score
//! 3. [`Classifier`] - habit signature, recovery, burnout, identity rank
//! 4. [`NarrativeBuilder`] - brain text, forecast, alerts, insights, timeline

pub mod aggregate;
pub mod classify;
pub mod narrative;
pub mod scoring;
pub mod types;

pub use aggregate::ActivityAggregator;
pub use classify::{first_match, Classifier, DecisionList, Signals};
pub use narrative::NarrativeBuilder;
pub use scoring::{ScoreDeriver, LEVEL_BANDS};
pub use types::*;

use crate::config::EngineOptions;
use crate::profile::BehavioralProfile;
use crate::types::Snapshot;
use chrono::{DateTime, FixedOffset};

/// Round half away from zero for non-negative values (`2.5 -> 3`)
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Compute the full report with default engine options
pub fn compute_report(
    snapshot: &Snapshot,
    profile: &BehavioralProfile,
    now: DateTime<FixedOffset>,
) -> MetricsReport {
    compute_report_with(snapshot, profile, now, &EngineOptions::default())
}

/// Compute the full report
pub fn compute_report_with(
    snapshot: &Snapshot,
    profile: &BehavioralProfile,
    now: DateTime<FixedOffset>,
    options: &EngineOptions,
) -> MetricsReport {
    let aggregates = ActivityAggregator::aggregate(snapshot, profile, now, options);
    let scores = ScoreDeriver::derive(&aggregates, snapshot, profile);
    let classification = Classifier::classify(&aggregates, &scores);
    let narrative =
        NarrativeBuilder::build(snapshot, profile, &aggregates, &scores, &classification);

    MetricsReport {
        profile: profile.key,
        aggregates,
        scores,
        classification,
        narrative,
    }
}
