//! Composite scoring, XP and leveling

use crate::metrics::round_half_up;
use crate::metrics::types::{Aggregates, ChampionScore, Scores, XpLevel};
use crate::profile::BehavioralProfile;
use crate::types::Snapshot;

/// Mood value assumed when nothing was logged, so absence is not a penalty
pub const NEUTRAL_MOOD: f64 = 60.0;

/// Level bands as `(level, label, band_min, band_max)`; bands are closed-open
/// and the last band's max only bounds the progress bar.
pub const LEVEL_BANDS: [(u8, &str, u32, u32); 5] = [
    (1, "Apprentice", 0, 60),
    (2, "Stable Loop", 60, 150),
    (3, "Flow Architect", 150, 260),
    (4, "Neural Operator", 260, 400),
    (5, "Plasma Master", 400, 600),
];

// XP weights per counted record
const XP_PER_COMPLETED_TASK: u32 = 2;
const XP_PER_FOCUS_SESSION: u32 = 5;
const XP_PER_MOOD_ENTRY: u32 = 1;
const XP_PER_STREAK_DAY: u32 = 3;
const XP_PER_PLANNER_BLOCK: u32 = 1;

/// Derives scores from aggregates
pub struct ScoreDeriver;

impl ScoreDeriver {
    pub fn derive(
        aggregates: &Aggregates,
        snapshot: &Snapshot,
        profile: &BehavioralProfile,
    ) -> Scores {
        let productivity_score = compute_productivity(aggregates, profile);
        let xp = XpLevel::from_xp(compute_xp(aggregates, snapshot));
        let champion = compute_champion(aggregates);

        Scores {
            productivity_score,
            xp,
            champion,
        }
    }
}

/// The mood value used by composites: the score, or neutral when unlogged
pub(crate) fn effective_mood(mood_score: u32) -> f64 {
    if mood_score == 0 {
        NEUTRAL_MOOD
    } else {
        mood_score as f64
    }
}

/// Focus (capped at 40) + completion (up to 30) + weighted mood, clamped to 0-100
fn compute_productivity(agg: &Aggregates, profile: &BehavioralProfile) -> u32 {
    let focus_points = (agg.total_focus_minutes as f64 / 2.0).min(40.0);
    let completion_points = agg.completion_rate as f64 * 0.3;
    let mood_points = effective_mood(agg.mood_score) * 0.3 * profile.mood_weight;

    let score = round_half_up((focus_points + completion_points + mood_points).min(100.0));
    score.clamp(0.0, 100.0) as u32
}

fn compute_xp(agg: &Aggregates, snapshot: &Snapshot) -> u32 {
    let planner_blocks = snapshot.planner.len() as u32;

    XP_PER_COMPLETED_TASK
        .saturating_mul(agg.completed_tasks)
        .saturating_add(XP_PER_FOCUS_SESSION.saturating_mul(agg.focus_session_count))
        .saturating_add(XP_PER_MOOD_ENTRY.saturating_mul(agg.mood_entry_count))
        .saturating_add(XP_PER_STREAK_DAY.saturating_mul(agg.current_streak))
        .saturating_add(XP_PER_PLANNER_BLOCK.saturating_mul(planner_blocks))
}

impl XpLevel {
    /// Place an XP total in its level band (highest qualifying band wins)
    pub fn from_xp(xp: u32) -> Self {
        let (level, label, band_min, band_max) = LEVEL_BANDS
            .iter()
            .rev()
            .find(|(_, _, min, _)| xp >= *min)
            .copied()
            .unwrap_or(LEVEL_BANDS[0]);

        let span = band_max.saturating_sub(band_min).max(1) as f64;
        let progress = ((xp as f64 - band_min as f64) / span).clamp(0.0, 1.0);

        XpLevel {
            xp,
            level,
            label: label.to_string(),
            band_min,
            band_max,
            progress,
        }
    }
}

/// Conjunctive composite: any weak factor suppresses the whole score
fn compute_champion(agg: &Aggregates) -> ChampionScore {
    let focus_factor = (agg.total_focus_minutes as f64 / 200.0).clamp(0.0, 1.0);
    let consistency_factor = (agg.current_streak as f64 / 10.0).clamp(0.0, 1.0);
    let balance_factor =
        (1.0 - (agg.raw_planner_load as f64 - 6.0).abs() / 10.0).clamp(0.0, 1.0);
    let flow_factor = (effective_mood(agg.mood_score) / 100.0).clamp(0.0, 1.0);

    let product = focus_factor * consistency_factor * balance_factor * flow_factor;
    let score = round_half_up(product * 100.0).clamp(0.0, 100.0) as u32;

    ChampionScore {
        focus_factor,
        consistency_factor,
        balance_factor,
        flow_factor,
        score,
    }
}
