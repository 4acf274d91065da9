//! Qualitative classification
//!
//! Habit signature, recovery, burnout risk, forecast hints and identity rank.
//! Every multi-way choice here is an ordered `(predicate, result)` list walked
//! top to bottom; the first predicate that holds decides. Conditions overlap,
//! so the order of each list is part of its meaning.

use crate::metrics::types::{
    Aggregates, BurnoutRisk, Classification, FutureWindow, HabitSignature, IdentityRank,
    Recovery, RecoveryLabel, Scores,
};

/// Ordered decision list
pub type DecisionList<I, T> = [(fn(&I) -> bool, T)];

/// Result of the first rule whose predicate holds, or `default`
pub fn first_match<I, T: Copy>(rules: &DecisionList<I, T>, inputs: &I, default: T) -> T {
    rules
        .iter()
        .find(|(predicate, _)| predicate(inputs))
        .map(|(_, result)| *result)
        .unwrap_or(default)
}

/// The metrics every classification rule reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub total_tasks: u32,
    pub focus_minutes: u32,
    pub completion_rate: u32,
    /// 0 means nothing was logged
    pub mood: u32,
    pub streak: u32,
    pub raw_planner_load: u32,
    pub productivity: u32,
    pub champion: u32,
    pub recovery: u32,
}

impl Signals {
    pub fn new(aggregates: &Aggregates, scores: &Scores) -> Self {
        Self {
            total_tasks: aggregates.total_tasks,
            focus_minutes: aggregates.total_focus_minutes,
            completion_rate: aggregates.completion_rate,
            mood: aggregates.mood_score,
            streak: aggregates.current_streak,
            raw_planner_load: aggregates.raw_planner_load,
            productivity: scores.productivity_score,
            champion: scores.champion.score,
            recovery: 0,
        }
    }

    /// Mood was logged and sits strictly below `limit`
    fn mood_below(&self, limit: u32) -> bool {
        self.mood > 0 && self.mood < limit
    }
}

/// Classifier over aggregates and scores
pub struct Classifier;

impl Classifier {
    pub fn classify(aggregates: &Aggregates, scores: &Scores) -> Classification {
        let mut signals = Signals::new(aggregates, scores);
        let recovery = compute_recovery(&signals);
        signals.recovery = recovery.score;

        let habit_signature = compute_habit_signature(&signals);
        let forecast = compute_future_window(&signals, aggregates);
        let identity_rank = compute_identity_rank(&signals);

        Classification {
            habit_signature,
            recovery,
            forecast,
            identity_rank,
        }
    }
}

// ---------------------------------------------------------------------------
// Habit signature
// ---------------------------------------------------------------------------

fn focus_band(s: &Signals) -> u8 {
    match s.focus_minutes {
        m if m >= 160 => 3,
        m if m >= 70 => 2,
        _ => 1,
    }
}

fn mood_band(s: &Signals) -> u8 {
    if s.mood >= 80 {
        3
    } else if s.mood_below(55) {
        1
    } else {
        2
    }
}

fn streak_band(s: &Signals) -> u8 {
    match s.streak {
        d if d >= 7 => 3,
        d if d >= 3 => 2,
        _ => 1,
    }
}

fn planner_band(s: &Signals) -> u8 {
    if s.raw_planner_load <= 3 && s.completion_rate >= 75 {
        3
    } else if s.raw_planner_load > 8 && s.completion_rate < 55 {
        1
    } else {
        2
    }
}

/// Descriptor shown before there is anything to describe
pub const CALIBRATING_DESCRIPTOR: &str = "Calibrating Habit DNA…";

fn band_phrase(band: u8, phrases: [&'static str; 3]) -> &'static str {
    match band {
        3 => phrases[0],
        2 => phrases[1],
        _ => phrases[2],
    }
}

fn compute_habit_signature(s: &Signals) -> HabitSignature {
    let (f, m, st, p) = (focus_band(s), mood_band(s), streak_band(s), planner_band(s));
    let code = format!("F{f} – M{m} – S{st} – P{p}");

    let descriptor = if s.total_tasks == 0 && s.focus_minutes == 0 {
        CALIBRATING_DESCRIPTOR.to_string()
    } else {
        [
            band_phrase(
                f,
                ["high-focus operator", "steady-focus builder", "emerging focus profile"],
            ),
            band_phrase(
                m,
                ["elevated mood baseline", "stable mood baseline", "mood under strain"],
            ),
            band_phrase(
                st,
                [
                    "identity-level streaks",
                    "growing streak discipline",
                    "streaks still forming",
                ],
            ),
            band_phrase(
                p,
                [
                    "elite planning discipline",
                    "balanced planning",
                    "planner overload risk",
                ],
            ),
        ]
        .join(" · ")
    };

    HabitSignature {
        focus_band: f,
        mood_band: m,
        streak_band: st,
        planner_band: p,
        code,
        descriptor,
    }
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

const RECOVERY_BASE: i32 = 70;

/// Additive recovery adjustments; every matching rule applies
const RECOVERY_ADJUSTMENTS: &[(fn(&Signals) -> bool, i32)] = &[
    (|s: &Signals| s.focus_minutes > 180, -15),
    (|s: &Signals| s.focus_minutes > 240, -10),
    (|s: &Signals| s.mood_below(55), -20),
    (|s: &Signals| s.mood >= 80, 10),
    (|s: &Signals| s.raw_planner_load > 8, -10),
    (|s: &Signals| s.raw_planner_load <= 4, 5),
];

fn recharged(score: &u32) -> bool {
    *score >= 80
}

fn under_recovered(score: &u32) -> bool {
    *score < 55
}

const RECOVERY_LABELS: &DecisionList<u32, RecoveryLabel> = &[
    (recharged, RecoveryLabel::Recharged),
    (under_recovered, RecoveryLabel::UnderRecovered),
];

fn recovery_suggestion(label: RecoveryLabel) -> &'static str {
    match label {
        RecoveryLabel::Recharged => {
            "You have enough recovery capital. You can safely schedule one ambitious deep-work block tomorrow."
        }
        RecoveryLabel::UnderRecovered => {
            "Inject a 10–15 minute active reset (walk, stretch, light breathing) before loading more tasks."
        }
        RecoveryLabel::Balanced => {
            "Protect one short reset block before the next big focus window."
        }
    }
}

/// Recovery score from the base plus adjustments, clamped to 0-100
pub fn recovery_score(s: &Signals) -> u32 {
    let score = RECOVERY_ADJUSTMENTS
        .iter()
        .filter(|(applies, _)| applies(s))
        .fold(RECOVERY_BASE, |acc, (_, delta)| acc + delta);
    score.clamp(0, 100) as u32
}

fn compute_recovery(s: &Signals) -> Recovery {
    let score = recovery_score(s);
    let label = first_match(RECOVERY_LABELS, &score, RecoveryLabel::Balanced);

    Recovery {
        score,
        label,
        suggestion: recovery_suggestion(label).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Burnout and forecast window
// ---------------------------------------------------------------------------

fn burnout_high(s: &Signals) -> bool {
    s.focus_minutes > 260 && s.mood_below(55)
}

fn burnout_medium(s: &Signals) -> bool {
    s.focus_minutes > 200 && s.mood_below(60)
}

const BURNOUT_LADDER: &DecisionList<Signals, BurnoutRisk> = &[
    (burnout_high, BurnoutRisk::High),
    (burnout_medium, BurnoutRisk::Medium),
];

pub fn burnout_risk(s: &Signals) -> BurnoutRisk {
    first_match(BURNOUT_LADDER, s, BurnoutRisk::Low)
}

fn compute_future_window(s: &Signals, aggregates: &Aggregates) -> FutureWindow {
    let best_deep_work_hint = match &aggregates.best_focus_day {
        Some(day) => format!(
            "Next 3 deep-work windows should mirror your strongest pattern: {} focus style.",
            day.weekday
        ),
        None => "Align deep work with your best focus day.".to_string(),
    };

    let mood_prediction = if s.mood >= 80 {
        "Mood curve is elevated. Ideal moment to push one ambitious block."
    } else if s.mood_below(60) {
        "Mood curve shows pressure. One micro-reset per block will prevent a dip."
    } else {
        "Mood will likely stay stable with light oscillations."
    };

    let consistency_prediction = match s.streak {
        d if d >= 7 => {
            "Your streak engine is strong. Even a 5-minute action on hard days preserves identity-level consistency."
        }
        0 => "No active streak yet. One action per day this week is enough to boot the system.",
        _ => "Your consistency is forming. Tiny daily actions will lock it in.",
    };

    let overload_hint = if s.raw_planner_load > 10 {
        "Planner overload detected. Cap visible tasks at 5–7 to avoid cognitive drag."
    } else {
        "Planner load is within a healthy band. Keep capture simple and the visible list short."
    };

    FutureWindow {
        burnout_risk: burnout_risk(s),
        best_deep_work_hint,
        mood_prediction: mood_prediction.to_string(),
        consistency_prediction: consistency_prediction.to_string(),
        overload_hint: overload_hint.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Identity rank
// ---------------------------------------------------------------------------

fn is_executor(s: &Signals) -> bool {
    s.champion >= 80 && s.streak >= 7
}

fn is_builder(s: &Signals) -> bool {
    s.raw_planner_load >= 6 && s.completion_rate >= 70
}

fn is_stabilizer(s: &Signals) -> bool {
    s.streak >= 5 && (s.mood == 0 || s.mood >= 60)
}

fn is_creative(s: &Signals) -> bool {
    s.mood >= 80
}

fn is_strategist(s: &Signals) -> bool {
    s.raw_planner_load >= 4 && s.completion_rate >= 65
}

fn is_pusher(s: &Signals) -> bool {
    s.focus_minutes >= 200 && s.mood_below(60)
}

fn is_recoverer(s: &Signals) -> bool {
    s.recovery >= 70 && s.productivity < 60
}

/// Identity rank rules, first match wins
pub const IDENTITY_RULES: &DecisionList<Signals, IdentityRank> = &[
    (is_executor, IdentityRank::Executor),
    (is_builder, IdentityRank::Builder),
    (is_stabilizer, IdentityRank::Stabilizer),
    (is_creative, IdentityRank::Creative),
    (is_strategist, IdentityRank::Strategist),
    (is_pusher, IdentityRank::Pusher),
    (is_recoverer, IdentityRank::Recoverer),
];

pub fn compute_identity_rank(s: &Signals) -> IdentityRank {
    first_match(IDENTITY_RULES, s, IdentityRank::Stabilizer)
}
