//! Rule-based narrative generation
//!
//! Each text is assembled from independently triggered clauses in a fixed
//! order. Clause thresholds and order are stable; the wording may change.

use crate::metrics::classify::Signals;
use crate::metrics::types::{
    Aggregates, AlertSeverity, Classification, Narrative, Scores, SystemAlert, Timeline,
};
use crate::profile::{BehavioralProfile, ProfileKey};
use crate::types::{Priority, Snapshot};

/// Narrative generator
pub struct NarrativeBuilder;

impl NarrativeBuilder {
    pub fn build(
        snapshot: &Snapshot,
        profile: &BehavioralProfile,
        aggregates: &Aggregates,
        scores: &Scores,
        classification: &Classification,
    ) -> Narrative {
        let mut signals = Signals::new(aggregates, scores);
        signals.recovery = classification.recovery.score;

        Narrative {
            brain: brain_text(&signals, profile),
            forecast: forecast_text(&signals, profile),
            alerts: system_alerts(&signals, profile.key),
            insights: quick_insights(snapshot),
            timeline: timeline(aggregates),
        }
    }
}

fn profile_flavor(key: ProfileKey) -> &'static str {
    match key {
        ProfileKey::Shadows => {
            "As a Shadows profile, your system is biased toward deep-focus intervals and quieter environments."
        }
        ProfileKey::Speedsters => {
            "As a Speedsters profile, your system thrives on quick bursts and high-momentum task switching."
        }
        ProfileKey::Engineers => {
            "As an Engineers profile, your system leans toward structured plans and consistent execution."
        }
        ProfileKey::Hipsters => {
            "As a Hipsters profile, your system operates in creative waves. Mood and environment shape output."
        }
    }
}

/// Behavioral summary: profile, focus, completion, mood, streak
pub fn brain_text(s: &Signals, profile: &BehavioralProfile) -> String {
    if s.total_tasks == 0 && s.focus_minutes == 0 && s.mood == 0 {
        return format!(
            "MindFlow Neural Core is online. Once you start logging tasks, focus sessions, and moods, \
             it will build a behavioral model tuned to the {} profile.",
            profile.key
        );
    }

    let mut parts: Vec<String> = vec![profile_flavor(profile.key).to_string()];

    let focus = if s.focus_minutes > 150 {
        "Your deep-focus volume is in a high-performance bracket. Protect this capacity by aggressively limiting context switches during peak windows."
    } else if s.focus_minutes > 60 {
        "You are building a consistent focus habit. Two well-protected blocks per day will compound this quickly."
    } else {
        "Focus volume is still light. A single non-negotiable 25-minute block daily is enough to shift the trajectory."
    };
    parts.push(focus.to_string());

    if s.total_tasks > 0 {
        let completion = if s.completion_rate >= 80 {
            "Your task conversion rate is strong. You reliably finish what you load into the system."
        } else if s.completion_rate >= 50 {
            "You convert around half your tasks. Tightening your daily scope will increase completion without increasing hours."
        } else {
            "Your backlog is dense compared to what you actually finish. A quick archive pass will reduce cognitive drag."
        };
        parts.push(completion.to_string());
    }

    if s.mood > 0 {
        let mood = if s.mood >= 80 {
            "Mood regulation is strongly supportive of high performance. You have room to increase challenge if desired."
        } else if s.mood >= 60 {
            "Mood is broadly stable with normal fluctuations. Intentional micro-breaks will keep it inside a healthy band."
        } else {
            "Mood signals indicate cognitive load or fatigue. Placing recovery blocks is now performance-critical, not optional."
        };
        parts.push(mood.to_string());
    }

    if s.streak >= 3 {
        parts.push(format!(
            "Underlying streak stability is visible: {} days of consistent engagement. This is how identity-level change actually forms.",
            s.streak
        ));
    }

    parts.join(" ")
}

/// Projected score never leaves 40..=98
pub fn projected_score(productivity: u32) -> u32 {
    (productivity + 5).clamp(40, 98)
}

/// Next-day forecast paragraph
pub fn forecast_text(s: &Signals, profile: &BehavioralProfile) -> String {
    if s.total_tasks == 0 && s.focus_minutes == 0 {
        return "After two or three active days, the Neural Core will start forecasting your best \
                focus windows and where to place recovery blocks, tuned to your profile."
            .to_string();
    }

    let mut parts = vec![
        format!(
            "Tomorrow's projected performance score is trending around {} / 100 for a {} profile.",
            projected_score(s.productivity),
            profile.key
        ),
        format!(
            "The highest-yield focus window for you is likely around {}. Treat this as a protected deep-work slot.",
            profile.suggested_block
        ),
    ];

    if s.mood > 0 {
        let trend = if s.mood >= 80 {
            "elevated"
        } else if s.mood < 60 {
            "under pressure"
        } else {
            "stable"
        };
        parts.push(format!(
            "Mood trend is currently {trend}. One planned micro-break in the late afternoon will stabilize the curve."
        ));
    }

    if s.raw_planner_load > 6 {
        parts.push(
            "Your planner density is high. Consider moving non-essential items into a separate backlog so today's lane stays clean."
                .to_string(),
        );
    }

    parts.join(" ")
}

fn alert(severity: AlertSeverity, title: &str, body: impl Into<String>) -> SystemAlert {
    SystemAlert {
        severity,
        title: title.to_string(),
        body: body.into(),
    }
}

fn profile_alert(s: &Signals, key: ProfileKey) -> Option<SystemAlert> {
    match key {
        ProfileKey::Shadows if s.focus_minutes > 160 && s.mood > 0 && s.mood < 60 => Some(alert(
            AlertSeverity::Critical,
            "Shadow deep-focus overload",
            "You're running heavy deep-work hours with a low mood index. This combination is powerful short term but unsustainable without real recovery.",
        )),
        ProfileKey::Speedsters if s.total_tasks > 10 && s.completion_rate < 50 => Some(alert(
            AlertSeverity::High,
            "Speedster task-switch spike",
            "Your task volume is high and completion rate is lagging. Consolidate tasks into fewer, bigger moves to avoid fragmentation.",
        )),
        ProfileKey::Engineers if s.raw_planner_load > 10 => Some(alert(
            AlertSeverity::High,
            "Engineer over-planning loop",
            "Planner density suggests you might be over-structuring. Ship a few imperfect tasks to restore momentum.",
        )),
        ProfileKey::Hipsters if s.mood > 0 && s.mood < 55 => Some(alert(
            AlertSeverity::High,
            "Hipster creative fatigue pattern",
            "Mood signals show creative fatigue. Inject one genuinely enjoyable, low-pressure block into your day.",
        )),
        _ => None,
    }
}

/// Ordered system alerts; never empty
pub fn system_alerts(s: &Signals, key: ProfileKey) -> Vec<SystemAlert> {
    let mut alerts: Vec<SystemAlert> = profile_alert(s, key).into_iter().collect();

    if s.completion_rate < 50 && s.total_tasks > 6 {
        alerts.push(alert(
            AlertSeverity::High,
            "Backlog overload",
            "Your completion rate is not keeping up with what you add. Reduce the visible list to a maximum of 5 live tasks.",
        ));
    }

    let has_critical = alerts.iter().any(|a| a.severity == AlertSeverity::Critical);
    if s.focus_minutes > 150 && s.mood > 0 && s.mood < 60 && !has_critical {
        alerts.push(alert(
            AlertSeverity::Critical,
            "Performance–mood mismatch",
            "You are pushing significant focus hours with a strained mood index. This is a classic pre-burnout signature. Recovery time is strategic, not optional.",
        ));
    }

    if s.streak >= 5 {
        alerts.push(alert(
            AlertSeverity::Positive,
            "Streak momentum online",
            format!(
                "You've maintained activity for {} days. On low-energy days, even a tiny action keeps this loop intact.",
                s.streak
            ),
        ));
    }

    if alerts.is_empty() {
        alerts.push(alert(
            AlertSeverity::Normal,
            "System stable",
            "Your current patterns are balanced. Use this stability to experiment with slightly more ambitious deep-work blocks.",
        ));
    }

    alerts
}

/// Goal progress below which a goal counts as stalled
const STALLED_GOAL_PROGRESS: f64 = 40.0;

/// Short actionable suggestions from tasks, goals and planner
pub fn quick_insights(snapshot: &Snapshot) -> Vec<String> {
    let mut insights = Vec::new();

    let open_high = snapshot
        .tasks
        .iter()
        .filter(|t| t.priority == Priority::High && !t.completed)
        .count();
    if open_high > 0 {
        let plural = if open_high > 1 { "s" } else { "" };
        insights.push(format!(
            "Start with {open_high} high-priority task{plural} to unlock momentum."
        ));
    }

    if snapshot
        .goals
        .iter()
        .any(|g| g.progress < STALLED_GOAL_PROGRESS)
    {
        insights.push("Pick one goal under 40% and attach a Planner block for it today.".to_string());
    }

    if !snapshot.planner.is_empty() && !snapshot.tasks.is_empty() {
        insights.push("Assign at least one important task to each morning block.".to_string());
    }

    if insights.is_empty() {
        insights.push(
            "Your system looks stable. Use Goals and Planner to stretch just a little more.".to_string(),
        );
    }

    insights
}

/// Weekly identity snapshot built from peaks, streaks and dips
pub fn timeline(agg: &Aggregates) -> Timeline {
    if agg.total_tasks == 0 && agg.total_focus_minutes == 0 && agg.current_streak == 0 {
        return Timeline {
            title: "Behavior snapshot initializing…".to_string(),
            body: "As you log more focus, mood, and planner data, MindFlow will build a monthly identity snapshot."
                .to_string(),
        };
    }

    let best_focus = match &agg.best_focus_day {
        Some(day) => format!(
            "Best focus pulse this week: {} min on {}.",
            day.focus_minutes, day.weekday
        ),
        None => "No clear best focus day yet. Your curve is still forming.".to_string(),
    };

    let streak_line = if agg.current_streak > 0 {
        format!(
            "Active streak: {} days · All-time longest: {} days.",
            agg.current_streak, agg.longest_streak
        )
    } else {
        format!("All-time longest streak so far: {} days.", agg.longest_streak)
    };

    let lowest_mood = match agg.lowest_mood.as_ref().and_then(|m| m.date.map(|d| (m.score, d))) {
        Some((score, date)) => format!(
            "Lowest mood signal: {} on {}.",
            crate::metrics::round_half_up(score),
            date.format("%d %b")
        ),
        None => "Mood curve is still being mapped.".to_string(),
    };

    Timeline {
        title: "Month DNA Snapshot: Who were you this week?".to_string(),
        body: format!(
            "{best_focus} {streak_line} {lowest_mood} Your system is rendering a personal timeline of peaks, dips, and recovery loops."
        ),
    }
}
