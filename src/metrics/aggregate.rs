//! Record aggregation and streak computation
//!
//! Reduces the snapshot collections to counts, totals, streaks, a mood index,
//! the weekly focus curve and planner load. Every figure has a defined value
//! for empty input; nothing here divides by a count without checking it.

use crate::config::EngineOptions;
use crate::metrics::round_half_up;
use crate::metrics::types::{Aggregates, DailyFocus, MoodReading};
use crate::profile::BehavioralProfile;
use crate::time::{weekday_label, RecordTime};
use crate::types::{MoodEntry, Snapshot};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use std::collections::BTreeSet;

/// Base score for mood labels that are not in the table
const DEFAULT_MOOD_SCORE: f64 = 60.0;

/// Minimum ceiling of the weekly focus chart, in minutes
const MIN_WEEKLY_CHART_MAX: u32 = 30;

/// Aggregator for snapshot records
pub struct ActivityAggregator;

impl ActivityAggregator {
    /// Aggregate a snapshot as seen at `now` under `profile`
    pub fn aggregate(
        snapshot: &Snapshot,
        profile: &BehavioralProfile,
        now: DateTime<FixedOffset>,
        options: &EngineOptions,
    ) -> Aggregates {
        let offset = *now.offset();
        let today = now.date_naive();
        let options = options.clamped();

        // Tasks
        let total_tasks = snapshot.tasks.len() as u32;
        let completed_tasks = snapshot.tasks.iter().filter(|t| t.completed).count() as u32;
        let completion_rate = compute_completion_rate(completed_tasks, total_tasks);
        let completed_today = snapshot
            .tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.completed_at)
            .filter(|at| at.local_day(&offset) == today)
            .count() as u32;

        // Focus
        let total_focus_seconds_raw = finite_sum(snapshot.focus_sessions.iter().map(|s| s.duration_seconds));
        let total_focus_seconds = (total_focus_seconds_raw * profile.focus_multiplier).min(f64::MAX);
        let total_focus_minutes = to_count(round_half_up(total_focus_seconds / 60.0));
        let avg_daily_focus = to_count(round_half_up(
            total_focus_minutes as f64 / options.week_days.max(1) as f64,
        ));

        let todays_sessions: Vec<f64> = snapshot
            .focus_sessions
            .iter()
            .filter(|s| s.date.map(|d| d.local_day(&offset)) == Some(today))
            .map(|s| s.duration_seconds)
            .collect();
        let today_focus_minutes =
            to_count(round_half_up(finite_sum(todays_sessions.iter().copied()) / 60.0));
        let longest_session_minutes = to_count(round_half_up(
            snapshot
                .focus_sessions
                .iter()
                .map(|s| s.duration_seconds)
                .fold(0.0, f64::max)
                / 60.0,
        ));

        // Streaks
        let activity = collect_activity_days(snapshot, &offset, today);
        let (current_streak, longest_streak) =
            compute_streaks(&activity, today, options.lookback_days);
        let display_streak =
            to_count(round_half_up(current_streak as f64 * profile.streak_focus_bias));

        // Mood
        let mood_score = compute_mood_score(&snapshot.moods, profile.mood_weight);
        let current_mood = most_recent_mood(&snapshot.moods, &offset, today);
        let lowest_mood = lowest_mood(&snapshot.moods, &offset, today);

        // Weekly curve
        let weekly_focus = compute_weekly_focus(snapshot, &offset, today, options.week_days);
        let best_focus_day = best_focus_day(&weekly_focus);
        let weekly_focus_max = weekly_focus
            .iter()
            .map(|d| d.focus_minutes)
            .fold(MIN_WEEKLY_CHART_MAX, u32::max);

        // Planner
        let raw_planner_load = snapshot.planner.len() as u32;
        let planner_load =
            to_count(round_half_up(raw_planner_load as f64 * profile.planning_sensitivity));

        Aggregates {
            total_tasks,
            completed_tasks,
            completed_today,
            completion_rate,
            focus_session_count: snapshot.focus_sessions.len() as u32,
            total_focus_seconds_raw,
            total_focus_seconds,
            total_focus_minutes,
            avg_daily_focus,
            today_focus_minutes,
            today_session_count: todays_sessions.len() as u32,
            longest_session_minutes,
            current_streak,
            display_streak,
            longest_streak,
            mood_entry_count: snapshot.moods.len() as u32,
            mood_score,
            current_mood,
            lowest_mood,
            weekly_focus,
            best_focus_day,
            weekly_focus_max,
            raw_planner_load,
            planner_load,
        }
    }
}

/// Convert a rounded, possibly out-of-range float into a count, saturating at `u32::MAX`
fn to_count(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.min(u32::MAX as f64) as u32
    }
}

/// Sum of durations, saturating at `f64::MAX` instead of overflowing to infinity
fn finite_sum(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| (acc + v).min(f64::MAX))
}

/// Completion rate in percent, 0 when there are no tasks
fn compute_completion_rate(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    to_count(round_half_up(completed as f64 / total as f64 * 100.0))
}

/// Local calendar days on which any task, focus session or mood was recorded.
///
/// Records without a usable timestamp count as activity today.
fn collect_activity_days(
    snapshot: &Snapshot,
    offset: &FixedOffset,
    today: NaiveDate,
) -> BTreeSet<NaiveDate> {
    let day_of = |t: Option<RecordTime>| t.map(|t| t.local_day(offset)).unwrap_or(today);

    let tasks = snapshot.tasks.iter().map(|t| day_of(t.activity_time()));
    let sessions = snapshot.focus_sessions.iter().map(|s| day_of(s.date));
    let moods = snapshot.moods.iter().map(|m| day_of(m.date));

    tasks.chain(sessions).chain(moods).collect()
}

/// Walk backward from today over the lookback window.
///
/// Returns `(current, longest)`. The current streak only counts an unbroken
/// run that includes today; the longest streak is the best run anywhere in
/// the window.
fn compute_streaks(
    activity: &BTreeSet<NaiveDate>,
    today: NaiveDate,
    lookback_days: u32,
) -> (u32, u32) {
    let mut current = 0;
    let mut current_open = true;
    let mut longest = 0;
    let mut run = 0;

    for i in 0..lookback_days {
        let Some(day) = today.checked_sub_days(Days::new(i as u64)) else {
            break;
        };
        let active = activity.contains(&day);

        if active {
            run += 1;
            longest = longest.max(run);
            if current_open {
                current += 1;
            }
        } else {
            run = 0;
            current_open = false;
        }
    }

    (current, longest)
}

/// Base score of a single mood entry (explicit score wins over the label)
pub fn mood_base_score(entry: &MoodEntry) -> f64 {
    if let Some(score) = entry.score {
        return score;
    }

    let label = entry
        .label
        .as_deref()
        .map(|l| l.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match label.as_str() {
        "great" | "energized" | "motivated" => 90.0,
        "good" | "calm" => 75.0,
        "ok" | "neutral" => 60.0,
        "tired" | "low" => 45.0,
        "stressed" | "anxious" => 35.0,
        _ => DEFAULT_MOOD_SCORE,
    }
}

/// Weighted mean of all entries, clamped to 0-100; 0 means "no signal"
fn compute_mood_score(moods: &[MoodEntry], mood_weight: f64) -> u32 {
    if moods.is_empty() {
        return 0;
    }
    let mean = moods.iter().map(mood_base_score).sum::<f64>() / moods.len() as f64;
    let weighted = round_half_up(mean * mood_weight);
    to_count(weighted.clamp(0.0, 100.0))
}

/// Undated entries are read as logged today
fn reading(entry: &MoodEntry, offset: &FixedOffset, today: NaiveDate) -> MoodReading {
    MoodReading {
        label: entry.label.clone(),
        score: mood_base_score(entry),
        date: Some(entry.date.map(|d| d.local_day(offset)).unwrap_or(today)),
    }
}

/// Latest entry by timestamp; undated entries rank oldest, later list position breaks ties
fn most_recent_mood(
    moods: &[MoodEntry],
    offset: &FixedOffset,
    today: NaiveDate,
) -> Option<MoodReading> {
    moods
        .iter()
        .enumerate()
        .max_by_key(|(index, m)| (m.date.map(|d| d.local_datetime(offset)), *index))
        .map(|(_, m)| reading(m, offset, today))
}

/// Entry with the lowest base score (first one on ties)
fn lowest_mood(moods: &[MoodEntry], offset: &FixedOffset, today: NaiveDate) -> Option<MoodReading> {
    let mut lowest: Option<&MoodEntry> = None;
    for entry in moods {
        match lowest {
            Some(current) if mood_base_score(current) <= mood_base_score(entry) => {}
            _ => lowest = Some(entry),
        }
    }
    lowest.map(|m| reading(m, offset, today))
}

/// Raw focus minutes for each of the last `week_days` days, oldest first
fn compute_weekly_focus(
    snapshot: &Snapshot,
    offset: &FixedOffset,
    today: NaiveDate,
    week_days: u32,
) -> Vec<DailyFocus> {
    (0..week_days)
        .rev()
        .filter_map(|i| today.checked_sub_days(Days::new(i as u64)))
        .map(|day| {
            let seconds = finite_sum(
                snapshot
                    .focus_sessions
                    .iter()
                    .filter(|s| s.date.map(|d| d.local_day(offset)) == Some(day))
                    .map(|s| s.duration_seconds),
            );

            DailyFocus {
                date: day,
                weekday: weekday_label(day),
                focus_minutes: to_count(round_half_up(seconds / 60.0)),
            }
        })
        .collect()
}

/// First day with the strictly highest minutes; none when every day is zero
fn best_focus_day(weekly: &[DailyFocus]) -> Option<DailyFocus> {
    let mut best: Option<&DailyFocus> = None;
    for day in weekly {
        let best_minutes = best.map(|b| b.focus_minutes).unwrap_or(0);
        if day.focus_minutes > best_minutes {
            best = Some(day);
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FocusSession, PlannerBlock, Task};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T18:00:00+00:00").unwrap()
    }

    fn day(offset_days: i64) -> NaiveDate {
        now().date_naive() - Duration::days(offset_days)
    }

    fn at(offset_days: i64) -> DateTime<FixedOffset> {
        now() - Duration::days(offset_days)
    }

    fn session_on(offset_days: i64, seconds: u32) -> FocusSession {
        FocusSession::completed(seconds, at(offset_days))
    }

    fn aggregate(snapshot: &Snapshot) -> Aggregates {
        ActivityAggregator::aggregate(
            snapshot,
            &BehavioralProfile::neutral(),
            now(),
            &EngineOptions::default(),
        )
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let agg = aggregate(&Snapshot::default());
        assert_eq!(agg.total_tasks, 0);
        assert_eq!(agg.completion_rate, 0);
        assert_eq!(agg.total_focus_minutes, 0);
        assert_eq!(agg.avg_daily_focus, 0);
        assert_eq!(agg.mood_score, 0);
        assert_eq!(agg.current_streak, 0);
        assert_eq!(agg.longest_streak, 0);
        assert_eq!(agg.weekly_focus.len(), 7);
        assert!(agg.best_focus_day.is_none());
        assert_eq!(agg.weekly_focus_max, 30);
        assert!(agg.current_mood.is_none());
    }

    #[test]
    fn test_completion_rate_boundaries() {
        let mut done = Task::default();
        done.completed = true;
        let snapshot = Snapshot {
            tasks: vec![done],
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).completion_rate, 100);

        let snapshot = Snapshot {
            tasks: vec![Task::default()],
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).completion_rate, 0);
    }

    #[test]
    fn test_completion_rate_rounds_half_up() {
        // 1 of 8 = 12.5% -> 13
        let mut tasks = vec![Task::default(); 8];
        tasks[0].completed = true;
        let snapshot = Snapshot {
            tasks,
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).completion_rate, 13);
    }

    #[test]
    fn test_streak_anchored_at_today() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(0, 60), session_on(1, 60), session_on(2, 60)],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.current_streak, 3);
        assert_eq!(agg.longest_streak, 3);
    }

    #[test]
    fn test_streak_requires_today() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(1, 60), session_on(2, 60)],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.current_streak, 0);
        assert_eq!(agg.longest_streak, 2);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        // today, yesterday, gap, then four days in a row
        let snapshot = Snapshot {
            focus_sessions: vec![
                session_on(0, 60),
                session_on(1, 60),
                session_on(3, 60),
                session_on(4, 60),
                session_on(5, 60),
                session_on(6, 60),
            ],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.current_streak, 2);
        assert_eq!(agg.longest_streak, 4);
    }

    #[test]
    fn test_streak_ignores_days_outside_window() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(0, 60), session_on(45, 60)],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.current_streak, 1);
        assert_eq!(agg.longest_streak, 1);
    }

    #[test]
    fn test_undated_records_count_as_today() {
        let snapshot = Snapshot {
            tasks: vec![Task::default()],
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).current_streak, 1);
    }

    #[test]
    fn test_task_activity_prefers_completed_at() {
        let mut task = Task::new("t", "Old task", Default::default(), at(10));
        task.set_completed(true, at(0));
        let snapshot = Snapshot {
            tasks: vec![task],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.current_streak, 1);
        assert_eq!(agg.completed_today, 1);
    }

    #[test]
    fn test_display_streak_scaled_by_profile() {
        let snapshot = Snapshot {
            focus_sessions: (0..4).map(|i| session_on(i, 60)).collect(),
            ..Default::default()
        };
        let engineers = crate::profile::ProfileKey::Engineers.profile();
        let agg =
            ActivityAggregator::aggregate(&snapshot, &engineers, now(), &EngineOptions::default());
        assert_eq!(agg.current_streak, 4);
        // 4 * 1.25 = 5
        assert_eq!(agg.display_streak, 5);
    }

    #[test]
    fn test_focus_totals_with_multiplier() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(0, 1500), session_on(1, 1500)],
            ..Default::default()
        };
        let shadows = crate::profile::ProfileKey::Shadows.profile();
        let agg =
            ActivityAggregator::aggregate(&snapshot, &shadows, now(), &EngineOptions::default());
        assert_eq!(agg.total_focus_seconds_raw, 3000.0);
        // 3000 * 1.12 = 3360s = 56 min
        assert_eq!(agg.total_focus_minutes, 56);
        assert_eq!(agg.avg_daily_focus, 8);
    }

    #[test]
    fn test_mood_average_with_weight() {
        let snapshot = Snapshot {
            moods: vec![MoodEntry::scored(80.0), MoodEntry::scored(60.0)],
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).mood_score, 70);
    }

    #[test]
    fn test_mood_label_table() {
        let labels = [
            ("great", 90.0),
            ("Energized", 90.0),
            ("motivated", 90.0),
            ("good", 75.0),
            ("calm", 75.0),
            ("ok", 60.0),
            ("neutral", 60.0),
            ("tired", 45.0),
            ("low", 45.0),
            ("stressed", 35.0),
            ("anxious", 35.0),
            ("meh", 60.0),
        ];
        for (label, expected) in labels {
            let entry = MoodEntry {
                label: Some(label.to_string()),
                ..Default::default()
            };
            assert_eq!(mood_base_score(&entry), expected, "label {label}");
        }
    }

    #[test]
    fn test_mood_score_clamped() {
        let hipsters = crate::profile::ProfileKey::Hipsters.profile();
        let snapshot = Snapshot {
            moods: vec![MoodEntry::scored(90.0)],
            ..Default::default()
        };
        let agg =
            ActivityAggregator::aggregate(&snapshot, &hipsters, now(), &EngineOptions::default());
        // 90 * 1.4 = 126 -> 100
        assert_eq!(agg.mood_score, 100);
    }

    #[test]
    fn test_current_mood_is_most_recent() {
        let snapshot = Snapshot {
            moods: vec![
                MoodEntry::labeled("tired", at(0)),
                MoodEntry::labeled("great", at(2)),
                MoodEntry::labeled("calm", at(1)),
            ],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        let current = agg.current_mood.unwrap();
        assert_eq!(current.label.as_deref(), Some("tired"));
        assert_eq!(current.date, Some(day(0)));

        let lowest = agg.lowest_mood.unwrap();
        assert_eq!(lowest.score, 45.0);
    }

    #[test]
    fn test_undated_mood_reads_as_today() {
        let snapshot = Snapshot {
            moods: vec![MoodEntry::scored(30.0), MoodEntry::labeled("great", at(1))],
            ..Default::default()
        };
        let lowest = aggregate(&snapshot).lowest_mood.unwrap();
        assert_eq!(lowest.score, 30.0);
        assert_eq!(lowest.date, Some(day(0)));
    }

    #[test]
    fn test_today_focus_figures() {
        let snapshot = Snapshot {
            focus_sessions: vec![
                session_on(0, 1500),
                session_on(0, 600),
                session_on(3, 5400),
                FocusSession {
                    duration_seconds: 300.0,
                    date: None,
                },
            ],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.today_session_count, 2);
        assert_eq!(agg.today_focus_minutes, 35);
        assert_eq!(agg.longest_session_minutes, 90);

        let empty = aggregate(&Snapshot::default());
        assert_eq!(empty.today_session_count, 0);
        assert_eq!(empty.longest_session_minutes, 0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let snapshot = Snapshot {
            focus_sessions: vec![
                FocusSession {
                    duration_seconds: 1e308,
                    date: None,
                },
                FocusSession {
                    duration_seconds: 1e308,
                    date: None,
                },
            ],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);
        assert_eq!(agg.total_focus_minutes, u32::MAX);
        assert!(agg.total_focus_seconds_raw.is_finite());
        assert!(agg.total_focus_seconds.is_finite());
        assert_eq!(agg.longest_session_minutes, u32::MAX);
    }

    #[test]
    fn test_oversized_windows_are_clamped() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(0, 600)],
            ..Default::default()
        };
        let options = EngineOptions {
            lookback_days: u32::MAX,
            week_days: u32::MAX,
        };
        let agg = ActivityAggregator::aggregate(
            &snapshot,
            &BehavioralProfile::neutral(),
            now(),
            &options,
        );
        assert_eq!(agg.current_streak, 1);
        assert_eq!(agg.weekly_focus.len(), crate::config::MAX_WEEK_DAYS as usize);
    }

    #[test]
    fn test_streak_walk_stops_at_calendar_start() {
        let activity: BTreeSet<NaiveDate> = [NaiveDate::MIN].into_iter().collect();
        assert_eq!(compute_streaks(&activity, NaiveDate::MIN, 30), (1, 1));
    }

    #[test]
    fn test_weekly_focus_curve() {
        let snapshot = Snapshot {
            focus_sessions: vec![
                session_on(0, 1500),
                session_on(2, 3000),
                session_on(2, 600),
                session_on(10, 6000),
                FocusSession {
                    duration_seconds: 900.0,
                    date: None,
                },
            ],
            ..Default::default()
        };
        let agg = aggregate(&snapshot);

        assert_eq!(agg.weekly_focus.first().unwrap().date, day(6));
        assert_eq!(agg.weekly_focus.last().unwrap().date, day(0));
        assert_eq!(agg.weekly_focus[6].focus_minutes, 25);
        assert_eq!(agg.weekly_focus[4].focus_minutes, 60);

        let best = agg.best_focus_day.unwrap();
        assert_eq!(best.date, day(2));
        assert_eq!(best.focus_minutes, 60);
        assert_eq!(agg.weekly_focus_max, 60);
    }

    #[test]
    fn test_best_focus_day_first_of_ties() {
        let snapshot = Snapshot {
            focus_sessions: vec![session_on(3, 1200), session_on(1, 1200)],
            ..Default::default()
        };
        assert_eq!(aggregate(&snapshot).best_focus_day.unwrap().date, day(3));
    }

    #[test]
    fn test_planner_load_scaled() {
        let snapshot = Snapshot {
            planner: (0..5).map(|i| PlannerBlock::new(format!("{i:02}:00"), "Block")).collect(),
            ..Default::default()
        };
        let hipsters = crate::profile::ProfileKey::Hipsters.profile();
        let agg =
            ActivityAggregator::aggregate(&snapshot, &hipsters, now(), &EngineOptions::default());
        assert_eq!(agg.raw_planner_load, 5);
        // 5 * 1.2 = 6
        assert_eq!(agg.planner_load, 6);
    }

    #[test]
    fn test_activity_day_uses_device_offset() {
        // 23:30 UTC on the 14th is the 15th in UTC+2
        let now = DateTime::parse_from_rfc3339("2024-01-15T10:00:00+02:00").unwrap();
        let snapshot = Snapshot {
            focus_sessions: vec![FocusSession {
                duration_seconds: 600.0,
                date: RecordTime::parse("2024-01-14T23:30:00Z"),
            }],
            ..Default::default()
        };
        let agg = ActivityAggregator::aggregate(
            &snapshot,
            &BehavioralProfile::neutral(),
            now,
            &EngineOptions::default(),
        );
        assert_eq!(agg.current_streak, 1);
    }
}
