//! Pipeline orchestration
//!
//! This module provides the public API of the engine: a stateless one-shot
//! conversion from snapshot JSON to an encoded report, and a stateful
//! processor that owns the in-memory snapshot the host keeps editing.

use crate::adapter::SnapshotAdapter;
use crate::config::{EngineConfig, EngineOptions};
use crate::encoder::ReportEncoder;
use crate::error::EngineError;
use crate::metrics::{compute_report_with, MetricsReport};
use crate::profile::{BehavioralProfile, ProfileKey};
use crate::store::{
    FileStore, KeyValueStore, FOCUS_SESSIONS_KEY, GOALS_KEY, MOODS_KEY, PLANNER_KEY, PROFILE_KEY,
    TASKS_KEY,
};
use crate::timer::{FocusTimer, TimerTick};
use crate::types::{FocusSession, Goal, MoodEntry, PlannerBlock, Snapshot, Task};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Convert a snapshot document to an encoded report payload.
///
/// # Arguments
/// * `raw_json` - Snapshot JSON as persisted by the host
/// * `profile_key` - Behavioral profile name (case-insensitive)
/// * `now` - The instant to evaluate at; its offset defines "today"
///
/// # Example
/// ```ignore
/// let payload = snapshot_to_report(snapshot_json, "Engineers", now)?;
/// ```
pub fn snapshot_to_report(
    raw_json: &str,
    profile_key: &str,
    now: DateTime<FixedOffset>,
) -> Result<String, EngineError> {
    let profile = profile_key.parse::<ProfileKey>()?.profile();

    // Stage 1: lenient parse
    let snapshot = SnapshotAdapter::parse(raw_json)?;

    // Stages 2-5: aggregate, score, classify, narrate
    let report = compute_report_with(&snapshot, &profile, now, &EngineOptions::default());

    // Stage 6: encode
    ReportEncoder::new().encode_to_json(report, now)
}

/// Stateful processor over a live snapshot.
///
/// Mutations update the in-memory snapshot first and then write the affected
/// collection to the store. Store failures are logged and never block the
/// next report.
pub struct MetricsProcessor {
    snapshot: Snapshot,
    profile: BehavioralProfile,
    options: EngineOptions,
    store: Option<Box<dyn KeyValueStore>>,
    encoder: ReportEncoder,
}

impl Default for MetricsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProcessor {
    /// Processor with an empty snapshot, the default profile and no store
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot::default(),
            profile: BehavioralProfile::default(),
            options: EngineOptions::default(),
            store: None,
            encoder: ReportEncoder::new(),
        }
    }

    /// Processor backed by `store`; the snapshot and profile are loaded from it
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        let snapshot = SnapshotAdapter::from_store(store.as_ref());
        let profile = SnapshotAdapter::profile_from_store(store.as_ref())
            .unwrap_or_default()
            .profile();

        Self {
            snapshot,
            profile,
            store: Some(store),
            ..Self::new()
        }
    }

    /// Processor configured from an [`EngineConfig`].
    ///
    /// A configured data directory opens a [`FileStore`]; a profile stored
    /// there wins over the configured default.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let processor = match &config.data_dir {
            Some(dir) => {
                let store = FileStore::open(dir)?;
                let stored = SnapshotAdapter::profile_from_store(&store);
                let mut processor = Self::with_store(Box::new(store));
                if stored.is_none() {
                    processor.profile = config.profile.profile();
                }
                processor
            }
            None => Self {
                profile: config.profile.profile(),
                ..Self::new()
            },
        };

        Ok(processor.with_options(config.options()))
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn profile(&self) -> &BehavioralProfile {
        &self.profile
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn set_profile(&mut self, profile: BehavioralProfile) {
        self.profile = profile;
        self.persist(PROFILE_KEY, &profile.key);
    }

    /// Select a built-in profile by name
    pub fn select_profile(&mut self, key: &str) -> Result<(), EngineError> {
        let key: ProfileKey = key.parse()?;
        self.set_profile(key.profile());
        Ok(())
    }

    /// Replace every collection at once
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.persist(TASKS_KEY, &self.snapshot.tasks);
        self.persist(FOCUS_SESSIONS_KEY, &self.snapshot.focus_sessions);
        self.persist(MOODS_KEY, &self.snapshot.moods);
        self.persist(PLANNER_KEY, &self.snapshot.planner);
        self.persist(GOALS_KEY, &self.snapshot.goals);
    }

    pub fn add_task(&mut self, task: Task) {
        self.snapshot.tasks.push(task);
        self.persist(TASKS_KEY, &self.snapshot.tasks);
    }

    /// Toggle completion of the task with `id`; returns whether it exists
    pub fn set_task_completed(&mut self, id: &str, completed: bool, now: DateTime<FixedOffset>) -> bool {
        let Some(task) = self.snapshot.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.set_completed(completed, now);
        self.persist(TASKS_KEY, &self.snapshot.tasks);
        true
    }

    /// Delete the task with `id`; returns whether it existed
    pub fn remove_task(&mut self, id: &str) -> bool {
        let before = self.snapshot.tasks.len();
        self.snapshot.tasks.retain(|t| t.id != id);
        let removed = self.snapshot.tasks.len() != before;
        if removed {
            self.persist(TASKS_KEY, &self.snapshot.tasks);
        }
        removed
    }

    /// Log today's mood, replacing any entry already logged today
    pub fn log_mood(&mut self, label: &str, now: DateTime<FixedOffset>) {
        let offset = *now.offset();
        let today = now.date_naive();

        self.snapshot
            .moods
            .retain(|m| m.date.map(|d| d.local_day(&offset)) != Some(today));
        self.snapshot.moods.push(MoodEntry::labeled(label, now));
        self.persist(MOODS_KEY, &self.snapshot.moods);
    }

    pub fn add_planner_block(&mut self, block: PlannerBlock) {
        self.snapshot.planner.push(block);
        self.persist(PLANNER_KEY, &self.snapshot.planner);
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.snapshot.goals.push(goal);
        self.persist(GOALS_KEY, &self.snapshot.goals);
    }

    pub fn record_focus_session(&mut self, session: FocusSession) {
        self.snapshot.focus_sessions.push(session);
        self.persist(FOCUS_SESSIONS_KEY, &self.snapshot.focus_sessions);
    }

    /// Record a manually logged block of focus minutes
    pub fn add_manual_focus(&mut self, minutes: u32, now: DateTime<FixedOffset>) {
        self.record_focus_session(FocusSession::manual(minutes, now));
    }

    /// Advance `timer` one second, recording the session if it completed
    pub fn apply_tick(&mut self, timer: &mut FocusTimer, now: DateTime<FixedOffset>) -> TimerTick {
        let tick = timer.tick(now);
        if let TimerTick::Completed(session) = &tick {
            self.record_focus_session(session.clone());
        }
        tick
    }

    /// Compute the report for the current snapshot
    pub fn report(&self, now: DateTime<FixedOffset>) -> MetricsReport {
        compute_report_with(&self.snapshot, &self.profile, now, &self.options)
    }

    /// Compute and encode the report for the current snapshot
    pub fn report_json(&self, now: DateTime<FixedOffset>) -> Result<String, EngineError> {
        self.encoder.encode_to_json(self.report(now), now)
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(store) = &self.store else {
            return;
        };

        let result = serde_json::to_value(value)
            .map_err(EngineError::from)
            .and_then(|json| store.set(key, json));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "failed to persist collection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::IdentityRank;
    use crate::store::MemoryStore;
    use crate::timer::FocusMode;
    use crate::types::Priority;
    use chrono::Duration;
    use std::sync::Arc;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T18:00:00+00:00").unwrap()
    }

    fn sample_snapshot_json() -> &'static str {
        r#"{
            "tasks": [
                {"id": "1", "title": "Write", "priority": "High", "completed": true,
                 "createdAt": "2024-01-15T08:00:00Z", "completedAt": "2024-01-15T09:00:00Z"},
                {"id": "2", "title": "Review", "priority": "Low", "completed": false,
                 "createdAt": "2024-01-14T08:00:00Z"}
            ],
            "focusSessions": [
                {"duration": 1500, "date": "2024-01-15T10:00:00Z"},
                {"duration": 3000, "date": "2024-01-14T10:00:00Z"}
            ],
            "moods": [{"date": "Mon Jan 15 2024", "label": "good"}],
            "planner": [{"time": "09:00", "title": "Deep work"}],
            "goals": []
        }"#
    }

    #[test]
    fn test_snapshot_to_report() {
        let json = snapshot_to_report(sample_snapshot_json(), "engineers", now()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["producer"]["name"], crate::PRODUCER_NAME);
        assert_eq!(payload["profile"], "Engineers");

        let report = &payload["report"];
        assert_eq!(report["total_tasks"], 2);
        assert_eq!(report["completion_rate"], 50);
        assert_eq!(report["current_streak"], 2);
        assert_eq!(report["mood_score"], 75);
    }

    #[test]
    fn test_snapshot_to_report_unknown_profile() {
        let result = snapshot_to_report(sample_snapshot_json(), "Wizards", now());
        assert!(matches!(result, Err(EngineError::UnknownProfile(_))));
    }

    #[test]
    fn test_snapshot_to_report_invalid_json() {
        let result = snapshot_to_report("{oops", "Speedsters", now());
        assert!(matches!(result, Err(EngineError::ParseError(_))));
    }

    #[test]
    fn test_processor_mutations_feed_report() {
        let mut processor = MetricsProcessor::new();
        processor.add_task(Task::new("a", "Plan", Priority::High, now()));
        processor.add_task(Task::new("b", "Build", Priority::Medium, now()));
        assert!(processor.set_task_completed("a", true, now()));
        assert!(!processor.set_task_completed("missing", true, now()));

        let report = processor.report(now());
        assert_eq!(report.aggregates.completed_tasks, 1);
        assert_eq!(report.aggregates.completed_today, 1);
        assert_eq!(report.aggregates.completion_rate, 50);

        assert!(processor.remove_task("b"));
        assert_eq!(processor.report(now()).aggregates.completion_rate, 100);
    }

    #[test]
    fn test_log_mood_replaces_same_day() {
        let mut processor = MetricsProcessor::new();
        processor.log_mood("tired", now() - Duration::days(1));
        processor.log_mood("stressed", now() - Duration::hours(2));
        processor.log_mood("great", now());

        let moods = &processor.snapshot().moods;
        assert_eq!(moods.len(), 2);
        assert_eq!(moods[1].label.as_deref(), Some("great"));
    }

    #[test]
    fn test_apply_tick_records_one_session() {
        let mut processor = MetricsProcessor::new();
        let mut timer = FocusTimer::new(FocusMode::custom(5).unwrap()).unwrap();
        timer.start();

        let mut completed = 0;
        for _ in 0..600 {
            if let TimerTick::Completed(_) = processor.apply_tick(&mut timer, now()) {
                completed += 1;
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(processor.snapshot().focus_sessions.len(), 1);
        assert_eq!(processor.report(now()).aggregates.total_focus_seconds_raw, 300.0);
    }

    #[test]
    fn test_manual_focus() {
        let mut processor = MetricsProcessor::new();
        processor.select_profile("Shadows").unwrap();
        processor.add_manual_focus(25, now());
        // 1500s * 1.12 = 1680s = 28 min
        assert_eq!(processor.report(now()).aggregates.total_focus_minutes, 28);
    }

    #[test]
    fn test_select_unknown_profile_keeps_current() {
        let mut processor = MetricsProcessor::new();
        assert!(processor.select_profile("Wizards").is_err());
        assert_eq!(processor.profile().key, ProfileKey::Speedsters);
    }

    /// Store wrapper sharing its contents with the test
    struct SharedStore(Arc<MemoryStore>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Option<serde_json::Value> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: serde_json::Value) -> Result<(), EngineError> {
            self.0.set(key, value)
        }
    }

    /// Store that refuses every write
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<serde_json::Value> {
            None
        }

        fn set(&self, key: &str, _value: serde_json::Value) -> Result<(), EngineError> {
            Err(EngineError::StorageError(format!("read-only: {key}")))
        }
    }

    #[test]
    fn test_processor_persists_and_reloads() {
        let shared = Arc::new(MemoryStore::new());

        let mut processor = MetricsProcessor::with_store(Box::new(SharedStore(shared.clone())));
        processor.select_profile("Hipsters").unwrap();
        processor.add_task(Task::new("a", "Plan", Priority::High, now()));
        processor.add_manual_focus(30, now());
        processor.log_mood("calm", now());

        let reloaded = MetricsProcessor::with_store(Box::new(SharedStore(shared)));
        assert_eq!(reloaded.profile().key, ProfileKey::Hipsters);
        assert_eq!(reloaded.snapshot().tasks.len(), 1);
        assert_eq!(reloaded.snapshot().focus_sessions.len(), 1);
        assert_eq!(reloaded.snapshot().moods.len(), 1);
        assert_eq!(
            processor.report(now()).aggregates,
            reloaded.report(now()).aggregates
        );
    }

    #[test]
    fn test_store_failures_do_not_block_reports() {
        let mut processor = MetricsProcessor::with_store(Box::new(ReadOnlyStore));
        processor.add_manual_focus(50, now());
        let report = processor.report(now());
        assert_eq!(report.aggregates.focus_session_count, 1);
        assert_ne!(report.classification.identity_rank, IdentityRank::Executor);
    }

    #[test]
    fn test_from_config_with_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            profile: ProfileKey::Engineers,
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let mut processor = MetricsProcessor::from_config(&config).unwrap();
        assert_eq!(processor.profile().key, ProfileKey::Engineers);
        processor.add_manual_focus(10, now());
        assert!(dir.path().join("focus_sessions.json").exists());

        let reopened = MetricsProcessor::from_config(&config).unwrap();
        assert_eq!(reopened.snapshot().focus_sessions.len(), 1);
    }

    #[test]
    fn test_report_json_with_fixed_encoder() {
        let processor = MetricsProcessor::new()
            .with_encoder(ReportEncoder::with_instance_id("fixed"));
        let a = processor.report_json(now()).unwrap();
        let b = processor.report_json(now()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"instance_id\":\"fixed\""));
    }
}
