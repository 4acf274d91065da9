//! MindFlow Engine - On-device productivity metrics
//!
//! The engine turns locally stored tasks, focus sessions, mood entries, planner
//! blocks and goals into a report of streaks, scores, levels and insight text
//! through a deterministic pipeline: snapshot adaptation → aggregation → score
//! derivation → classification → narrative → encoding.
//!
//! ## Modules
//!
//! - **Metrics**: Pure computation from a snapshot, a behavioral profile and a
//!   supplied "now"
//! - **Processor**: Stateful host integration with persistence and the focus timer

pub mod adapter;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod store;
pub mod time;
pub mod timer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::SnapshotAdapter;
pub use config::{EngineConfig, EngineOptions};
pub use encoder::{ReportEncoder, ReportPayload};
pub use error::EngineError;
pub use metrics::{compute_report, compute_report_with, MetricsReport};
pub use pipeline::{snapshot_to_report, MetricsProcessor};
pub use profile::{BehavioralProfile, ProfileKey};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use timer::{Clock, FixedClock, FocusMode, FocusTimer, SystemClock, Ticker, TimerTick};
pub use types::Snapshot;

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "mindflow-engine";
