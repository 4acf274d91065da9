//! Clock and focus timer
//!
//! The focus countdown is its own small state machine. It never touches the
//! session history: when it reaches zero it hands back exactly one
//! [`FocusSession`] and the caller decides where that record goes.

use crate::error::EngineError;
use crate::types::FocusSession;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the device's local offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// A clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, by: ChronoDuration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

/// Interval driver running a callback on a background thread.
///
/// The callback returns `ControlFlow::Break` to stop on its own.
pub struct Ticker;

impl Ticker {
    pub fn every<F>(interval: Duration, mut callback: F) -> TickHandle
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let finished = Arc::new(AtomicBool::new(false));
        let thread_finished = finished.clone();

        let thread = std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if callback().is_break() {
                            break;
                        }
                    }
                    // Explicit stop or the handle went away
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            thread_finished.store(true, Ordering::SeqCst);
        });

        TickHandle {
            stop: Some(stop_tx),
            finished,
            thread: Some(thread),
        }
    }
}

/// Cancellation handle for a running [`Ticker`]; dropping it cancels
pub struct TickHandle {
    stop: Option<mpsc::Sender<()>>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stop the interval and wait for the worker to exit
    pub fn cancel(mut self) {
        self.shutdown();
    }

    /// Block until the callback stops the interval itself
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("ticker callback panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("ticker callback panicked");
            }
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub const MIN_CUSTOM_MINUTES: u32 = 5;
pub const MAX_CUSTOM_MINUTES: u32 = 180;

/// Focus timer presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusMode {
    #[default]
    Pomodoro,
    Deep,
    Sprint,
    Study,
    Custom(u32),
}

impl FocusMode {
    pub const PRESETS: [FocusMode; 4] = [
        FocusMode::Pomodoro,
        FocusMode::Deep,
        FocusMode::Sprint,
        FocusMode::Study,
    ];

    /// A custom duration, validated to 5-180 minutes
    pub fn custom(minutes: u32) -> Result<Self, EngineError> {
        if (MIN_CUSTOM_MINUTES..=MAX_CUSTOM_MINUTES).contains(&minutes) {
            Ok(FocusMode::Custom(minutes))
        } else {
            Err(EngineError::InvalidTimerDuration(minutes))
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            FocusMode::Pomodoro => 25,
            FocusMode::Deep => 50,
            FocusMode::Sprint => 10,
            FocusMode::Study => 90,
            FocusMode::Custom(minutes) => *minutes,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusMode::Pomodoro => "Pomodoro",
            FocusMode::Deep => "Deep Focus",
            FocusMode::Sprint => "Sprint",
            FocusMode::Study => "Study",
            FocusMode::Custom(_) => "Custom",
        }
    }

    fn validate(self) -> Result<Self, EngineError> {
        match self {
            FocusMode::Custom(minutes) => FocusMode::custom(minutes),
            preset => Ok(preset),
        }
    }
}

/// Outcome of one timer tick
#[derive(Debug, Clone, PartialEq)]
pub enum TimerTick {
    /// Timer is paused; nothing changed
    Idle,
    Running { remaining_seconds: u32 },
    /// Countdown reached zero; the timer has stopped and rewound
    Completed(FocusSession),
}

/// One-second countdown for a focus block
#[derive(Debug, Clone)]
pub struct FocusTimer {
    mode: FocusMode,
    remaining_seconds: u32,
    running: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::rewound(FocusMode::default())
    }
}

impl FocusTimer {
    /// Paused timer at the full duration of `mode`.
    ///
    /// Custom durations outside 5-180 minutes are refused, including ones
    /// built directly or deserialized without [`FocusMode::custom`].
    pub fn new(mode: FocusMode) -> Result<Self, EngineError> {
        Ok(Self::rewound(mode.validate()?))
    }

    fn rewound(mode: FocusMode) -> Self {
        Self {
            mode,
            remaining_seconds: mode.minutes().saturating_mul(60),
            running: false,
        }
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    pub fn duration_seconds(&self) -> u32 {
        self.mode.minutes().saturating_mul(60)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Elapsed share of the block (0.0-1.0)
    pub fn progress(&self) -> f64 {
        let total = self.duration_seconds();
        if total == 0 {
            return 0.0;
        }
        1.0 - self.remaining_seconds as f64 / total as f64
    }

    /// `MM:SS` display of the remaining time
    pub fn display(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    /// Switch mode and rewind; refused while the countdown runs
    pub fn set_mode(&mut self, mode: FocusMode) -> Result<(), EngineError> {
        if self.running {
            return Err(EngineError::TimerRunning);
        }
        self.mode = mode.validate()?;
        self.remaining_seconds = self.duration_seconds();
        Ok(())
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Stop and rewind to the full duration without recording anything
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_seconds = self.duration_seconds();
    }

    /// Advance one second
    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> TimerTick {
        if !self.running {
            return TimerTick::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TimerTick::Running {
                remaining_seconds: self.remaining_seconds,
            };
        }

        let duration = self.duration_seconds();
        self.reset();
        tracing::info!(mode = self.mode.label(), seconds = duration, "focus session completed");
        TimerTick::Completed(FocusSession::completed(duration, now))
    }
}
