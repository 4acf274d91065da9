//! MindFlow CLI - Command-line interface for the MindFlow engine
//!
//! Commands:
//! - report: Compute the metrics report from a snapshot file or a data directory
//! - profiles: List the built-in behavioral profiles
//! - focus: Run a focus countdown and record the session
//! - log-focus: Record manually logged focus minutes
//! - mood: Log today's mood
//! - doctor: Diagnose configuration and stored data

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tracing_subscriber::EnvFilter;

use mindflow_engine::metrics::compute_report_with;
use mindflow_engine::store::COLLECTION_KEYS;
use mindflow_engine::time::parse_now;
use mindflow_engine::types::FocusSession;
use mindflow_engine::{
    BehavioralProfile, Clock, EngineConfig, EngineError, FocusMode, FocusTimer, MetricsProcessor,
    MetricsReport, ProfileKey, ReportEncoder, Snapshot, SnapshotAdapter, SystemClock, Ticker,
    TimerTick, ENGINE_VERSION, PRODUCER_NAME,
};

/// MindFlow - On-device productivity metrics
#[derive(Parser)]
#[command(name = "mindflow")]
#[command(author = "MindFlow Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Compute streaks, scores and insights from local productivity records", long_about = None)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(long, global = true, env = "MINDFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the persisted collections
    #[arg(long, global = true, env = "MINDFLOW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Behavioral profile (Shadows, Speedsters, Engineers, Hipsters)
    #[arg(long, global = true, env = "MINDFLOW_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the metrics report
    Report {
        /// Snapshot file path (use - for stdin); defaults to the data directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reference time (RFC 3339); defaults to the device clock
        #[arg(long)]
        now: Option<String>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// List the built-in behavioral profiles
    Profiles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a focus countdown and record the completed session
    Focus {
        /// Timer preset
        #[arg(long, default_value = "pomodoro")]
        mode: TimerPreset,

        /// Custom duration in minutes (5-180); overrides --mode
        #[arg(long)]
        minutes: Option<u32>,

        /// Complete the session immediately instead of counting down
        #[arg(long)]
        instant: bool,
    },

    /// Record manually logged focus minutes
    LogFocus {
        /// Minutes of focus
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        minutes: u32,

        /// Time of the session (RFC 3339); defaults to the device clock
        #[arg(long)]
        now: Option<String>,
    },

    /// Log today's mood, replacing any entry already logged today
    Mood {
        /// Mood label (e.g. great, good, calm, tired, stressed)
        label: String,

        /// Reference time (RFC 3339); defaults to the device clock
        #[arg(long)]
        now: Option<String>,
    },

    /// Diagnose configuration and stored data
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON payload
    Json,
    /// Pretty-printed JSON payload
    JsonPretty,
    /// Human-readable summary
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum TimerPreset {
    /// 25 minutes
    Pomodoro,
    /// 50 minutes
    Deep,
    /// 10 minutes
    Sprint,
    /// 90 minutes
    Study,
}

impl From<TimerPreset> for FocusMode {
    fn from(preset: TimerPreset) -> Self {
        match preset {
            TimerPreset::Pomodoro => FocusMode::Pomodoro,
            TimerPreset::Deep => FocusMode::Deep,
            TimerPreset::Sprint => FocusMode::Sprint,
            TimerPreset::Study => FocusMode::Study,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MindflowCliError> {
    let config = load_config(cli.config.as_deref(), cli.data_dir.clone())?;
    init_tracing(&config.log_filter);

    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Report { input, now, format } => {
            cmd_report(&config, profile, input.as_deref(), now.as_deref(), format)
        }
        Commands::Profiles { json } => cmd_profiles(json),
        Commands::Focus {
            mode,
            minutes,
            instant,
        } => cmd_focus(&config, mode, minutes, instant),
        Commands::LogFocus { minutes, now } => cmd_log_focus(&config, minutes, now.as_deref()),
        Commands::Mood { label, now } => cmd_mood(&config, &label, now.as_deref()),
        Commands::Doctor { json } => cmd_doctor(&config, cli.config.as_deref(), profile, json),
    }
}

/// Config file (or defaults) with the data directory flag applied
fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<EngineConfig, MindflowCliError> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if data_dir.is_some() {
        config.data_dir = data_dir;
    }
    Ok(config)
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Logs go to stderr; stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<FixedOffset>, MindflowCliError> {
    match raw {
        Some(raw) => Ok(parse_now(raw)?),
        None => Ok(SystemClock.now()),
    }
}

/// Processor over the configured data directory
fn open_processor(config: &EngineConfig) -> Result<MetricsProcessor, MindflowCliError> {
    if config.data_dir.is_none() {
        return Err(MindflowCliError::NoDataDir);
    }
    Ok(MetricsProcessor::from_config(config)?)
}

fn cmd_report(
    config: &EngineConfig,
    profile: Option<&str>,
    input: Option<&Path>,
    now: Option<&str>,
    format: OutputFormat,
) -> Result<(), MindflowCliError> {
    let now = resolve_now(now)?;

    let (snapshot, stored_profile): (Snapshot, BehavioralProfile) = match input {
        Some(path) => {
            let raw = read_input(path)?;
            (SnapshotAdapter::parse(&raw)?, config.profile.profile())
        }
        None => {
            let processor = open_processor(config)?;
            (processor.snapshot().clone(), *processor.profile())
        }
    };

    // An explicit profile applies to this report only and is not persisted
    let profile = match profile {
        Some(key) => key.parse::<ProfileKey>()?.profile(),
        None => stored_profile,
    };

    tracing::debug!(
        profile = %profile.key,
        tasks = snapshot.tasks.len(),
        sessions = snapshot.focus_sessions.len(),
        "computing report"
    );

    let report = compute_report_with(&snapshot, &profile, now, &config.options());
    let encoder = ReportEncoder::new();

    let output = match format {
        OutputFormat::Json => encoder.encode_to_json(report, now)?,
        OutputFormat::JsonPretty => encoder.encode_to_json_pretty(report, now)?,
        OutputFormat::Text => format_text(&report),
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    Ok(())
}

fn read_input(path: &Path) -> Result<String, MindflowCliError> {
    if path.to_string_lossy() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_text(report: &MetricsReport) -> String {
    let aggregates = &report.aggregates;
    let scores = &report.scores;
    let classification = &report.classification;
    let narrative = &report.narrative;

    let mut lines = vec![
        format!("MindFlow Report ({})", report.profile),
        "=".repeat(24),
        format!(
            "Productivity: {}   Level {} {} ({} XP)",
            scores.productivity_score, scores.xp.level, scores.xp.label, scores.xp.xp
        ),
        format!(
            "Tasks: {}/{} ({}%)   Focus: {} min   Streak: {} days (best {})",
            aggregates.completed_tasks,
            aggregates.total_tasks,
            aggregates.completion_rate,
            aggregates.total_focus_minutes,
            aggregates.display_streak,
            aggregates.longest_streak
        ),
        format!(
            "Mood: {}   Recovery: {} ({})   Burnout risk: {:?}",
            aggregates.mood_score,
            classification.recovery.score,
            classification.recovery.label.as_str(),
            classification.forecast.burnout_risk
        ),
        format!(
            "Signature: {}  {}",
            classification.habit_signature.code, classification.habit_signature.descriptor
        ),
        format!("Identity: {:?}", classification.identity_rank),
        String::new(),
        narrative.brain.clone(),
        narrative.forecast.clone(),
        String::new(),
        "Alerts:".to_string(),
    ];

    for alert in &narrative.alerts {
        lines.push(format!("  [{:?}] {}: {}", alert.severity, alert.title, alert.body));
    }

    lines.push("Insights:".to_string());
    for insight in &narrative.insights {
        lines.push(format!("  - {}", insight));
    }

    lines.push(format!(
        "{}: {}",
        narrative.timeline.title, narrative.timeline.body
    ));

    lines.join("\n")
}

fn cmd_profiles(json: bool) -> Result<(), MindflowCliError> {
    let profiles: Vec<BehavioralProfile> = ProfileKey::ALL.iter().map(|k| k.profile()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!(
        "{:<12} {:>6} {:>6} {:>6} {:>6}  {}",
        "Profile", "Focus", "Mood", "Streak", "Plan", "Tagline"
    );
    for profile in &profiles {
        println!(
            "{:<12} {:>6.2} {:>6.2} {:>6.2} {:>6.2}  {}",
            profile.key.as_str(),
            profile.focus_multiplier,
            profile.mood_weight,
            profile.streak_focus_bias,
            profile.planning_sensitivity,
            profile.tagline
        );
    }
    Ok(())
}

fn cmd_focus(
    config: &EngineConfig,
    preset: TimerPreset,
    minutes: Option<u32>,
    instant: bool,
) -> Result<(), MindflowCliError> {
    let mode = match minutes {
        Some(minutes) => FocusMode::custom(minutes)?,
        None => preset.into(),
    };
    let mut timer = FocusTimer::new(mode)?;

    let session = if instant {
        FocusSession::completed(timer.duration_seconds(), SystemClock.now())
    } else {
        eprintln!("{} started: {}", mode.label(), timer.display());
        timer.start();

        let (tx, rx) = mpsc::channel();
        let handle = Ticker::every(Duration::from_secs(1), move || {
            match timer.tick(SystemClock.now()) {
                TimerTick::Running { .. } => {
                    eprint!("\r{}", timer.display());
                    ControlFlow::Continue(())
                }
                TimerTick::Completed(session) => {
                    let _ = tx.send(session);
                    ControlFlow::Break(())
                }
                TimerTick::Idle => ControlFlow::Break(()),
            }
        });
        handle.wait();
        eprintln!();

        rx.recv().map_err(|_| MindflowCliError::TimerInterrupted)?
    };

    if config.data_dir.is_some() {
        let mut processor = open_processor(config)?;
        processor.record_focus_session(session.clone());
    } else {
        tracing::warn!("no data directory configured, session not persisted");
    }

    println!("{}", serde_json::to_string(&session)?);
    Ok(())
}

fn cmd_log_focus(config: &EngineConfig, minutes: u32, now: Option<&str>) -> Result<(), MindflowCliError> {
    let now = resolve_now(now)?;
    let mut processor = open_processor(config)?;
    processor.add_manual_focus(minutes, now);

    let total = processor.snapshot().focus_sessions.len();
    println!("Logged {} focus minutes ({} sessions recorded)", minutes, total);
    Ok(())
}

fn cmd_mood(config: &EngineConfig, label: &str, now: Option<&str>) -> Result<(), MindflowCliError> {
    let now = resolve_now(now)?;
    let mut processor = open_processor(config)?;
    processor.log_mood(label, now);

    println!("Mood logged: {}", label);
    Ok(())
}

fn cmd_doctor(
    config: &EngineConfig,
    config_path: Option<&Path>,
    profile: Option<&str>,
    json: bool,
) -> Result<(), MindflowCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("MindFlow engine {}", ENGINE_VERSION),
    });

    // The config already loaded, so a given path is valid
    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: match config_path {
            Some(path) => format!("Loaded {}", path.display()),
            None => "Using defaults".to_string(),
        },
    });

    let profile_check = match profile.map(str::parse::<ProfileKey>) {
        None => DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Ok,
            message: format!("Configured profile {}", config.profile),
        },
        Some(Ok(key)) => DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Ok,
            message: format!("Profile override {}", key),
        },
        Some(Err(e)) => DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    };
    checks.push(profile_check);

    match &config.data_dir {
        None => checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: "No data directory configured".to_string(),
        }),
        Some(dir) if !dir.is_dir() => checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist yet", dir.display()),
        }),
        Some(dir) => {
            checks.push(DoctorCheck {
                name: "data_dir".to_string(),
                status: CheckStatus::Ok,
                message: format!("Using {}", dir.display()),
            });
            for key in COLLECTION_KEYS {
                checks.push(check_collection(dir, key));
            }
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (report --input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("MindFlow Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MindflowCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

/// Inspect one persisted collection file
fn check_collection(dir: &Path, key: &str) -> DoctorCheck {
    let path = dir.join(format!("{key}.json"));
    let name = format!("store.{key}");

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return DoctorCheck {
                name,
                status: CheckStatus::Ok,
                message: "Not written yet".to_string(),
            };
        }
        Err(e) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Cannot read {}: {}", path.display(), e),
            };
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Array(items)) => DoctorCheck {
            name,
            status: CheckStatus::Ok,
            message: format!("{} records", items.len()),
        },
        Ok(_) => DoctorCheck {
            name,
            status: CheckStatus::Warning,
            message: "Not an array; will be read as empty".to_string(),
        },
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: format!("Invalid JSON: {}", e),
        },
    }
}

// Error handling

#[derive(Debug)]
enum MindflowCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoDataDir,
    TimerInterrupted,
    DoctorFailed,
}

impl From<io::Error> for MindflowCliError {
    fn from(e: io::Error) -> Self {
        MindflowCliError::Io(e)
    }
}

impl From<EngineError> for MindflowCliError {
    fn from(e: EngineError) -> Self {
        MindflowCliError::Engine(e)
    }
}

impl From<serde_json::Error> for MindflowCliError {
    fn from(e: serde_json::Error) -> Self {
        MindflowCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MindflowCliError> for CliError {
    fn from(e: MindflowCliError) -> Self {
        match e {
            MindflowCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MindflowCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MindflowCliError::Engine(e) => engine_error(e),
            MindflowCliError::NoDataDir => CliError {
                code: "NO_DATA_DIR".to_string(),
                message: "No data directory configured".to_string(),
                hint: Some("Pass --data-dir or set MINDFLOW_DATA_DIR".to_string()),
            },
            MindflowCliError::TimerInterrupted => CliError {
                code: "TIMER_INTERRUPTED".to_string(),
                message: "Focus timer stopped before completion".to_string(),
                hint: None,
            },
            MindflowCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn engine_error(e: EngineError) -> CliError {
    let (code, hint) = match &e {
        EngineError::ParseError(_) => ("PARSE_ERROR", Some("Check the snapshot JSON syntax")),
        EngineError::JsonError(_) => ("JSON_ERROR", None),
        EngineError::UnknownProfile(_) => (
            "UNKNOWN_PROFILE",
            Some("Run 'mindflow profiles' for the available profiles"),
        ),
        EngineError::InvalidTimestamp(_) => (
            "INVALID_TIMESTAMP",
            Some("Use RFC 3339, e.g. 2024-01-15T18:00:00+02:00"),
        ),
        EngineError::InvalidTimerDuration(_) => ("INVALID_DURATION", None),
        EngineError::TimerRunning => ("TIMER_RUNNING", None),
        EngineError::StorageError(_) => ("STORAGE_ERROR", Some("Check the data directory")),
        EngineError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        EngineError::ConfigError(_) => ("CONFIG_ERROR", Some("Run 'mindflow doctor' to inspect the config")),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: hint.map(str::to_string),
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
