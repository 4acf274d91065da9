//! Engine configuration
//!
//! `EngineConfig` is what a host or the CLI loads (JSON file, then flag and
//! environment overrides). `EngineOptions` is the slice the pure engine reads.

use crate::error::EngineError;
use crate::profile::ProfileKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default streak lookback window in days
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Default number of days in the weekly focus curve and daily average
pub const DEFAULT_WEEK_DAYS: u32 = 7;

/// Longest accepted streak lookback window
pub const MAX_LOOKBACK_DAYS: u32 = 366;

/// Longest accepted focus curve
pub const MAX_WEEK_DAYS: u32 = 31;

/// Default tracing filter for the CLI
pub const DEFAULT_LOG_FILTER: &str = "mindflow_engine=info,mindflow=info";

/// Options the metrics engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Days walked backward when computing streaks
    pub lookback_days: u32,
    /// Days in the focus curve; also the divisor of the daily focus average
    pub week_days: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            week_days: DEFAULT_WEEK_DAYS,
        }
    }
}

impl EngineOptions {
    /// Both windows pulled into `1..=MAX`
    pub fn clamped(&self) -> Self {
        Self {
            lookback_days: self.lookback_days.clamp(1, MAX_LOOKBACK_DAYS),
            week_days: self.week_days.clamp(1, MAX_WEEK_DAYS),
        }
    }
}

/// Host-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Selected behavioral profile
    pub profile: ProfileKey,
    pub lookback_days: u32,
    pub week_days: u32,
    /// Directory backing the local file store, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Tracing filter directive
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: ProfileKey::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            week_days: DEFAULT_WEEK_DAYS,
            data_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(EngineError::ConfigError(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if !(1..=MAX_WEEK_DAYS).contains(&self.week_days) {
            return Err(EngineError::ConfigError(format!(
                "week_days must be between 1 and {MAX_WEEK_DAYS}, got {}",
                self.week_days
            )));
        }
        Ok(())
    }

    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            lookback_days: self.lookback_days,
            week_days: self.week_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.profile, ProfileKey::Speedsters);
        assert_eq!(config.options(), EngineOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"profile": "Hipsters"}"#).unwrap();
        assert_eq!(config.profile, ProfileKey::Hipsters);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = EngineConfig::from_json(r#"{"lookback_days": 0}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let result = EngineConfig::from_json(r#"{"lookback_days": 120000000}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
        let result = EngineConfig::from_json(r#"{"week_days": 32}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));

        let config = EngineConfig::from_json(r#"{"lookback_days": 366, "week_days": 31}"#).unwrap();
        assert_eq!(config.options().lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn test_options_clamped() {
        let options = EngineOptions {
            lookback_days: u32::MAX,
            week_days: 0,
        };
        assert_eq!(
            options.clamped(),
            EngineOptions {
                lookback_days: MAX_LOOKBACK_DAYS,
                week_days: 1,
            }
        );
        assert_eq!(EngineOptions::default().clamped(), EngineOptions::default());
    }

    #[test]
    fn test_unknown_profile_rejected() {
        let result = EngineConfig::from_json(r#"{"profile": "Wizards"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindflow.json");
        std::fs::write(&path, r#"{"profile": "Engineers", "week_days": 5}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.profile, ProfileKey::Engineers);
        assert_eq!(config.options().week_days, 5);
    }
}
