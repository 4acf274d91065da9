//! Behavioral profiles
//!
//! A profile is a fixed set of four multipliers that scale raw metrics toward a
//! behavioral archetype. Selecting one has no side effects beyond which
//! multipliers the engine reads; the engine always receives it explicitly.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys of the built-in profile table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKey {
    /// Deep-focus specialists
    Shadows,
    /// Fast execution bursts
    #[default]
    Speedsters,
    /// Logical task precision
    Engineers,
    /// Creative flow cycles
    Hipsters,
}

impl ProfileKey {
    pub const ALL: [ProfileKey; 4] = [
        ProfileKey::Shadows,
        ProfileKey::Speedsters,
        ProfileKey::Engineers,
        ProfileKey::Hipsters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKey::Shadows => "Shadows",
            ProfileKey::Speedsters => "Speedsters",
            ProfileKey::Engineers => "Engineers",
            ProfileKey::Hipsters => "Hipsters",
        }
    }

    /// Resolve the profile this key names
    pub fn profile(&self) -> BehavioralProfile {
        match self {
            ProfileKey::Shadows => BehavioralProfile {
                key: *self,
                tagline: "Deep-focus specialists.",
                focus_multiplier: 1.12,
                mood_weight: 0.9,
                streak_focus_bias: 1.1,
                planning_sensitivity: 0.8,
                suggested_block: "20:00–22:00",
            },
            ProfileKey::Speedsters => BehavioralProfile {
                key: *self,
                tagline: "Fast execution bursts.",
                focus_multiplier: 1.08,
                mood_weight: 0.85,
                streak_focus_bias: 0.95,
                planning_sensitivity: 1.1,
                suggested_block: "09:35–11:10",
            },
            ProfileKey::Engineers => BehavioralProfile {
                key: *self,
                tagline: "Logical task precision.",
                focus_multiplier: 1.06,
                mood_weight: 1.0,
                streak_focus_bias: 1.25,
                planning_sensitivity: 0.7,
                suggested_block: "09:00–11:00",
            },
            ProfileKey::Hipsters => BehavioralProfile {
                key: *self,
                tagline: "Creative flow cycles.",
                focus_multiplier: 1.04,
                mood_weight: 1.4,
                streak_focus_bias: 0.9,
                planning_sensitivity: 1.2,
                suggested_block: "13:00–15:00",
            },
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownProfile(s.to_string()))
    }
}

/// Multipliers applied to raw metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BehavioralProfile {
    pub key: ProfileKey,
    pub tagline: &'static str,
    /// Scales total focus time
    pub focus_multiplier: f64,
    /// Scales the mood average and its weight in the productivity score
    pub mood_weight: f64,
    /// Scales the displayed streak
    pub streak_focus_bias: f64,
    /// Scales planner load
    pub planning_sensitivity: f64,
    /// Highest-yield focus window used by the forecast
    pub suggested_block: &'static str,
}

impl BehavioralProfile {
    /// All multipliers at 1.0, keyed as the default profile
    pub fn neutral() -> Self {
        Self {
            focus_multiplier: 1.0,
            mood_weight: 1.0,
            streak_focus_bias: 1.0,
            planning_sensitivity: 1.0,
            ..ProfileKey::default().profile()
        }
    }
}

impl Default for BehavioralProfile {
    fn default() -> Self {
        ProfileKey::default().profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_speedsters() {
        assert_eq!(BehavioralProfile::default().key, ProfileKey::Speedsters);
        assert_eq!(BehavioralProfile::default().mood_weight, 0.85);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("hipsters".parse::<ProfileKey>().unwrap(), ProfileKey::Hipsters);
        assert_eq!(" Shadows ".parse::<ProfileKey>().unwrap(), ProfileKey::Shadows);
        assert!(matches!(
            "wizards".parse::<ProfileKey>(),
            Err(EngineError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_table_multipliers_positive() {
        for key in ProfileKey::ALL {
            let p = key.profile();
            assert_eq!(p.key, key);
            assert!(p.focus_multiplier > 0.0);
            assert!(p.mood_weight > 0.0);
            assert!(p.streak_focus_bias > 0.0);
            assert!(p.planning_sensitivity > 0.0);
        }
    }

    #[test]
    fn test_neutral_profile() {
        let p = BehavioralProfile::neutral();
        assert_eq!(p.focus_multiplier, 1.0);
        assert_eq!(p.mood_weight, 1.0);
        assert_eq!(p.streak_focus_bias, 1.0);
        assert_eq!(p.planning_sensitivity, 1.0);
    }

    #[test]
    fn test_key_serialization() {
        assert_eq!(
            serde_json::to_string(&ProfileKey::Engineers).unwrap(),
            "\"Engineers\""
        );
    }
}
