//! Report encoding
//!
//! Wraps a [`MetricsReport`] in a payload carrying producer metadata, ready to
//! hand to the presentation layer as JSON.

use crate::error::EngineError;
use crate::metrics::MetricsReport;
use crate::profile::ProfileKey;
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    /// Identifies the engine instance that produced the payload
    pub instance_id: String,
}

/// Encoded engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub engine_version: String,
    pub producer: ReportProducer,
    /// The "now" the report was computed for (RFC 3339)
    pub computed_at: String,
    pub profile: ProfileKey,
    pub report: MetricsReport,
}

/// Encoder producing report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a report computed at `now`
    pub fn encode(&self, report: MetricsReport, now: DateTime<FixedOffset>) -> ReportPayload {
        ReportPayload {
            engine_version: ENGINE_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at: now.to_rfc3339(),
            profile: report.profile,
            report,
        }
    }

    /// Encode to compact JSON
    pub fn encode_to_json(
        &self,
        report: MetricsReport,
        now: DateTime<FixedOffset>,
    ) -> Result<String, EngineError> {
        let payload = self.encode(report, now);
        serde_json::to_string(&payload).map_err(EngineError::JsonError)
    }

    /// Encode to indented JSON
    pub fn encode_to_json_pretty(
        &self,
        report: MetricsReport,
        now: DateTime<FixedOffset>,
    ) -> Result<String, EngineError> {
        let payload = self.encode(report, now);
        serde_json::to_string_pretty(&payload).map_err(EngineError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_report;
    use crate::profile::BehavioralProfile;
    use crate::types::Snapshot;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T18:00:00+02:00").unwrap()
    }

    fn report() -> MetricsReport {
        compute_report(&Snapshot::default(), &BehavioralProfile::default(), now())
    }

    #[test]
    fn test_encode_payload_metadata() {
        let encoder = ReportEncoder::with_instance_id("test-instance");
        let payload = encoder.encode(report(), now());

        assert_eq!(payload.engine_version, ENGINE_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.computed_at, "2024-01-15T18:00:00+02:00");
        assert_eq!(payload.profile, ProfileKey::Speedsters);
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(
            ReportEncoder::new().instance_id(),
            ReportEncoder::new().instance_id()
        );
    }

    #[test]
    fn test_fixed_instance_is_byte_identical() {
        let encoder = ReportEncoder::with_instance_id("fixed");
        let a = encoder.encode_to_json(report(), now()).unwrap();
        let b = encoder.encode_to_json(report(), now()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pretty_json_parses_back() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json_pretty(report(), now()).unwrap();
        let payload: ReportPayload = serde_json::from_str(&json).unwrap();
        let expected = report();
        assert_eq!(payload.report.narrative, expected.narrative);
        assert_eq!(payload.report.classification.habit_signature, expected.classification.habit_signature);
        assert_eq!(payload.report.scores.productivity_score, expected.scores.productivity_score);
    }
}
