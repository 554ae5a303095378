//! Append-only detection record sinks

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use super::result::{Detection, FeatureSet, ThreatLevel};

/// Record type emitted for alert-level (beacon) detections
pub const BEACON_RECORD_TYPE: &str = "repetitive_ultrasonic_beacon";

/// Structured detection record handed to a [`DetectionSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub frequency: f64,
    pub magnitude: f64,
    pub threat_level: ThreatLevel,
    pub features: FeatureSet,
    pub timestamp: DateTime<Local>,
}

impl DetectionRecord {
    pub fn beacon(detection: &Detection, threat_level: ThreatLevel) -> Self {
        Self {
            kind: BEACON_RECORD_TYPE.to_string(),
            frequency: detection.frequency,
            magnitude: detection.magnitude_db,
            threat_level,
            features: detection.features,
            timestamp: Local::now(),
        }
    }
}

/// Destination for detection records; storage format is up to the implementor
pub trait DetectionSink: Send {
    fn record(&mut self, record: &DetectionRecord);
}

/// Emits each record as pretty JSON through the `log` facade at warn level
#[derive(Debug, Default)]
pub struct LogSink;

impl DetectionSink for LogSink {
    fn record(&mut self, record: &DetectionRecord) {
        match serde_json::to_string_pretty(record) {
            Ok(json) => log::warn!("ULTRASONIC DETECTION: {}", json),
            Err(e) => log::error!("failed to serialize detection record: {}", e),
        }
    }
}

/// Shared in-memory sink; clones observe the same record list
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<DetectionRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DetectionRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DetectionSink for MemorySink {
    fn record(&mut self, record: &DetectionRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }
}

/// Sink that drops every record (file logging disabled)
#[derive(Debug, Default)]
pub struct NullSink;

impl DetectionSink for NullSink {
    fn record(&mut self, _record: &DetectionRecord) {}
}
