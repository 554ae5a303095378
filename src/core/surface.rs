// src/core/surface.rs
//
// Alert surfacing collaborator: where status lines, detailed detections and
// running statistics go. Rendering is left to the implementor.

use super::history::StatsSnapshot;
use crate::detection::{Detection, ThreatLevel};

pub trait AlertSurface: Send {
    /// One-line status for the chunk just processed
    fn status(&mut self, level: ThreatLevel, message: &str);

    /// Rich view of a detection; called at most once per alert cooldown
    fn detection(&mut self, detection: &Detection);

    /// Periodic running statistics
    fn statistics(&mut self, stats: &StatsSnapshot);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSurface;

impl AlertSurface for NullSurface {
    fn status(&mut self, _level: ThreatLevel, _message: &str) {}

    fn detection(&mut self, _detection: &Detection) {}

    fn statistics(&mut self, _stats: &StatsSnapshot) {}
}

/// Status text for a chunk's threat level
pub fn status_message(level: ThreatLevel, detections: &[Detection]) -> String {
    match (level, detections.first()) {
        (ThreatLevel::Normal, _) | (_, None) => "Listening... | Normal ambient noise".to_string(),
        (ThreatLevel::Warning, Some(first)) => {
            format!("Ultrasound spike at {:.1}Hz detected!", first.frequency)
        }
        (ThreatLevel::Alert, Some(_)) => {
            "Repetitive ultrasonic pulses detected (possible beacon signal)".to_string()
        }
    }
}
