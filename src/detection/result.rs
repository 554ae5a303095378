//! Detection value types shared by the pipeline and its readers

use serde::{Deserialize, Serialize};

use crate::core::dsp::SpectrumFrame;

/// Coarse classification of the current detection pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    /// No significant ultrasonic peaks in this chunk
    Normal,
    /// Peaks present, but not a tight repeating pattern
    Warning,
    /// Repeated peaks clustered in frequency (possible beacon)
    Alert,
}

impl ThreatLevel {
    pub fn name(&self) -> &'static str {
        match self {
            ThreatLevel::Normal => "normal",
            ThreatLevel::Warning => "warning",
            ThreatLevel::Alert => "alert",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ThreatLevel::Normal => "✅",
            ThreatLevel::Warning => "⚠️ ",
            ThreatLevel::Alert => "🚨",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Spectral shape descriptors of one sub-band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub peak_magnitude: f64,
    pub mean_magnitude: f64,
    /// Population standard deviation of the dB magnitudes
    pub std_magnitude: f64,
    /// Magnitude-weighted mean bin index
    pub spectral_centroid: f64,
    /// First bin index holding 85% of the cumulative magnitude
    pub spectral_rolloff: f64,
    /// Geometric over arithmetic mean of the linear magnitudes
    pub spectral_flatness: f64,
}

/// One significant peak found in a chunk's sub-band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frequency: f64,
    pub magnitude_db: f64,
    /// Index into the sub-band the peak was found in
    pub peak_index: usize,
    /// Wall-clock seconds at detection time
    pub timestamp: f64,
    pub features: FeatureSet,
}

/// Result of one pipeline pass, retained by the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Ultrasonic sub-band of the chunk
    pub spectrum: SpectrumFrame,
    pub detections: Vec<Detection>,
    pub threat_level: ThreatLevel,
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_ordering() {
        assert!(ThreatLevel::Normal < ThreatLevel::Warning);
        assert!(ThreatLevel::Warning < ThreatLevel::Alert);
    }

    #[test]
    fn test_threat_level_serializes_lowercase() {
        let json = serde_json::to_string(&ThreatLevel::Alert).unwrap();
        assert_eq!(json, "\"alert\"");
        assert_eq!(ThreatLevel::Warning.to_string(), "warning");
    }
}
