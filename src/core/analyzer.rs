// src/core/analyzer.rs
//
// Per-chunk analysis: spectrum, ultrasonic sub-band, peaks and features.

use super::codec::AudioChunk;
use super::dsp::{SpectralAnalyzer, SpectrumFrame};
use super::peaks::{compute_features, PeakExtractor};
use crate::config::MonitorConfig;
use crate::detection::{Detection, FeatureSet};

/// Everything derived from one chunk before pattern evaluation
#[derive(Debug, Clone)]
pub struct ChunkAnalysis {
    pub sub_band: SpectrumFrame,
    /// Indices into `sub_band`
    pub peaks: Vec<usize>,
    pub features: FeatureSet,
    pub detections: Vec<Detection>,
}

/// Runs the spectral and peak stages for each incoming chunk
pub struct ChunkAnalyzer {
    spectral: SpectralAnalyzer,
    peaks: PeakExtractor,
    min_freq: f64,
    max_freq: f64,
    expected_sample_rate: u32,
    expected_channels: u32,
    rate_mismatch_logged: bool,
    channel_mismatch_logged: bool,
}

impl ChunkAnalyzer {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            spectral: SpectralAnalyzer::new(config.audio.fft_window_size, config.audio.window),
            peaks: PeakExtractor::from_settings(&config.detection),
            min_freq: config.audio.ultrasonic_min_freq,
            max_freq: config.audio.ultrasonic_max_freq,
            expected_sample_rate: config.audio.sample_rate,
            expected_channels: config.audio.channels,
            rate_mismatch_logged: false,
            channel_mismatch_logged: false,
        }
    }

    /// Analyze one chunk; detections are stamped with `now` (wall-clock seconds).
    ///
    /// Bin frequencies follow the sample rate declared by the chunk itself,
    /// and any channel count is down-mixed.
    pub fn analyze(&mut self, chunk: &AudioChunk, now: f64) -> ChunkAnalysis {
        self.check_format(chunk);

        let mono = chunk.mono();
        let spectrum = self.spectral.analyze(&mono, chunk.sample_rate);
        let sub_band = spectrum.sub_band(self.min_freq, self.max_freq);

        let peaks = self.peaks.find_peaks(&sub_band);
        let features = compute_features(&sub_band);

        let detections = peaks
            .iter()
            .map(|&i| Detection {
                frequency: sub_band.frequencies[i],
                magnitude_db: sub_band.magnitudes_db[i],
                peak_index: i,
                timestamp: now,
                features,
            })
            .collect();

        log::debug!(
            "chunk ts={}ms: {} sub-band bins, {} peak(s), peak {:.1} dB",
            chunk.timestamp,
            sub_band.len(),
            peaks.len(),
            features.peak_magnitude
        );

        ChunkAnalysis {
            sub_band,
            peaks,
            features,
            detections,
        }
    }

    // Each kind of mismatch is reported once per analyzer.
    fn check_format(&mut self, chunk: &AudioChunk) {
        if chunk.sample_rate != self.expected_sample_rate && !self.rate_mismatch_logged {
            log::warn!(
                "chunk sample rate {} Hz differs from configured {} Hz; using the chunk's rate",
                chunk.sample_rate,
                self.expected_sample_rate
            );
            self.rate_mismatch_logged = true;
        }
        if chunk.channel_count != self.expected_channels && !self.channel_mismatch_logged {
            log::warn!(
                "chunk has {} channel(s), configured for {}; down-mixing to mono",
                chunk.channel_count,
                self.expected_channels
            );
            self.channel_mismatch_logged = true;
        }
    }
}
