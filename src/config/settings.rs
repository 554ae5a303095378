// src/config/settings.rs
//
// Resolved monitor settings. Built once at startup and passed by reference
// into every component constructor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::dsp::WindowFunction;
use crate::error::ConfigError;

/// Audio stream and spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Expected capture sample rate in Hz
    pub sample_rate: u32,
    /// Expected capture channel count
    pub channels: u32,
    /// FFT length in samples
    pub fft_window_size: usize,
    /// Lower edge of the ultrasonic band (inclusive)
    pub ultrasonic_min_freq: f64,
    /// Upper edge of the ultrasonic band (inclusive)
    pub ultrasonic_max_freq: f64,
    pub window: WindowFunction,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            fft_window_size: 4096,
            ultrasonic_min_freq: 18000.0,
            ultrasonic_max_freq: 22000.0,
            window: WindowFunction::Hann,
        }
    }
}

/// Peak detection and pattern classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Absolute dB floor a peak must exceed
    pub threshold_db: f64,
    /// Minimum normalized (0-1) peak height
    pub min_peak_height: f64,
    /// Minimum separation between peaks, in bins
    pub min_peak_distance: usize,
    /// Recent detections needed to call a pattern repetitive
    pub repetition_threshold: usize,
    pub repetition_window_sec: f64,
    /// Frequency spread (population std, Hz) below which a repetition is a beacon
    pub beacon_max_std_hz: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_peak_height: 0.1,
            min_peak_distance: 100,
            repetition_threshold: 3,
            repetition_window_sec: 10.0,
            beacon_max_std_hz: 100.0,
        }
    }
}

/// Alert surfacing and detection logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Persist alert-level detections to the detection sink
    pub enable_file_logging: bool,
    /// Minimum time between detailed detection surfacings
    pub alert_cooldown_sec: f64,
    /// Emit running statistics every N chunks (0 disables)
    pub statistics_every_chunks: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enable_file_logging: true,
            alert_cooldown_sec: 5.0,
            statistics_every_chunks: 10,
        }
    }
}

/// History retention and snapshot shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// HistoryStore ring capacity
    pub capacity: usize,
    /// Raw detections retained for pattern evaluation
    pub detection_history_capacity: usize,
    pub snapshot_window_sec: f64,
    /// Entries included in a presentation snapshot
    pub snapshot_entries: usize,
    pub detection_feed_limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: 1000,
            detection_history_capacity: 50,
            snapshot_window_sec: 60.0,
            snapshot_entries: 10,
            detection_feed_limit: 20,
        }
    }
}

/// Transport and connection handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub socket_path: PathBuf,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_sec: f64,
    /// Socket read timeout used to poll for shutdown (0 = block indefinitely)
    pub read_timeout_ms: u64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/silenttrace.sock"),
            max_reconnect_attempts: 5,
            reconnect_delay_sec: 2.0,
            read_timeout_ms: 250,
        }
    }
}

/// Complete resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub audio: AudioSettings,
    pub detection: DetectionSettings,
    pub alerts: AlertSettings,
    pub history: HistorySettings,
    pub system: SystemSettings,
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }

    /// Ultrasonic band as `(min, max)` Hz
    pub fn frequency_range(&self) -> (f64, f64) {
        (self.audio.ultrasonic_min_freq, self.audio.ultrasonic_max_freq)
    }

    pub fn is_ultrasonic_freq(&self, frequency: f64) -> bool {
        let (min, max) = self.frequency_range();
        (min..=max).contains(&frequency)
    }

    /// Reject values that would make a component degenerate
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(ConfigError::invalid("audio.sample_rate", "must be non-zero"));
        }
        if audio.channels == 0 {
            return Err(ConfigError::invalid("audio.channels", "must be non-zero"));
        }
        if audio.fft_window_size < 2 {
            return Err(ConfigError::invalid(
                "audio.fft_window_size",
                format!("must be at least 2, got {}", audio.fft_window_size),
            ));
        }
        if !audio.ultrasonic_min_freq.is_finite()
            || !audio.ultrasonic_max_freq.is_finite()
            || audio.ultrasonic_min_freq < 0.0
        {
            return Err(ConfigError::invalid(
                "audio.ultrasonic_min_freq",
                "band edges must be finite and non-negative",
            ));
        }
        if audio.ultrasonic_min_freq > audio.ultrasonic_max_freq {
            return Err(ConfigError::invalid(
                "audio.ultrasonic_max_freq",
                format!(
                    "band is inverted ({} > {})",
                    audio.ultrasonic_min_freq, audio.ultrasonic_max_freq
                ),
            ));
        }

        let detection = &self.detection;
        if !detection.threshold_db.is_finite() {
            return Err(ConfigError::invalid("detection.threshold_db", "must be finite"));
        }
        if !(0.0..=1.0).contains(&detection.min_peak_height) {
            return Err(ConfigError::invalid(
                "detection.min_peak_height",
                format!("must lie in [0, 1], got {}", detection.min_peak_height),
            ));
        }
        if detection.min_peak_distance == 0 {
            return Err(ConfigError::invalid("detection.min_peak_distance", "must be at least 1 bin"));
        }
        if detection.repetition_threshold == 0 {
            return Err(ConfigError::invalid("detection.repetition_threshold", "must be at least 1"));
        }
        if !(detection.repetition_window_sec.is_finite() && detection.repetition_window_sec >= 0.0) {
            return Err(ConfigError::invalid(
                "detection.repetition_window_sec",
                "must be finite and non-negative",
            ));
        }
        if !(detection.beacon_max_std_hz.is_finite() && detection.beacon_max_std_hz > 0.0) {
            return Err(ConfigError::invalid("detection.beacon_max_std_hz", "must be positive"));
        }

        if !(self.alerts.alert_cooldown_sec.is_finite() && self.alerts.alert_cooldown_sec >= 0.0) {
            return Err(ConfigError::invalid(
                "alerts.alert_cooldown_sec",
                "must be finite and non-negative",
            ));
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::invalid("history.capacity", "must be at least 1"));
        }
        if self.history.detection_history_capacity == 0 {
            return Err(ConfigError::invalid(
                "history.detection_history_capacity",
                "must be at least 1",
            ));
        }

        if self.system.max_reconnect_attempts == 0 {
            return Err(ConfigError::invalid("system.max_reconnect_attempts", "must be at least 1"));
        }
        if !(self.system.reconnect_delay_sec.is_finite() && self.system.reconnect_delay_sec >= 0.0) {
            return Err(ConfigError::invalid(
                "system.reconnect_delay_sec",
                "must be finite and non-negative",
            ));
        }

        Ok(())
    }
}

/// Fluent builder over [`MonitorConfig`]
#[derive(Debug, Clone, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.config.audio.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u32) -> Self {
        self.config.audio.channels = channels;
        self
    }

    pub fn fft_window_size(mut self, size: usize) -> Self {
        self.config.audio.fft_window_size = size;
        self
    }

    pub fn ultrasonic_band(mut self, min_freq: f64, max_freq: f64) -> Self {
        self.config.audio.ultrasonic_min_freq = min_freq;
        self.config.audio.ultrasonic_max_freq = max_freq;
        self
    }

    pub fn window(mut self, window: WindowFunction) -> Self {
        self.config.audio.window = window;
        self
    }

    pub fn threshold_db(mut self, threshold: f64) -> Self {
        self.config.detection.threshold_db = threshold;
        self
    }

    pub fn min_peak_height(mut self, height: f64) -> Self {
        self.config.detection.min_peak_height = height;
        self
    }

    pub fn min_peak_distance(mut self, bins: usize) -> Self {
        self.config.detection.min_peak_distance = bins;
        self
    }

    pub fn repetition(mut self, threshold: usize, window_sec: f64) -> Self {
        self.config.detection.repetition_threshold = threshold;
        self.config.detection.repetition_window_sec = window_sec;
        self
    }

    pub fn beacon_max_std_hz(mut self, std_hz: f64) -> Self {
        self.config.detection.beacon_max_std_hz = std_hz;
        self
    }

    pub fn file_logging(mut self, enabled: bool) -> Self {
        self.config.alerts.enable_file_logging = enabled;
        self
    }

    pub fn alert_cooldown_sec(mut self, cooldown: f64) -> Self {
        self.config.alerts.alert_cooldown_sec = cooldown;
        self
    }

    pub fn statistics_every_chunks(mut self, every: u64) -> Self {
        self.config.alerts.statistics_every_chunks = every;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history.capacity = capacity;
        self
    }

    pub fn detection_history_capacity(mut self, capacity: usize) -> Self {
        self.config.history.detection_history_capacity = capacity;
        self
    }

    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.system.socket_path = path.into();
        self
    }

    pub fn reconnect(mut self, attempts: u32, delay_sec: f64) -> Self {
        self.config.system.max_reconnect_attempts = attempts;
        self.config.system.reconnect_delay_sec = delay_sec;
        self
    }

    pub fn read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.system.read_timeout_ms = timeout_ms;
        self
    }

    /// Validate and return the finished configuration
    pub fn build(self) -> Result<MonitorConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
