//! Command-line arguments and their mapping onto [`MonitorConfig`]

use clap::Parser;
use std::path::PathBuf;

use crate::config::{MonitorConfig, MonitorConfigBuilder};
use crate::core::dsp::WindowFunction;
use crate::error::ConfigError;

/// Environment variable that enables debug logging (`1`, `true` or `yes`)
pub const DEBUG_ENV: &str = "SILENTTRACE_DEBUG";

#[derive(Parser, Debug, Clone)]
#[command(name = "silenttrace")]
#[command(version, about = "Real-time ultrasonic acoustic surveillance monitor")]
pub struct Args {
    /// Unix socket of the audio capture process
    #[arg(short, long, env = "SILENTTRACE_SOCKET", default_value = "/tmp/silenttrace.sock")]
    pub socket: PathBuf,

    /// Absolute dB floor a peak must exceed
    #[arg(
        short = 't',
        long,
        env = "SILENTTRACE_THRESHOLD_DB",
        default_value_t = -40.0,
        allow_hyphen_values = true
    )]
    pub threshold_db: f64,

    /// Lower edge of the monitored band in Hz
    #[arg(long, default_value_t = 18000.0)]
    pub min_freq: f64,

    /// Upper edge of the monitored band in Hz
    #[arg(long, default_value_t = 22000.0)]
    pub max_freq: f64,

    /// Expected capture sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// FFT window length in samples
    #[arg(long, default_value_t = 4096)]
    pub fft_size: usize,

    /// Analysis window (hann, hamming, blackman, rectangular)
    #[arg(long, default_value = "hann", value_parser = parse_window)]
    pub window: WindowFunction,

    /// Minimum normalized peak height (0-1)
    #[arg(long, default_value_t = 0.1)]
    pub min_peak_height: f64,

    /// Minimum distance between peaks in bins
    #[arg(long, default_value_t = 100)]
    pub min_peak_distance: usize,

    /// Detections within the repetition window needed for a pattern
    #[arg(long, default_value_t = 3)]
    pub repetition_threshold: usize,

    /// Repetition window in seconds
    #[arg(long, default_value_t = 10.0)]
    pub repetition_window: f64,

    /// Seconds between detailed detection reports
    #[arg(long, default_value_t = 5.0)]
    pub cooldown: f64,

    /// Do not log alert-level detections as JSON records
    #[arg(long)]
    pub no_file_logging: bool,

    /// Number of analysed chunks kept in history
    #[arg(long, default_value_t = 1000)]
    pub history_capacity: usize,

    /// Connection attempts before giving up
    #[arg(long, default_value_t = 5)]
    pub reconnect_attempts: u32,

    /// Seconds between connection attempts
    #[arg(long, default_value_t = 2.0)]
    pub reconnect_delay: f64,

    /// Print a monitor snapshot every N seconds
    #[arg(long)]
    pub report_interval: Option<f64>,

    /// Dump the final monitor snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the arguments into a validated configuration
    pub fn to_config(&self) -> Result<MonitorConfig, ConfigError> {
        MonitorConfigBuilder::new()
            .socket_path(self.socket.clone())
            .threshold_db(self.threshold_db)
            .ultrasonic_band(self.min_freq, self.max_freq)
            .sample_rate(self.sample_rate)
            .fft_window_size(self.fft_size)
            .window(self.window)
            .min_peak_height(self.min_peak_height)
            .min_peak_distance(self.min_peak_distance)
            .repetition(self.repetition_threshold, self.repetition_window)
            .alert_cooldown_sec(self.cooldown)
            .file_logging(!self.no_file_logging)
            .history_capacity(self.history_capacity)
            .reconnect(self.reconnect_attempts, self.reconnect_delay)
            .build()
    }

    /// Debug logging requested by flag or environment
    pub fn debug_requested(&self) -> bool {
        self.verbose || env_flag(std::env::var(DEBUG_ENV).ok().as_deref())
    }
}

fn parse_window(name: &str) -> Result<WindowFunction, String> {
    WindowFunction::from_name(name).ok_or_else(|| format!("Unknown window function: {}", name))
}

fn env_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["silenttrace"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_resolve_to_default_config() {
        let args = parse(&["--socket", "/tmp/silenttrace.sock", "--threshold-db", "-40"]);
        let config = args.to_config().unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--socket",
            "/run/capture.sock",
            "--threshold-db",
            "-55.5",
            "--window",
            "blackman",
            "--no-file-logging",
            "--json",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.system.socket_path, PathBuf::from("/run/capture.sock"));
        assert_eq!(config.detection.threshold_db, -55.5);
        assert_eq!(config.audio.window, WindowFunction::Blackman);
        assert!(!config.alerts.enable_file_logging);
        assert!(args.json);
    }

    #[test]
    fn test_unknown_window_rejected() {
        assert!(Args::try_parse_from(["silenttrace", "--window", "kaiser"]).is_err());
    }

    #[test]
    fn test_invalid_band_fails_validation() {
        let args = parse(&["--min-freq", "21000", "--max-freq", "19000"]);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_env_flag_values() {
        assert!(env_flag(Some("1")));
        assert!(env_flag(Some("TRUE")));
        assert!(env_flag(Some("yes")));
        assert!(!env_flag(Some("0")));
        assert!(!env_flag(None));
    }
}
