//! Console rendering of monitor activity

use chrono::{Local, TimeZone};
use colorful::Colorful;
use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::core::{AlertSurface, MonitorSnapshot, MonitorStatus, StatsSnapshot};
use crate::detection::{Detection, ThreatLevel};

const STATUS_INTERVAL: Duration = Duration::from_millis(500);

/// [`AlertSurface`] that prints to stdout
pub struct ConsoleSurface {
    last_status: Option<(Instant, ThreatLevel)>,
    min_interval: Duration,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::with_interval(STATUS_INTERVAL)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            last_status: None,
            min_interval,
        }
    }

    // Level changes always go out; repeats of the same level are throttled.
    fn should_print(&mut self, level: ThreatLevel, now: Instant) -> bool {
        let due = match self.last_status {
            None => true,
            Some((at, last_level)) => last_level != level || now.duration_since(at) >= self.min_interval,
        };
        if due {
            self.last_status = Some((now, level));
        }
        due
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSurface for ConsoleSurface {
    fn status(&mut self, level: ThreatLevel, message: &str) {
        if self.should_print(level, Instant::now()) {
            println!("{}", format_status(level, message));
        }
    }

    fn detection(&mut self, detection: &Detection) {
        println!("{}", format_detection(detection));
    }

    fn statistics(&mut self, stats: &StatsSnapshot) {
        println!("{}", format_statistics(stats));
    }
}

pub fn format_status(level: ThreatLevel, message: &str) -> String {
    let tag = format!("{} {}", level.symbol(), level.name().to_uppercase());
    let tag = match level {
        ThreatLevel::Normal => tag.green().to_string(),
        ThreatLevel::Warning => tag.yellow().to_string(),
        ThreatLevel::Alert => tag.red().bold().to_string(),
    };
    format!("[{}] {}", tag, message)
}

pub fn format_detection(detection: &Detection) -> String {
    let features = &detection.features;
    let mut output = String::new();

    output.push_str(&format!("\n{}\n", "ULTRASONIC DETECTION".red().bold()));
    output.push_str(&format!("  Time:      {}\n", clock_label(detection.timestamp)));
    output.push_str(&format!("  Frequency: {:.1} Hz\n", detection.frequency));
    output.push_str(&format!("  Magnitude: {:.1} dB\n", detection.magnitude_db));
    output.push_str(&format!(
        "  Features:  peak {:.1} dB | mean {:.1} dB | std {:.1} dB\n",
        features.peak_magnitude, features.mean_magnitude, features.std_magnitude
    ));
    output.push_str(&format!(
        "             centroid {:.1} | rolloff {:.0} | flatness {:.3}",
        features.spectral_centroid, features.spectral_rolloff, features.spectral_flatness
    ));
    output
}

pub fn format_statistics(stats: &StatsSnapshot) -> String {
    format!(
        "{} chunks: {} | detections: {} | runtime: {:.1}s",
        "Stats".cyan(),
        stats.chunks_processed,
        stats.total_detections,
        stats.runtime
    )
}

/// Multi-line summary of a snapshot for the periodic reporter and shutdown
pub fn format_snapshot_summary(snapshot: &MonitorSnapshot) -> String {
    let mut output = String::new();

    let status = match snapshot.status {
        MonitorStatus::Running => "running".green().to_string(),
        MonitorStatus::Stopped => "stopped".yellow().to_string(),
    };
    output.push_str(&format!("Monitor {}", status));
    if let Some(reason) = &snapshot.stop_reason {
        output.push_str(&format!(" ({}: {})", reason.kind, reason.message));
    }
    output.push('\n');
    output.push_str(&format!("  {}\n", format_statistics(&snapshot.stats)));

    let (min, max) = snapshot.active_config.ultrasonic_range;
    output.push_str(&format!(
        "  Band {:.0}-{:.0} Hz | threshold {:.1} dB | {} Hz\n",
        min, max, snapshot.active_config.threshold_db, snapshot.active_config.sample_rate
    ));

    if snapshot.recent_history.is_empty() {
        output.push_str("  No recent analysis\n");
    }
    for entry in &snapshot.recent_history {
        let peak = entry
            .detections
            .iter()
            .map(|d| d.frequency)
            .map(|f| format!("{:.1} Hz", f))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!(
            "  {} {:<7} {}\n",
            clock_label(entry.timestamp),
            entry.threat_level.name(),
            if peak.is_empty() { "-".to_string() } else { peak }
        ));
    }
    output
}

pub fn print_banner(config: &MonitorConfig) {
    let (min, max) = config.frequency_range();
    println!("{}", "SilentTrace ultrasonic monitor".cyan().bold());
    println!(
        "  Band: {:.0}-{:.0} Hz | Threshold: {:.1} dB | FFT: {} | Window: {:?}",
        min, max, config.detection.threshold_db, config.audio.fft_window_size, config.audio.window
    );
    println!("  Source: {}", config.system.socket_path.display());
    println!("  Press Ctrl-C (or type 'q' + Enter) to stop\n");
}

fn clock_label(timestamp: f64) -> String {
    match Local.timestamp_millis_opt((timestamp * 1000.0) as i64).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MonitorHandle;
    use crate::detection::FeatureSet;

    fn detection() -> Detection {
        Detection {
            frequency: 19500.25,
            magnitude_db: -12.5,
            peak_index: 140,
            timestamp: 1_700_000_000.0,
            features: FeatureSet::default(),
        }
    }

    #[test]
    fn test_status_throttling() {
        let mut surface = ConsoleSurface::with_interval(Duration::from_secs(10));
        let start = Instant::now();
        assert!(surface.should_print(ThreatLevel::Normal, start));
        assert!(!surface.should_print(ThreatLevel::Normal, start));
        // a level change is never throttled
        assert!(surface.should_print(ThreatLevel::Warning, start));
        assert!(surface.should_print(ThreatLevel::Warning, start + Duration::from_secs(11)));
    }

    #[test]
    fn test_format_detection() {
        let text = format_detection(&detection());
        assert!(text.contains("19500.2 Hz") || text.contains("19500.3 Hz"));
        assert!(text.contains("-12.5 dB"));
    }

    #[test]
    fn test_format_status_contains_message() {
        let text = format_status(ThreatLevel::Alert, "beacon");
        assert!(text.contains("ALERT"));
        assert!(text.ends_with("beacon"));
    }

    #[test]
    fn test_snapshot_summary() {
        let monitor = MonitorHandle::new(&MonitorConfig::default());
        let text = format_snapshot_summary(&monitor.snapshot());
        assert!(text.contains("stopped"));
        assert!(text.contains("No recent analysis"));
        assert!(text.contains("18000-22000 Hz"));
    }
}
