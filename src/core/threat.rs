// src/core/threat.rs
//
// Sliding-window classification of per-chunk detections into a threat level.

use std::collections::VecDeque;

use super::dsp::stats::population_std;
use crate::config::MonitorConfig;
use crate::detection::{Detection, ThreatLevel};

/// Bounded FIFO of raw detections used only for pattern evaluation
#[derive(Debug, Clone)]
pub struct DetectionHistory {
    entries: VecDeque<Detection>,
    capacity: usize,
}

impl DetectionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest detection when full
    pub fn push(&mut self, detection: Detection) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(detection);
    }

    /// Detections with `now - timestamp <= window_sec` (linear scan)
    pub fn recent(&self, now: f64, window_sec: f64) -> impl Iterator<Item = &Detection> + '_ {
        self.entries
            .iter()
            .filter(move |d| now - d.timestamp <= window_sec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> + '_ {
        self.entries.iter()
    }
}

/// Outcome of evaluating one chunk's detections
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub level: ThreatLevel,
    /// Whether the first detection should get a detailed surfacing
    /// (cooldown elapsed)
    pub surface_detail: bool,
    /// Detections inside the repetition window after this chunk
    pub recent_count: usize,
    /// Frequency spread of the recent detections, when repetitive
    pub frequency_std: Option<f64>,
}

impl Evaluation {
    fn quiet() -> Self {
        Self {
            level: ThreatLevel::Normal,
            surface_detail: false,
            recent_count: 0,
            frequency_std: None,
        }
    }
}

/// Turns a stream of per-chunk detections into threat levels.
///
/// The level is recomputed on every call from the new detections plus the
/// bounded history; nothing latches between chunks.
#[derive(Debug, Clone)]
pub struct ThreatEvaluator {
    history: DetectionHistory,
    repetition_threshold: usize,
    repetition_window_sec: f64,
    beacon_max_std_hz: f64,
    cooldown_sec: f64,
    last_surface_time: Option<f64>,
}

impl ThreatEvaluator {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            history: DetectionHistory::new(config.history.detection_history_capacity),
            repetition_threshold: config.detection.repetition_threshold.max(1),
            repetition_window_sec: config.detection.repetition_window_sec,
            beacon_max_std_hz: config.detection.beacon_max_std_hz,
            cooldown_sec: config.alerts.alert_cooldown_sec,
            last_surface_time: None,
        }
    }

    /// Classify `detections` observed at wall-clock time `now` (seconds).
    ///
    /// Empty input is `Normal` and leaves the history untouched. Otherwise
    /// every detection joins the history; if at least `repetition_threshold`
    /// history entries fall inside the repetition window the pattern is
    /// repetitive, and it is an `Alert` when their frequencies cluster within
    /// `beacon_max_std_hz`, else a `Warning`. Fewer recent entries is a
    /// `Warning`.
    pub fn evaluate(&mut self, detections: &[Detection], now: f64) -> Evaluation {
        if detections.is_empty() {
            return Evaluation::quiet();
        }

        for detection in detections {
            self.history.push(detection.clone());
        }

        let frequencies: Vec<f64> = self
            .history
            .recent(now, self.repetition_window_sec)
            .map(|d| d.frequency)
            .collect();

        let (level, frequency_std) = if frequencies.len() >= self.repetition_threshold {
            let std = population_std(&frequencies);
            let level = if std < self.beacon_max_std_hz {
                ThreatLevel::Alert
            } else {
                ThreatLevel::Warning
            };
            (level, Some(std))
        } else {
            (ThreatLevel::Warning, None)
        };

        let surface_detail = match self.last_surface_time {
            Some(last) => now - last > self.cooldown_sec,
            None => true,
        };
        if surface_detail {
            self.last_surface_time = Some(now);
        }

        Evaluation {
            level,
            surface_detail,
            recent_count: frequencies.len(),
            frequency_std,
        }
    }

    pub fn history(&self) -> &DetectionHistory {
        &self.history
    }

    pub fn last_surface_time(&self) -> Option<f64> {
        self.last_surface_time
    }
}
