// src/core/history.rs
//
// Bounded analysis history and the shared monitor state read by the
// presentation side. One writer (the ingestion loop) and any number of
// readers share a single mutex; entries are immutable `Arc`s so readers only
// hold the lock long enough to clone pointers.

use chrono::{Local, TimeZone};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::dsp::SpectrumFrame;
use super::wall_clock_secs;
use crate::config::MonitorConfig;
use crate::detection::{FeatureSet, HistoryEntry, ThreatLevel};
use crate::error::TransportError;

/// Fixed-capacity FIFO ring of analysis results.
///
/// Insertion order is the only ordering key. Time-windowed queries are a
/// linear scan over at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<Arc<HistoryEntry>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when at capacity
    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Arc::new(entry));
    }

    /// Entries with `timestamp >= now - window_sec`, oldest first
    pub fn recent(&self, window_sec: f64) -> Vec<Arc<HistoryEntry>> {
        self.recent_at(window_sec, wall_clock_secs())
    }

    pub fn recent_at(&self, window_sec: f64, now: f64) -> Vec<Arc<HistoryEntry>> {
        let cutoff = now - window_sec;
        self.entries
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<Arc<HistoryEntry>> {
        self.entries.back().cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<HistoryEntry>> + '_ {
        self.entries.iter()
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
}

/// Whether the ingestion loop is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Running,
    Stopped,
}

/// Why the ingestion loop terminated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopReason {
    pub kind: String,
    pub message: String,
}

impl StopReason {
    pub fn from_error(err: &TransportError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Aggregate counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Wall-clock seconds when the monitor was created
    pub start_time: f64,
    pub chunks_processed: u64,
    pub total_detections: u64,
    /// Seconds since `start_time`
    pub runtime: f64,
}

/// Key thresholds echoed to readers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEcho {
    pub ultrasonic_range: (f64, f64),
    pub threshold_db: f64,
    pub sample_rate: u32,
    pub min_peak_height: f64,
    pub repetition_threshold: usize,
    pub repetition_window_sec: f64,
}

impl ConfigEcho {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            ultrasonic_range: config.frequency_range(),
            threshold_db: config.detection.threshold_db,
            sample_rate: config.audio.sample_rate,
            min_peak_height: config.detection.min_peak_height,
            repetition_threshold: config.detection.repetition_threshold,
            repetition_window_sec: config.detection.repetition_window_sec,
        }
    }
}

/// Pull-style view of the monitor for a presentation collaborator
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub status: MonitorStatus,
    pub stop_reason: Option<StopReason>,
    pub stats: StatsSnapshot,
    /// Most recent first, truncated
    pub recent_history: Vec<Arc<HistoryEntry>>,
    pub active_config: ConfigEcho,
}

/// Flattened detection row for tabular display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionFeedItem {
    pub timestamp: f64,
    /// Local `HH:MM:SS`
    pub time_label: String,
    /// Hz, rounded to 0.1
    pub frequency: f64,
    /// dB, rounded to 0.1
    pub magnitude: f64,
    pub threat_level: ThreatLevel,
    pub features: FeatureSet,
}

#[derive(Debug)]
struct MonitorState {
    history: HistoryStore,
    status: MonitorStatus,
    stop_reason: Option<StopReason>,
    start_time: f64,
    chunks_processed: u64,
    total_detections: u64,
}

impl MonitorState {
    fn stats_at(&self, now: f64) -> StatsSnapshot {
        StatsSnapshot {
            start_time: self.start_time,
            chunks_processed: self.chunks_processed,
            total_detections: self.total_detections,
            runtime: (now - self.start_time).max(0.0),
        }
    }
}

/// Cloneable handle to the shared history and counters
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    state: Arc<Mutex<MonitorState>>,
    echo: Arc<ConfigEcho>,
    snapshot_window_sec: f64,
    snapshot_entries: usize,
}

impl MonitorHandle {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_start_time(config, wall_clock_secs())
    }

    pub fn with_start_time(config: &MonitorConfig, start_time: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MonitorState {
                history: HistoryStore::new(config.history.capacity),
                status: MonitorStatus::Stopped,
                stop_reason: None,
                start_time,
                chunks_processed: 0,
                total_detections: 0,
            })),
            echo: Arc::new(ConfigEcho::from_config(config)),
            snapshot_window_sec: config.history.snapshot_window_sec,
            snapshot_entries: config.history.snapshot_entries,
        }
    }

    // Critical sections never leave the state half-updated, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mark_running(&self) {
        let mut state = self.lock();
        state.status = MonitorStatus::Running;
        state.stop_reason = None;
    }

    pub fn mark_stopped(&self, reason: Option<StopReason>) {
        let mut state = self.lock();
        state.status = MonitorStatus::Stopped;
        state.stop_reason = reason;
    }

    /// Append one pipeline result and bump the counters under a single lock
    pub fn record_chunk(&self, entry: HistoryEntry, now: f64) -> StatsSnapshot {
        let detections = entry.detections.len() as u64;
        let mut state = self.lock();
        state.history.append(entry);
        state.chunks_processed += 1;
        state.total_detections += detections;
        state.stats_at(now)
    }

    pub fn status(&self) -> MonitorStatus {
        self.lock().status
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.lock().stop_reason.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.lock().stats_at(wall_clock_secs())
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Entries within `window_sec` of now, oldest first
    pub fn recent(&self, window_sec: f64) -> Vec<Arc<HistoryEntry>> {
        self.recent_at(window_sec, wall_clock_secs())
    }

    pub fn recent_at(&self, window_sec: f64, now: f64) -> Vec<Arc<HistoryEntry>> {
        self.lock().history.recent_at(window_sec, now)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot_at(wall_clock_secs())
    }

    pub fn snapshot_at(&self, now: f64) -> MonitorSnapshot {
        let (status, stop_reason, stats, recent) = {
            let state = self.lock();
            (
                state.status,
                state.stop_reason.clone(),
                state.stats_at(now),
                state.history.recent_at(self.snapshot_window_sec, now),
            )
        };

        let recent_history = recent
            .into_iter()
            .rev()
            .take(self.snapshot_entries)
            .collect();

        MonitorSnapshot {
            status,
            stop_reason,
            stats,
            recent_history,
            active_config: (*self.echo).clone(),
        }
    }

    /// Sub-band of the most recent chunk, if any
    pub fn latest_spectrum(&self) -> Option<SpectrumFrame> {
        let latest = self.lock().history.latest();
        latest.map(|entry| entry.spectrum.clone())
    }

    /// Detections from the snapshot window, most recent first
    pub fn detection_feed(&self, limit: usize) -> Vec<DetectionFeedItem> {
        self.detection_feed_at(limit, wall_clock_secs())
    }

    pub fn detection_feed_at(&self, limit: usize, now: f64) -> Vec<DetectionFeedItem> {
        let recent = self.recent_at(self.snapshot_window_sec, now);

        let mut items: Vec<DetectionFeedItem> = recent
            .iter()
            .flat_map(|entry| {
                entry.detections.iter().map(|d| DetectionFeedItem {
                    timestamp: d.timestamp,
                    time_label: time_label(d.timestamp),
                    frequency: round_tenth(d.frequency),
                    magnitude: round_tenth(d.magnitude_db),
                    threat_level: entry.threat_level,
                    features: d.features,
                })
            })
            .collect();

        items.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        items.truncate(limit);
        items
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn time_label(timestamp: f64) -> String {
    let millis = (timestamp * 1000.0) as i64;
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
