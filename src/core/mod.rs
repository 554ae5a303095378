//! Core ingestion and analysis pipeline

pub mod analyzer;
pub mod codec;
pub mod dsp;
pub mod history;
pub mod ingest;
pub mod peaks;
pub mod surface;
pub mod threat;

pub use analyzer::{ChunkAnalysis, ChunkAnalyzer};
pub use codec::{AudioChunk, FrameHeader, FrameReader, HEADER_LEN};
pub use dsp::{SpectralAnalyzer, SpectrumFrame, WindowFunction};
pub use history::{
    ConfigEcho, DetectionFeedItem, HistoryStore, MonitorHandle, MonitorSnapshot, MonitorStatus,
    StatsSnapshot, StopReason,
};
pub use ingest::{retry_connect, ChunkOutcome, Pipeline, ShutdownSignal, StreamIngest};
pub use peaks::{compute_features, PeakExtractor};
pub use surface::{AlertSurface, NullSurface};
pub use threat::{DetectionHistory, Evaluation, ThreatEvaluator};

#[cfg(unix)]
pub use ingest::connect_unix;

/// Current wall-clock time in fractional seconds since the Unix epoch
pub fn wall_clock_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}
