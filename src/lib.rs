//! SilentTrace - Real-time ultrasonic acoustic surveillance monitor
//!
//! Consumes framed PCM audio from a local capture process, looks for energy
//! in the near-ultrasonic band (18-22 kHz by default) and classifies what it
//! finds as ambient noise, an isolated spike, or a repetitive beacon.
//!
//! ## Module Structure
//!
//! - `core` - Frame codec, spectral analysis, peak extraction, threat
//!   evaluation, history and the ingestion loop
//! - `cli` - Command-line interface and console output
//! - `config` - Monitor configuration and builder
//! - `detection` - Detection value types and detection sinks
//! - `testgen` - Synthetic tones and frame streams
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use silenttrace::config::MonitorConfig;
//! use silenttrace::core::{MonitorHandle, NullSurface, Pipeline, ShutdownSignal, StreamIngest};
//! use silenttrace::detection::LogSink;
//!
//! let config = MonitorConfig::builder().threshold_db(-45.0).build()?;
//! let stream = silenttrace::core::connect_unix(&config.system)?;
//!
//! let monitor = MonitorHandle::new(&config);
//! let pipeline = Pipeline::new(&config, monitor.clone(), Box::new(LogSink), Box::new(NullSurface));
//! let mut ingest = StreamIngest::new(stream, pipeline, ShutdownSignal::new());
//!
//! ingest.run()?;
//! println!("{} chunks analysed", monitor.stats().chunks_processed);
//! ```
//!
//! ## Threat Levels
//!
//! | Level   | Meaning                                                  |
//! |---------|----------------------------------------------------------|
//! | Normal  | No peak above threshold in the band                      |
//! | Warning | Isolated peaks, or repeated peaks at scattered frequencies |
//! | Alert   | Repeated peaks at a stable frequency (beacon pattern)    |

// Core analysis pipeline
pub mod core;

// Command-line interface
pub mod cli;

// Monitor configuration
pub mod config;

// Detection value types and sinks
pub mod detection;

// Error types
pub mod error;

// Synthetic signal generation
pub mod testgen;

// Re-export commonly used types at crate root for convenience
pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use detection::{Detection, DetectionRecord, DetectionSink, FeatureSet, HistoryEntry, ThreatLevel};
pub use error::{ConfigError, MonitorError, TransportError};
pub use core::{
    AudioChunk, FrameHeader, FrameReader, MonitorHandle, MonitorSnapshot, MonitorStatus,
    PeakExtractor, Pipeline, ShutdownSignal, SpectralAnalyzer, SpectrumFrame, StreamIngest,
    ThreatEvaluator, WindowFunction,
};
