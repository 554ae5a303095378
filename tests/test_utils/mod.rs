// tests/test_utils/mod.rs
//
// Shared helpers for the integration tests: pipeline construction with
// in-memory collaborators and a surface that records what it was shown.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use silenttrace::config::MonitorConfig;
use silenttrace::core::{
    AlertSurface, AudioChunk, MonitorHandle, Pipeline, ShutdownSignal, StatsSnapshot, StreamIngest,
};
use silenttrace::detection::{Detection, MemorySink, ThreatLevel};
use silenttrace::testgen::sine_pcm;

pub const SAMPLE_RATE: u32 = 44100;
pub const CHUNK_FRAMES: usize = 4096;
pub const BIN_WIDTH: f64 = SAMPLE_RATE as f64 / CHUNK_FRAMES as f64;

/// Everything an [`AlertSurface`] was asked to show
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub statuses: Vec<(ThreatLevel, String)>,
    pub detections: Vec<Detection>,
    pub statistics: Vec<StatsSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn statuses(&self) -> Vec<(ThreatLevel, String)> {
        self.log.lock().unwrap().statuses.clone()
    }

    pub fn detections(&self) -> Vec<Detection> {
        self.log.lock().unwrap().detections.clone()
    }

    pub fn statistics(&self) -> Vec<StatsSnapshot> {
        self.log.lock().unwrap().statistics.clone()
    }
}

impl AlertSurface for RecordingSurface {
    fn status(&mut self, level: ThreatLevel, message: &str) {
        self.log.lock().unwrap().statuses.push((level, message.to_string()));
    }

    fn detection(&mut self, detection: &Detection) {
        self.log.lock().unwrap().detections.push(detection.clone());
    }

    fn statistics(&mut self, stats: &StatsSnapshot) {
        self.log.lock().unwrap().statistics.push(*stats);
    }
}

/// A pipeline wired to in-memory collaborators
pub struct Harness {
    pub pipeline: Pipeline,
    pub monitor: MonitorHandle,
    pub sink: MemorySink,
    pub surface: RecordingSurface,
}

pub fn harness(config: &MonitorConfig) -> Harness {
    let monitor = MonitorHandle::with_start_time(config, 0.0);
    let sink = MemorySink::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(
        config,
        monitor.clone(),
        Box::new(sink.clone()),
        Box::new(surface.clone()),
    );
    Harness {
        pipeline,
        monitor,
        sink,
        surface,
    }
}

/// Stream ingestion over an in-memory byte buffer
pub fn stream_ingest(
    config: &MonitorConfig,
    bytes: Vec<u8>,
) -> (StreamIngest<std::io::Cursor<Vec<u8>>>, MonitorHandle, MemorySink) {
    let monitor = MonitorHandle::new(config);
    let sink = MemorySink::new();
    let pipeline = Pipeline::new(
        config,
        monitor.clone(),
        Box::new(sink.clone()),
        Box::new(RecordingSurface::default()),
    );
    let ingest = StreamIngest::new(std::io::Cursor::new(bytes), pipeline, ShutdownSignal::new());
    (ingest, monitor, sink)
}

/// Decoded mono chunk holding a quantized sine tone
pub fn tone_chunk(frequency: f64, amplitude: f64) -> AudioChunk {
    let pcm = sine_pcm(frequency, amplitude, SAMPLE_RATE, CHUNK_FRAMES);
    AudioChunk {
        timestamp: 0,
        sample_rate: SAMPLE_RATE,
        channel_count: 1,
        samples: pcm.iter().map(|&s| s as f32 / 32768.0).collect(),
    }
}

pub fn silent_chunk() -> AudioChunk {
    AudioChunk {
        timestamp: 0,
        sample_rate: SAMPLE_RATE,
        channel_count: 1,
        samples: vec![0.0; CHUNK_FRAMES],
    }
}
