// src/core/ingest.rs
//
// Ingestion loop: read framed chunks, run the analysis pipeline, evaluate
// the detection pattern, fire side effects and publish into the shared
// history. Everything runs on the calling thread; the only blocking points
// are the header and payload reads.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::analyzer::ChunkAnalyzer;
use super::codec::{AudioChunk, FrameReader};
use super::history::{MonitorHandle, StopReason};
use super::surface::{status_message, AlertSurface};
use super::threat::{Evaluation, ThreatEvaluator};
use super::wall_clock_secs;
use crate::config::MonitorConfig;
use crate::detection::{DetectionRecord, DetectionSink, HistoryEntry, ThreatLevel};
use crate::error::TransportError;

/// Cooperative stop flag shared between the ingestion loop and its owners
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What one pipeline pass produced
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub level: ThreatLevel,
    pub detections: usize,
    pub evaluation: Evaluation,
}

/// Analysis, evaluation and publication for a single chunk at a time
pub struct Pipeline {
    analyzer: ChunkAnalyzer,
    evaluator: ThreatEvaluator,
    monitor: MonitorHandle,
    sink: Box<dyn DetectionSink>,
    surface: Box<dyn AlertSurface>,
    log_alerts: bool,
    statistics_every: u64,
}

impl Pipeline {
    pub fn new(
        config: &MonitorConfig,
        monitor: MonitorHandle,
        sink: Box<dyn DetectionSink>,
        surface: Box<dyn AlertSurface>,
    ) -> Self {
        Self {
            analyzer: ChunkAnalyzer::new(config),
            evaluator: ThreatEvaluator::new(config),
            monitor,
            sink,
            surface,
            log_alerts: config.alerts.enable_file_logging,
            statistics_every: config.alerts.statistics_every_chunks,
        }
    }

    /// Run one chunk through the whole pipeline at wall-clock time `now`
    pub fn process_chunk(&mut self, chunk: &AudioChunk, now: f64) -> ChunkOutcome {
        let analysis = self.analyzer.analyze(chunk, now);
        let evaluation = self.evaluator.evaluate(&analysis.detections, now);
        let level = evaluation.level;

        self.surface
            .status(level, &status_message(level, &analysis.detections));

        if evaluation.surface_detail {
            if let Some(first) = analysis.detections.first() {
                self.surface.detection(first);
            }
        }

        if level == ThreatLevel::Alert {
            log::warn!(
                "beacon pattern: {} recent detection(s), spread {:.1} Hz",
                evaluation.recent_count,
                evaluation.frequency_std.unwrap_or_default()
            );
            if self.log_alerts {
                for detection in &analysis.detections {
                    self.sink.record(&DetectionRecord::beacon(detection, level));
                }
            }
        }

        let detections = analysis.detections.len();
        let stats = self.monitor.record_chunk(
            HistoryEntry {
                spectrum: analysis.sub_band,
                detections: analysis.detections,
                threat_level: level,
                timestamp: now,
            },
            now,
        );

        if self.statistics_every > 0 && stats.chunks_processed % self.statistics_every == 0 {
            self.surface.statistics(&stats);
        }

        ChunkOutcome {
            level,
            detections,
            evaluation,
        }
    }

    pub fn monitor(&self) -> &MonitorHandle {
        &self.monitor
    }

    pub fn evaluator(&self) -> &ThreatEvaluator {
        &self.evaluator
    }
}

/// Drives a [`Pipeline`] from a framed byte stream until it ends
pub struct StreamIngest<R> {
    reader: FrameReader<R>,
    pipeline: Pipeline,
}

impl<R: Read> StreamIngest<R> {
    pub fn new(stream: R, pipeline: Pipeline, shutdown: ShutdownSignal) -> Self {
        Self {
            reader: FrameReader::new(stream, shutdown),
            pipeline,
        }
    }

    /// Process chunks until the stream ends, fails or shutdown is requested.
    ///
    /// Returns the number of chunks processed when stopped by the shutdown
    /// signal; any other termination is returned as the transport error.
    /// Either way the monitor is left in the `Stopped` state with the reason
    /// recorded, and everything already appended stays in the history.
    pub fn run(&mut self) -> Result<u64, TransportError> {
        log::info!("SilentTrace analysis started");
        self.pipeline.monitor().mark_running();

        let mut processed = 0u64;
        let err = loop {
            match self.reader.read_chunk() {
                Ok(chunk) => {
                    self.pipeline.process_chunk(&chunk, wall_clock_secs());
                    processed += 1;
                }
                Err(e) => break e,
            }
        };

        match &err {
            TransportError::Cancelled => log::info!("analysis interrupted by shutdown request"),
            TransportError::Closed => log::info!("capture source closed the stream"),
            other => log::error!("ingestion stopped: {}", other),
        }

        self.pipeline
            .monitor()
            .mark_stopped(Some(StopReason::from_error(&err)));
        log::info!("SilentTrace analysis stopped after {} chunk(s)", processed);

        match err {
            TransportError::Cancelled => Ok(processed),
            other => Err(other),
        }
    }

    /// Give back the underlying stream (dropping it releases the socket)
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Call `connect` up to `attempts` times, sleeping `delay` between failures.
///
/// On exhaustion returns the attempt count and the last error.
pub fn retry_connect<T, F>(attempts: u32, delay: Duration, mut connect: F) -> Result<T, (u32, io::Error)>
where
    F: FnMut(u32) -> io::Result<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match connect(attempt) {
            Ok(conn) => return Ok(conn),
            Err(e) if attempt >= attempts => return Err((attempt, e)),
            Err(e) => {
                log::warn!(
                    "connection attempt {}/{} failed: {}; retrying in {:.1}s",
                    attempt,
                    attempts,
                    e,
                    delay.as_secs_f64()
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(unix)]
pub use unix::connect_unix;

#[cfg(unix)]
mod unix {
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    use super::retry_connect;
    use crate::config::SystemSettings;
    use crate::error::MonitorError;

    /// Connect to the capture socket with bounded retries.
    ///
    /// The returned stream has a read timeout of `read_timeout_ms` so the
    /// ingestion loop can observe shutdown while idle.
    pub fn connect_unix(settings: &SystemSettings) -> Result<UnixStream, MonitorError> {
        let delay = Duration::from_secs_f64(settings.reconnect_delay_sec.max(0.0));
        let path = &settings.socket_path;

        let stream = retry_connect(settings.max_reconnect_attempts, delay, |attempt| {
            log::debug!("connecting to {} (attempt {})", path.display(), attempt);
            UnixStream::connect(path)
        })
        .map_err(|(attempts, source)| MonitorError::ConnectFailed {
            path: path.clone(),
            attempts,
            source,
        })?;

        if settings.read_timeout_ms > 0 {
            stream
                .set_read_timeout(Some(Duration::from_millis(settings.read_timeout_ms)))
                .map_err(|source| MonitorError::ConnectFailed {
                    path: path.clone(),
                    attempts: 1,
                    source,
                })?;
        }

        log::info!("connected to audio capture source at {}", path.display());
        Ok(stream)
    }
}
