// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

pub use args::{Args, DEBUG_ENV};
pub use output::{
    format_detection, format_snapshot_summary, format_statistics, format_status, print_banner,
    ConsoleSurface,
};

use anyhow::{Context, Result};
use colorful::Colorful;
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::{MonitorHandle, Pipeline, ShutdownSignal, StreamIngest};
use crate::detection::{DetectionSink, LogSink, NullSink};
use crate::error::{MonitorError, TransportError};

const POLL_STEP: Duration = Duration::from_millis(100);

/// Connect to the capture source and monitor until the stream ends
#[cfg(unix)]
pub fn run(args: Args) -> Result<()> {
    let config = args.to_config().context("Invalid configuration")?;
    print_banner(&config);

    let stream = crate::core::connect_unix(&config.system).map_err(|e| {
        println!("{}", "Could not reach the audio capture process.".red());
        println!("Make sure it is running and listening on {}", config.system.socket_path.display());
        e
    })?;

    let monitor = MonitorHandle::new(&config);
    let shutdown = ShutdownSignal::new();
    ctrlc::set_handler(interrupt_handler(shutdown.clone()))
        .context("Failed to install interrupt handler")?;
    spawn_stdin_watcher(shutdown.clone());

    let reporter = match args.report_interval {
        Some(secs) if secs > 0.0 => Some(spawn_reporter(
            monitor.clone(),
            shutdown.clone(),
            Duration::from_secs_f64(secs),
            config.history.detection_feed_limit,
        )),
        _ => None,
    };

    let sink: Box<dyn DetectionSink> = if config.alerts.enable_file_logging {
        Box::new(LogSink)
    } else {
        Box::new(NullSink)
    };
    let pipeline = Pipeline::new(&config, monitor.clone(), sink, Box::new(ConsoleSurface::new()));
    let mut ingest = StreamIngest::new(stream, pipeline, shutdown.clone());

    let result = ingest.run();
    if let Err(e) = ingest.into_inner().shutdown(std::net::Shutdown::Both) {
        log::debug!("socket shutdown: {}", e);
    }

    shutdown.trigger();
    if let Some(handle) = reporter {
        if handle.join().is_err() {
            log::warn!("snapshot reporter thread panicked");
        }
    }

    let snapshot = monitor.snapshot();
    println!("\n{}", format_snapshot_summary(&snapshot));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    exit_outcome(result)
}

/// Closed and cancelled streams are a clean exit; anything else is an error
fn exit_outcome(result: Result<u64, TransportError>) -> Result<()> {
    match result {
        Ok(_) | Err(TransportError::Closed) | Err(TransportError::Cancelled) => Ok(()),
        Err(e) => Err(MonitorError::from(e)).context("Audio stream terminated abnormally"),
    }
}

#[cfg(not(unix))]
pub fn run(_args: Args) -> Result<()> {
    anyhow::bail!("SilentTrace requires Unix domain socket support")
}

/// SIGINT handler. The ingestion loop sees the flag on its next read timeout
/// and stops with `Cancelled`.
fn interrupt_handler(shutdown: ShutdownSignal) -> impl FnMut() + Send + 'static {
    move || {
        log::info!("interrupt received, stopping");
        shutdown.trigger();
    }
}

/// Trigger shutdown when `q` or `quit` is entered. End of input is ignored so
/// the monitor keeps running with a detached stdin.
fn spawn_stdin_watcher(shutdown: ShutdownSignal) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if matches!(line.trim(), "q" | "quit") {
                log::info!("shutdown requested from console");
                shutdown.trigger();
                break;
            }
        }
    });
}

fn spawn_reporter(
    monitor: MonitorHandle,
    shutdown: ShutdownSignal,
    every: Duration,
    feed_limit: usize,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut waited = Duration::ZERO;
        while !shutdown.is_triggered() {
            thread::sleep(POLL_STEP);
            waited += POLL_STEP;
            if waited < every {
                continue;
            }
            waited = Duration::ZERO;

            println!("{}", format_snapshot_summary(&monitor.snapshot()));
            for item in monitor.detection_feed(feed_limit) {
                println!(
                    "    {} {:.1} Hz {:.1} dB [{}]",
                    item.time_label,
                    item.frequency,
                    item.magnitude,
                    item.threat_level
                );
            }
        }
    })
}
