// tests/transport_test.rs
//
// Stream ingestion over in-memory readers and a real Unix socket.

mod test_utils;

use silenttrace::config::MonitorConfig;
use silenttrace::core::codec::FrameHeader;
use silenttrace::core::MonitorStatus;
use silenttrace::detection::ThreatLevel;
use silenttrace::testgen::FrameStreamBuilder;
use silenttrace::TransportError;
use test_utils::*;

fn stream() -> FrameStreamBuilder {
    FrameStreamBuilder::new(SAMPLE_RATE, CHUNK_FRAMES)
}

#[test]
fn test_stream_closure_stops_monitor() {
    let config = MonitorConfig::default();
    let bytes = stream().silence().silence().silence().build();
    let (mut ingest, monitor, _sink) = stream_ingest(&config, bytes);

    let err = ingest.run().unwrap_err();

    assert!(matches!(err, TransportError::Closed));
    assert_eq!(monitor.status(), MonitorStatus::Stopped);
    assert_eq!(monitor.stop_reason().unwrap().kind, "closed");
    assert_eq!(monitor.stats().chunks_processed, 3);
    assert_eq!(monitor.history_len(), 3);
}

#[test]
fn test_beacon_stream_raises_alert_record() {
    let config = MonitorConfig::default();
    let bytes = stream()
        .tone(19000.0, 0.5)
        .tone(19000.0, 0.5)
        .tone(19000.0, 0.5)
        .build();
    let (mut ingest, monitor, sink) = stream_ingest(&config, bytes);

    assert!(matches!(ingest.run(), Err(TransportError::Closed)));

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.recent_history.len(), 3);
    assert_eq!(snapshot.recent_history[0].threat_level, ThreatLevel::Alert);
    assert_eq!(snapshot.stats.total_detections, 3);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_malformed_header_terminates_loop() {
    let config = MonitorConfig::default();
    let bad = FrameHeader {
        timestamp_ms: 5,
        sample_rate: 0,
        frame_count: 16,
        channels: 1,
    }
    .encode();
    let bytes = stream()
        .silence()
        .silence()
        .raw(&bad)
        .raw(&[0u8; 32])
        .silence()
        .build();
    let (mut ingest, monitor, _sink) = stream_ingest(&config, bytes);

    let err = ingest.run().unwrap_err();

    assert!(matches!(err, TransportError::MalformedHeader { .. }));
    assert_eq!(monitor.stats().chunks_processed, 2);
    let reason = monitor.stop_reason().unwrap();
    assert_eq!(reason.kind, "malformed_header");
    assert!(reason.message.contains("sample rate"));
}

#[test]
fn test_truncated_header_is_malformed() {
    let config = MonitorConfig::default();
    let bytes = stream().silence().raw(&[1, 2, 3, 4, 5]).build();
    let (mut ingest, monitor, _sink) = stream_ingest(&config, bytes);

    assert!(matches!(
        ingest.run(),
        Err(TransportError::MalformedHeader { .. })
    ));
    assert_eq!(monitor.stats().chunks_processed, 1);
}

#[test]
fn test_truncated_payload_is_closed() {
    let config = MonitorConfig::default();
    let mut bytes = stream().silence().silence().build();
    bytes.truncate(bytes.len() - 100);
    let (mut ingest, monitor, _sink) = stream_ingest(&config, bytes);

    assert!(matches!(ingest.run(), Err(TransportError::Closed)));
    assert_eq!(monitor.stats().chunks_processed, 1);
}

#[test]
fn test_stereo_stream_is_downmixed() {
    let config = MonitorConfig::default();
    let bytes = stream().channels(2).tone(20000.0, 0.5).build();
    let (mut ingest, monitor, _sink) = stream_ingest(&config, bytes);

    assert!(ingest.run().is_err());

    let feed = monitor.detection_feed(10);
    assert_eq!(feed.len(), 1);
    assert!((feed[0].frequency - 20000.0).abs() <= BIN_WIDTH);
}

#[cfg(unix)]
mod unix_socket {
    use super::*;
    use silenttrace::core::{connect_unix, MonitorHandle, NullSurface, Pipeline, ShutdownSignal, StreamIngest};
    use silenttrace::detection::NullSink;
    use silenttrace::MonitorError;
    use std::io::Write;
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn socket_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "silenttrace-{}-{}.sock",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn pipeline(config: &MonitorConfig, monitor: &MonitorHandle) -> Pipeline {
        Pipeline::new(config, monitor.clone(), Box::new(NullSink), Box::new(NullSurface))
    }

    #[test]
    fn test_socket_stream_until_close() {
        let path = socket_path("close");
        let listener = UnixListener::bind(&path).unwrap();
        let bytes = stream().tone(19000.0, 0.5).silence().build();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            // write in uneven pieces to exercise short reads
            for piece in bytes.chunks(1000) {
                conn.write_all(piece).unwrap();
            }
        });

        let config = MonitorConfig::builder()
            .socket_path(&path)
            .reconnect(3, 0.05)
            .build()
            .unwrap();
        let stream = connect_unix(&config.system).unwrap();
        let monitor = MonitorHandle::new(&config);
        let mut ingest = StreamIngest::new(stream, pipeline(&config, &monitor), ShutdownSignal::new());

        assert!(matches!(ingest.run(), Err(TransportError::Closed)));
        server.join().unwrap();

        assert_eq!(monitor.stats().chunks_processed, 2);
        assert_eq!(monitor.stats().total_detections, 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_shutdown_while_idle_is_cancelled() {
        let path = socket_path("idle");
        let listener = UnixListener::bind(&path).unwrap();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let server = thread::spawn(move || {
            let (_conn, _) = listener.accept().unwrap();
            // hold the connection open without sending anything
            let _ = done_rx.recv_timeout(Duration::from_secs(10));
        });

        let config = MonitorConfig::builder()
            .socket_path(&path)
            .read_timeout_ms(50)
            .build()
            .unwrap();
        let stream = connect_unix(&config.system).unwrap();
        let monitor = MonitorHandle::new(&config);
        let shutdown = ShutdownSignal::new();
        let mut ingest = StreamIngest::new(stream, pipeline(&config, &monitor), shutdown.clone());

        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            shutdown.trigger();
        });

        assert_eq!(ingest.run().unwrap(), 0);
        assert_eq!(monitor.stop_reason().unwrap().kind, "cancelled");

        trigger.join().unwrap();
        done_tx.send(()).unwrap();
        server.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_connect_failure_after_retries() {
        let path = socket_path("missing");
        let config = MonitorConfig::builder()
            .socket_path(&path)
            .reconnect(2, 0.0)
            .build()
            .unwrap();

        match connect_unix(&config.system) {
            Err(MonitorError::ConnectFailed { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected ConnectFailed, got {:?}", other.map(|_| ())),
        }
    }
}
