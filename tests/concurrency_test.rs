// tests/concurrency_test.rs
//
// Readers take snapshots while the ingestion loop is writing.

mod test_utils;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use silenttrace::config::MonitorConfig;
use silenttrace::core::MonitorStatus;
use test_utils::*;

#[test]
fn test_snapshots_during_ingestion_are_consistent() {
    let config = MonitorConfig::builder()
        .history_capacity(8)
        .build()
        .unwrap();
    let mut h = harness(&config);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let monitor = h.monitor.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut observed = 0u64;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = monitor.snapshot_at(1_000.0);
                    // most recent first, never more than configured
                    assert!(snapshot.recent_history.len() <= 10);
                    for pair in snapshot.recent_history.windows(2) {
                        assert!(pair[0].timestamp > pair[1].timestamp);
                    }
                    assert!(snapshot.stats.chunks_processed >= observed);
                    observed = snapshot.stats.chunks_processed;
                    assert!(monitor.history_len() <= 8);
                }
                observed
            })
        })
        .collect();

    h.monitor.mark_running();
    let tone = tone_chunk(19000.0, 0.5);
    let silence = silent_chunk();
    for i in 0..40 {
        let chunk = if i % 4 == 0 { &tone } else { &silence };
        h.pipeline.process_chunk(chunk, 950.0 + i as f64);
    }
    h.monitor.mark_stopped(None);
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        let observed = reader.join().unwrap();
        assert!(observed <= 40);
    }

    let snapshot = h.monitor.snapshot_at(1_000.0);
    assert_eq!(snapshot.status, MonitorStatus::Stopped);
    assert_eq!(snapshot.stats.chunks_processed, 40);
    assert_eq!(snapshot.stats.total_detections, 10);
    assert_eq!(h.monitor.history_len(), 8);
}
