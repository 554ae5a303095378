//! Detection module for SilentTrace

mod result;
mod sink;

pub use result::{Detection, FeatureSet, HistoryEntry, ThreatLevel};
pub use sink::{DetectionRecord, DetectionSink, LogSink, MemorySink, NullSink, BEACON_RECORD_TYPE};
