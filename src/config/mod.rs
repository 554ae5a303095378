//! Configuration module for SilentTrace

mod settings;

pub use settings::{
    AlertSettings, AudioSettings, DetectionSettings, HistorySettings, MonitorConfig,
    MonitorConfigBuilder, SystemSettings,
};
