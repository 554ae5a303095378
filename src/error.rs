// src/error.rs
//
// Typed errors for the ingestion transport, connection setup and configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading framed audio from the capture stream
#[derive(Debug, Error)]
pub enum TransportError {
    /// Zero-length read: the capture source closed the stream
    #[error("stream closed by capture source")]
    Closed,

    /// Header bytes did not decode to the documented frame layout
    #[error("malformed frame header: {reason}")]
    MalformedHeader { reason: String },

    /// Shutdown was requested while waiting on the stream
    #[error("ingestion cancelled by shutdown request")]
    Cancelled,

    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// Short label used for the terminal status reported to readers
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Closed => "closed",
            TransportError::MalformedHeader { .. } => "malformed_header",
            TransportError::Cancelled => "cancelled",
            TransportError::Io(_) => "io_error",
        }
    }
}

/// Invalid resolved configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level monitor failure
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Initial connection could not be established within the attempt budget
    #[error("failed to connect to capture source at {path} after {attempts} attempt(s): {source}")]
    ConnectFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::malformed("expected 24 header bytes, got 16");
        assert_eq!(
            err.to_string(),
            "malformed frame header: expected 24 header bytes, got 16"
        );
        assert_eq!(err.kind(), "malformed_header");
        assert_eq!(TransportError::Closed.kind(), "closed");
    }

    #[test]
    fn test_connect_failed_display() {
        let err = MonitorError::ConnectFailed {
            path: PathBuf::from("/tmp/silenttrace.sock"),
            attempts: 5,
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let text = err.to_string();
        assert!(text.contains("/tmp/silenttrace.sock"));
        assert!(text.contains("5 attempt(s)"));
    }
}
