//! Error types for the monitoring pipeline.
//!
//! Per-sample problems while building the reference store are not errors:
//! they are reported as [`crate::store::SampleOutcome`]s. Everything here is
//! either a misconfiguration or a failure the run cannot continue past.

use std::path::PathBuf;
use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Two encodings of different length were compared. This points at a
    /// mismatched encoder pairing, never at a legitimate non-match.
    #[error("encoding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The frame source could not deliver a frame.
    #[error("capture failed: {0}")]
    Capture(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot read config file {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure of a [`crate::store::FaceEncoder`] on one reference sample.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot decode sample: {0}")]
    Decode(String),
}
