//! Error types
//!
//! Failures the controller can report, and the persisted entry log's errors.

use thiserror::Error;

/// Errors surfaced by the recording controller
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Screen capture is not supported in your browser. Please use Chrome, Edge, or Firefox.")]
    CapabilityUnavailable,

    #[error("A recording session is already active")]
    SessionActive,

    #[error("Error starting screen capture: {0}")]
    SourceAcquisitionFailed(String),

    #[error("Recorder error: {0}")]
    Recorder(String),

    #[error("No recording at index {0}")]
    UnknownRecording(usize),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the persisted entry log
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Stored recordings list is not valid JSON: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type alias using RecorderError
pub type RecorderResult<T> = Result<T, RecorderError>;
