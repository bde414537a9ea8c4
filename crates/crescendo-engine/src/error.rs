//! Error types for crescendo-engine.

use thiserror::Error;

/// Error type for analysis engine operations.
///
/// Only some of these abort a request: decode, structural, timeout, and
/// worker faults surface as a `Failure` status; metadata/tempo absence only
/// degrades a result to `PartialFailure`. Every outcome reaches the
/// requester through its notification channel - nothing here crosses a task
/// boundary as a panic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Invalid buffer: {0}")]
    InvalidBuffer(#[from] crescendo_dsp::MetricsError),

    #[error("Metadata unavailable")]
    MetadataUnavailable,

    #[error("Tempo unavailable")]
    TempoUnavailable,

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Worker fault: {0}")]
    WorkerFault(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Analysis queue is full")]
    QueueFull,

    #[error("Engine is shut down")]
    ShutDown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
