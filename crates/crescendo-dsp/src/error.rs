//! Error types for crescendo-dsp.

use thiserror::Error;

/// Error type for metric computations.
///
/// Raised only for structurally invalid input — a malformed buffer or
/// nonsensical windowing parameters. Malformed *sample values* (NaN,
/// infinities) are never an error; they contribute zero and are counted in
/// [`AmplitudeStats::non_finite`](crate::mono::AmplitudeStats).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Buffer has zero channels")]
    NoChannels,

    #[error("Sample rate must be positive")]
    ZeroSampleRate,

    #[error("Buffer contains no samples")]
    EmptyBuffer,

    #[error("Invalid analysis window: {0} s. Must be positive and finite")]
    InvalidWindow(f32),

    #[error("Invalid analysis hop: {0} s. Must be positive and finite")]
    InvalidHop(f32),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, MetricsError>;
