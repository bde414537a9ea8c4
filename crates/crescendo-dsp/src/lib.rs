//! # Crescendo DSP
//!
//! Pure audio metrics for loudness review.
//!
//! This crate provides the numeric half of the analysis pipeline:
//! - **Mono mixdown**: deterministic per-frame mean collapse with amplitude
//!   statistics gathered in the same pass
//! - **Energy series**: rolling-window RMS power over fixed windows
//!   (10 s window / 2 s hop by default, full windows only)
//! - **Scale decision**: classifies a track's peak windowed power into one of
//!   two display ranges for plotting
//! - **dBFS helpers**: linear/decibel conversions with a silence floor
//!
//! All functions operate on raw `&[f32]` sample buffers or [`SampleBuffer`]
//! values - no I/O, no threads, no shared state. Anything concurrent lives in
//! `crescendo-engine`.
//!
//! ## Example
//!
//! ```rust
//! use crescendo_dsp::{analyze_buffer, AnalysisParams, SampleBuffer};
//!
//! // 30 seconds of mono silence at 1 kHz.
//! let buffer = SampleBuffer::from_mono(vec![0.0; 30_000], 1_000);
//! let metrics = analyze_buffer(&buffer, &AnalysisParams::default()).unwrap();
//!
//! // floor((30 - 10) / 2) + 1 full windows.
//! assert_eq!(metrics.energy.len(), 11);
//! assert_eq!(metrics.energy.peak_power(), 0.0);
//! ```

pub mod analyze;
pub mod buffer;
pub mod db;
pub mod energy;
pub mod error;
pub mod mono;
pub mod scale;

pub use analyze::{analyze_buffer, AnalysisParams, TrackMetrics};
pub use buffer::SampleBuffer;
pub use db::{dbfs_to_linear, linear_to_dbfs, SILENCE_FLOOR_DB};
pub use energy::{
    compute_energy_series, EnergyParams, EnergyPoint, EnergySeries, DEFAULT_HOP_SECS,
    DEFAULT_WINDOW_SECS,
};
pub use error::{MetricsError, Result};
pub use mono::{mix_down, AmplitudeStats, MonoMix};
pub use scale::{classify_scale, ScaleClass, ScaleDecision, DEFAULT_LOUD_THRESHOLD};
