//! # Crescendo - Track Loudness Analysis
//!
//! Audio metrics for mastering work, built from two subsystems:
//!
//! - **crescendo-dsp** - the pure metrics pipeline: deterministic mono
//!   collapse, rolling-window RMS energy, peak/average amplitude, and the
//!   display-scale decision
//! - **crescendo-engine** - the concurrent manager: a bounded worker pool
//!   running that pipeline off the UI thread, with request deduplication,
//!   an LRU result cache, progress events, and cooperative cancellation
//!
//! ## Quick Start
//!
//! ```ignore
//! use crescendo::prelude::*;
//!
//! // Bring your own decoder (anything implementing AudioDecoder).
//! let engine = AnalysisEngine::builder(WavDecoder)
//!     .workers(2)
//!     .build()?;
//!
//! let mut handle = engine.request("mixdown-v3.wav");
//! let result = handle.wait_result()?;
//!
//! println!("{}", result.summary_text());
//! for point in &result.energy.points {
//!     println!("{:6.1}s  {:.4}", point.time_secs, point.power);
//! }
//! ```

/// Re-export of crescendo-dsp for direct access.
pub use crescendo_dsp as dsp;

// Metrics pipeline
pub use crescendo_dsp::{
    analyze_buffer,
    classify_scale,
    compute_energy_series,
    dbfs_to_linear,
    linear_to_dbfs,
    mix_down,
    AmplitudeStats,
    AnalysisParams,
    EnergyParams,
    EnergyPoint,
    EnergySeries,
    MonoMix,
    SampleBuffer,
    ScaleClass,
    ScaleDecision,
    TrackMetrics,
};

/// Re-export of crescendo-engine for direct access.
pub use crescendo_engine as engine;

// Engine surface
pub use crescendo_engine::{
    AnalysisEngine, AnalysisEngineBuilder, AnalysisEvent, AnalysisHandle, AnalysisResult,
    AnalysisStatus, AudioDecoder, CacheStats, EngineConfig, EngineMetricsSnapshot, Error, FileId,
    RequestStatus, Result, ResultCache, TagReader, TaskState, TempoEstimator, TrackTags,
};

/// Convenience prelude for common imports.
pub mod prelude {
    // Engine
    pub use crate::engine::{
        AnalysisEngine, AnalysisEngineBuilder, AnalysisEvent, AnalysisHandle, AnalysisResult,
        AnalysisStatus, AudioDecoder, EngineConfig, FileId, RequestStatus, TagReader,
        TempoEstimator, TrackTags,
    };

    // Metrics pipeline
    pub use crate::dsp::{
        analyze_buffer, AnalysisParams, EnergySeries, SampleBuffer, ScaleClass, ScaleDecision,
        TrackMetrics,
    };
}
