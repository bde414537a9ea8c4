//! Concurrent analysis engine for audio files.
//!
//! Runs the [`crescendo_dsp`] metrics pipeline on a bounded pool of
//! low-priority worker threads and manages everything around it:
//!
//! - **Deduplication.** Requests are keyed by [`FileId`] (canonical path +
//!   mtime). While a file is queued or running, further requests attach to
//!   the same run instead of scheduling another.
//! - **Caching.** Finished results land in an LRU [`ResultCache`]; repeat
//!   requests return without touching the pool. Failures are never cached.
//! - **Progress.** Every request gets an [`AnalysisHandle`] streaming
//!   [`AnalysisEvent`]s, ending in exactly one terminal event.
//! - **Cancellation.** Queued work is withdrawn immediately; running work
//!   stops at the next pipeline checkpoint and writes nothing.
//!
//! Decoding, tag reading, and tempo estimation are injected behind the
//! [`AudioDecoder`], [`TagReader`], and [`TempoEstimator`] traits.
//!
//! ```
//! use crescendo_dsp::SampleBuffer;
//! use crescendo_engine::{AnalysisEngine, AudioDecoder, FileId};
//! use std::path::Path;
//! use std::time::SystemTime;
//!
//! struct SineDecoder;
//!
//! impl AudioDecoder for SineDecoder {
//!     fn decode(&self, _path: &Path) -> crescendo_engine::Result<SampleBuffer> {
//!         let samples = (0..44_100 * 12)
//!             .map(|i| (i as f32 * 0.05).sin() * 0.5)
//!             .collect();
//!         Ok(SampleBuffer::from_mono(samples, 44_100))
//!     }
//! }
//!
//! let engine = AnalysisEngine::builder(SineDecoder).workers(1).build()?;
//! let mut handle = engine.request_file(FileId::new("memory:sine", SystemTime::UNIX_EPOCH));
//! let result = handle.wait_result()?;
//! println!("{}", result.summary_text());
//! # Ok::<(), crescendo_engine::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod file_id;
pub mod metrics;
pub mod result;
mod task;
pub mod traits;

pub use cache::{CacheStats, ResultCache};
pub use config::EngineConfig;
pub use engine::{AnalysisEngine, AnalysisEngineBuilder};
pub use error::{Error, Result};
pub use events::{AnalysisEvent, AnalysisHandle, RequestStatus};
pub use file_id::FileId;
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use result::{AnalysisResult, AnalysisStatus, TrackTags};
pub use task::{TaskId, TaskState};
pub use traits::{AudioDecoder, TagReader, TempoEstimator};
