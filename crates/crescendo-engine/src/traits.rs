//! Collaborator seams.
//!
//! Decoding, tag reading, and tempo estimation are not implemented by this
//! crate. They are injected at engine build time behind these traits so the
//! analysis pipeline stays testable with in-memory fakes and front ends can
//! swap backends freely.

use crate::error::Result;
use crate::result::TrackTags;
use crescendo_dsp::SampleBuffer;
use std::path::Path;

/// Decoding backend: file path in, normalized samples out.
///
/// Implementations must return samples in `[-1.0, 1.0]`. Failures
/// (unsupported format, corrupt file, unreadable path) come back as
/// [`Error::Decode`](crate::Error::Decode) and surface in the result's
/// `Failure` status; they never abort the worker.
pub trait AudioDecoder: Send + Sync {
    /// Decode an audio file into a sample buffer.
    fn decode(&self, path: &Path) -> Result<SampleBuffer>;

    /// Name of this decoder, for logging.
    fn name(&self) -> &'static str {
        "decoder"
    }
}

/// Tag reading backend (artist/title metadata).
///
/// Best effort: `None` degrades the result to `PartialFailure` but never
/// blocks the metrics pipeline.
pub trait TagReader: Send + Sync {
    /// Read tags from an audio file, if any are present and readable.
    fn read_tags(&self, path: &Path) -> Option<TrackTags>;

    /// Name of this reader, for logging.
    fn name(&self) -> &'static str {
        "tags"
    }
}

/// Tempo estimation backend.
///
/// Best effort, same degrade-on-absence policy as [`TagReader`].
pub trait TempoEstimator: Send + Sync {
    /// Estimate the tempo of a decoded buffer in BPM, if one can be found.
    fn estimate(&self, buffer: &SampleBuffer) -> Option<f32>;

    /// Name of this estimator, for logging.
    fn name(&self) -> &'static str {
        "tempo"
    }
}

