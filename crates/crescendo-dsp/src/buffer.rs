//! Decoded audio buffers.
//!
//! A [`SampleBuffer`] is the hand-off point between a decoder (external to
//! this crate) and the analyzers. It is immutable once built: analyzers only
//! ever borrow it.

use crate::error::{MetricsError, Result};

/// Immutable decoded audio: interleaved f32 samples plus shape.
///
/// Samples are expected in `[-1.0, 1.0]`, frame-interleaved
/// (`[L, R, L, R, ...]` for stereo). A trailing ragged frame (length not
/// divisible by the channel count) is ignored by the analyzers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    /// Create a buffer from interleaved samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a single-channel buffer.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved sample data.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of complete frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds, derived from complete frames.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Check the buffer is structurally sound for analysis.
    ///
    /// Rejects zero channels, zero sample rate, and empty sample data.
    /// These indicate a decoder bug, not a property of the audio.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(MetricsError::NoChannels);
        }
        if self.sample_rate == 0 {
            return Err(MetricsError::ZeroSampleRate);
        }
        if self.samples.is_empty() {
            return Err(MetricsError::EmptyBuffer);
        }
        Ok(())
    }
}
