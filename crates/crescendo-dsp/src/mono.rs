//! Mono mixdown and amplitude statistics.
//!
//! Multi-channel audio is collapsed to one stream before any power analysis.
//! The collapse is a per-frame mean across channels: deterministic, and the
//! only place the channel count affects downstream output. Peak and average
//! amplitude are gathered in the same pass so the buffer is traversed once.

use crate::buffer::SampleBuffer;
use crate::error::Result;

/// Amplitude statistics over the collapsed mono stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AmplitudeStats {
    /// Maximum absolute sample value.
    pub peak: f32,
    /// Mean absolute sample value.
    pub average: f32,
    /// Count of NaN/infinite input samples that were zeroed.
    pub non_finite: usize,
}

impl AmplitudeStats {
    /// Margin between the peak and normalized full scale (1.0).
    ///
    /// Clamped to zero for buffers that clip above full scale.
    pub fn headroom(&self) -> f32 {
        (1.0 - self.peak).max(0.0)
    }
}

/// A collapsed mono stream plus the statistics gathered while collapsing.
#[derive(Debug, Clone)]
pub struct MonoMix {
    /// Mono samples, one per input frame. Non-finite inputs arrive here as 0.
    pub samples: Vec<f32>,
    /// Sample rate carried over from the source buffer.
    pub sample_rate: u32,
    /// Peak/average amplitude of `samples`.
    pub stats: AmplitudeStats,
}

/// Collapse a buffer to mono and gather amplitude statistics in one pass.
///
/// Each frame becomes the mean of its channels. NaN and infinite samples
/// contribute zero (and are counted in [`AmplitudeStats::non_finite`]); the
/// mean denominator is always the full channel count.
///
/// Fails only for structurally invalid buffers (see
/// [`SampleBuffer::validate`]).
pub fn mix_down(buffer: &SampleBuffer) -> Result<MonoMix> {
    buffer.validate()?;

    let channels = buffer.channels() as usize;
    let frames = buffer.frames();
    let data = buffer.samples();

    let mut samples = Vec::with_capacity(frames);
    let mut peak = 0.0f32;
    let mut sum_abs = 0.0f64;
    let mut non_finite = 0usize;

    for frame in 0..frames {
        let mut acc = 0.0f32;
        for ch in 0..channels {
            let s = data[frame * channels + ch];
            if s.is_finite() {
                acc += s;
            } else {
                non_finite += 1;
            }
        }
        let mono = acc / channels as f32;
        let mag = mono.abs();
        peak = peak.max(mag);
        sum_abs += mag as f64;
        samples.push(mono);
    }

    let average = if frames > 0 {
        (sum_abs / frames as f64) as f32
    } else {
        0.0
    };

    Ok(MonoMix {
        samples,
        sample_rate: buffer.sample_rate(),
        stats: AmplitudeStats {
            peak,
            average,
            non_finite,
        },
    })
}
