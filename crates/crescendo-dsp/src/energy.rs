//! Rolling-window RMS power.
//!
//! The energy series is the primary deliverable of the analyzer: one RMS
//! value per window position, walked at a fixed hop. Only full windows are
//! emitted; a trailing segment shorter than the window is dropped. A clip
//! shorter than one window therefore yields an empty series - that is a
//! reportable condition for the caller, not an error here.

use crate::error::{MetricsError, Result};

/// Default analysis window in seconds.
pub const DEFAULT_WINDOW_SECS: f32 = 10.0;

/// Default hop between window starts in seconds.
pub const DEFAULT_HOP_SECS: f32 = 2.0;

/// Windowing parameters for [`compute_energy_series`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EnergyParams {
    /// Window length in seconds. Default: 10.0.
    pub window_secs: f32,
    /// Hop between consecutive window starts in seconds. Default: 2.0.
    pub hop_secs: f32,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            hop_secs: DEFAULT_HOP_SECS,
        }
    }
}

impl EnergyParams {
    /// Create parameters with an explicit window and hop.
    pub fn new(window_secs: f32, hop_secs: f32) -> Self {
        Self {
            window_secs,
            hop_secs,
        }
    }

    /// Check that window and hop are positive and finite.
    pub fn validate(&self) -> Result<()> {
        if !self.window_secs.is_finite() || self.window_secs <= 0.0 {
            return Err(MetricsError::InvalidWindow(self.window_secs));
        }
        if !self.hop_secs.is_finite() || self.hop_secs <= 0.0 {
            return Err(MetricsError::InvalidHop(self.hop_secs));
        }
        Ok(())
    }

    /// Window length in samples at the given rate (at least 1).
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        ((self.window_secs as f64 * sample_rate as f64).round() as usize).max(1)
    }

    /// Hop length in samples at the given rate (at least 1).
    pub fn hop_samples(&self, sample_rate: u32) -> usize {
        ((self.hop_secs as f64 * sample_rate as f64).round() as usize).max(1)
    }

    /// Number of full windows a stream of `frames` samples will produce.
    ///
    /// `floor((frames - window) / hop) + 1`, or 0 when the stream is shorter
    /// than one window.
    pub fn num_windows(&self, frames: usize, sample_rate: u32) -> usize {
        let window = self.window_samples(sample_rate);
        if frames < window {
            return 0;
        }
        (frames - window) / self.hop_samples(sample_rate) + 1
    }
}

/// One window's worth of measured power.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EnergyPoint {
    /// Window start time in seconds from the beginning of the stream.
    pub time_secs: f32,
    /// RMS power over the window, always >= 0.
    pub power: f32,
}

/// Ordered RMS power measurements, one per window position.
///
/// Points are in time order with strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EnergySeries {
    /// Measurements in time order.
    pub points: Vec<EnergyPoint>,
}

impl EnergySeries {
    /// Number of windows measured.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no full window fit the stream.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum RMS power across all windows (0.0 for an empty series).
    ///
    /// This is the value the display-scale decision keys on.
    pub fn peak_power(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.power)
            .fold(0.0f32, |a, b| a.max(b))
    }

    /// Mean RMS power across all windows (0.0 for an empty series).
    pub fn average_power(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.points.iter().map(|p| p.power).sum();
        sum / self.points.len() as f32
    }

    /// Iterate over the measurements in time order.
    pub fn iter(&self) -> impl Iterator<Item = &EnergyPoint> {
        self.points.iter()
    }

    /// Window start times in seconds.
    pub fn times(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.time_secs).collect()
    }

    /// RMS power values in time order.
    pub fn powers(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.power).collect()
    }
}

/// Compute the rolling-window RMS power of a mono stream.
///
/// Walks window starts at `0, hop, 2*hop, ...` while a full window still
/// fits, emitting `(start_time, sqrt(mean(sample^2)))` per position. NaN and
/// infinite samples contribute zero to the sum; the denominator is always
/// the window length. A stream shorter than one window produces an empty
/// series.
pub fn compute_energy_series(
    samples: &[f32],
    sample_rate: u32,
    params: &EnergyParams,
) -> Result<EnergySeries> {
    params.validate()?;
    if sample_rate == 0 {
        return Err(MetricsError::ZeroSampleRate);
    }

    let window = params.window_samples(sample_rate);
    let hop = params.hop_samples(sample_rate);

    let mut points = Vec::with_capacity(params.num_windows(samples.len(), sample_rate));
    let mut start = 0usize;

    while start + window <= samples.len() {
        let mut sum_sq = 0.0f64;
        for &s in &samples[start..start + window] {
            if s.is_finite() {
                sum_sq += (s as f64) * (s as f64);
            }
        }
        let power = (sum_sq / window as f64).sqrt() as f32;
        let time_secs = (start as f64 / sample_rate as f64) as f32;
        points.push(EnergyPoint { time_secs, power });
        start += hop;
    }

    Ok(EnergySeries { points })
}
