//! Whole-buffer analysis pipeline.
//!
//! Chains the pure stages in order: validate, mix down, window, classify.
//! This is the function a worker thread calls once per decoded file.

use crate::buffer::SampleBuffer;
use crate::energy::{compute_energy_series, EnergyParams, EnergySeries};
use crate::error::Result;
use crate::mono::{mix_down, AmplitudeStats};
use crate::scale::{classify_scale, ScaleDecision, DEFAULT_LOUD_THRESHOLD};

/// Parameters for a full analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnalysisParams {
    /// Windowing parameters for the energy series.
    pub energy: EnergyParams,
    /// Peak-power boundary for the scale decision.
    /// Default: [`DEFAULT_LOUD_THRESHOLD`].
    pub loud_threshold: f32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            energy: EnergyParams::default(),
            loud_threshold: DEFAULT_LOUD_THRESHOLD,
        }
    }
}

impl AnalysisParams {
    /// Override the analysis window length.
    pub fn with_window_secs(mut self, window_secs: f32) -> Self {
        self.energy.window_secs = window_secs;
        self
    }

    /// Override the hop between windows.
    pub fn with_hop_secs(mut self, hop_secs: f32) -> Self {
        self.energy.hop_secs = hop_secs;
        self
    }

    /// Override the loudness boundary for the scale decision.
    pub fn with_loud_threshold(mut self, loud_threshold: f32) -> Self {
        self.loud_threshold = loud_threshold;
        self
    }

    /// Check the windowing parameters.
    pub fn validate(&self) -> Result<()> {
        self.energy.validate()
    }
}

/// Everything the pure pipeline can say about one buffer.
#[derive(Debug, Clone)]
pub struct TrackMetrics {
    /// Rolling-window RMS power in time order. Empty when the clip is
    /// shorter than one analysis window.
    pub energy: EnergySeries,
    /// Display range chosen from the series' peak power.
    pub scale: ScaleDecision,
    /// Peak/average amplitude of the collapsed stream.
    pub stats: AmplitudeStats,
    /// Duration of the buffer in seconds.
    pub duration_secs: f32,
}

impl TrackMetrics {
    /// True when the clip was too short for even one analysis window.
    pub fn short_clip(&self) -> bool {
        self.energy.is_empty()
    }
}

/// Run the full pure pipeline over one decoded buffer.
///
/// Fails only for structural problems (bad buffer shape, bad parameters).
/// Short clips and non-finite samples come back as facts in the returned
/// metrics for the caller to report.
pub fn analyze_buffer(buffer: &SampleBuffer, params: &AnalysisParams) -> Result<TrackMetrics> {
    params.validate()?;
    let mix = mix_down(buffer)?;
    let energy = compute_energy_series(&mix.samples, mix.sample_rate, &params.energy)?;
    let scale = classify_scale(energy.peak_power(), params.loud_threshold);

    Ok(TrackMetrics {
        energy,
        scale,
        stats: mix.stats,
        duration_secs: buffer.duration_secs(),
    })
}
