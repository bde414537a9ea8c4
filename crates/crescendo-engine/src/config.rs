//! Analysis engine configuration.

use crate::error::{Error, Result};
use crescendo_dsp::{
    AnalysisParams, EnergyParams, DEFAULT_HOP_SECS, DEFAULT_LOUD_THRESHOLD, DEFAULT_WINDOW_SECS,
};

/// Configuration for worker pool sizing, caching, and analysis parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Number of worker threads. 0 picks the number of available execution
    /// units (default: 0).
    pub workers: usize,
    /// Maximum number of cached results (default: 64)
    pub cache_capacity: usize,
    /// Job queue capacity; requests that find it full fail immediately
    /// rather than blocking the requester (default: 256)
    pub queue_capacity: usize,
    /// Analysis window in seconds (default: 10.0)
    pub window_secs: f32,
    /// Hop between windows in seconds (default: 2.0)
    pub hop_secs: f32,
    /// Peak-power boundary for the display-scale decision (default: 0.3)
    pub loud_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            cache_capacity: 64,
            queue_capacity: 256,
            window_secs: DEFAULT_WINDOW_SECS,
            hop_secs: DEFAULT_HOP_SECS,
            loud_threshold: DEFAULT_LOUD_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config("cache_capacity must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be at least 1".into()));
        }
        self.analysis_params()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// The pure-analysis parameters this configuration describes.
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            energy: EnergyParams::new(self.window_secs, self.hop_secs),
            loud_threshold: self.loud_threshold,
        }
    }

    /// Worker count after resolving the 0 = auto default.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
    }
}
