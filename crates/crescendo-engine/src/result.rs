//! Analysis results and their status.

use crate::file_id::FileId;
use crescendo_dsp::{
    classify_scale, linear_to_dbfs, EnergySeries, ScaleDecision, DEFAULT_LOUD_THRESHOLD,
};
use std::time::SystemTime;

/// Artist/title metadata read by a [`TagReader`](crate::traits::TagReader).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackTags {
    /// Artist name, if tagged.
    pub artist: Option<String>,
    /// Track title, if tagged.
    pub title: Option<String>,
}

impl TrackTags {
    /// "Artist - Title" when both are present, the title alone otherwise.
    ///
    /// `None` when there is nothing displayable; callers fall back to the
    /// file name.
    pub fn display_name(&self) -> Option<String> {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => Some(format!("{artist} - {title}")),
            (None, Some(title)) => Some(title.clone()),
            _ => None,
        }
    }
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnalysisStatus {
    /// Every stage produced its output.
    Success,
    /// Primary metrics are intact but something degraded: missing tags or
    /// tempo, a clip shorter than one window, non-finite samples zeroed.
    PartialFailure(String),
    /// No usable metrics: decode failure, structural bad input, timeout, or
    /// a worker fault.
    Failure(String),
}

impl AnalysisStatus {
    /// True only for a clean [`AnalysisStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisStatus::Success)
    }

    /// True when the energy series and amplitudes are trustworthy
    /// (success or partial failure).
    pub fn is_usable(&self) -> bool {
        !matches!(self, AnalysisStatus::Failure(_))
    }

    /// True for a hard failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisStatus::Failure(_))
    }

    /// The degradation or failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            AnalysisStatus::Success => None,
            AnalysisStatus::PartialFailure(r) | AnalysisStatus::Failure(r) => Some(r),
        }
    }
}

/// Everything one analysis produced for one file.
///
/// Immutable once constructed. A newer result for the same [`FileId`]
/// replaces the older one in the cache wholesale.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    /// Identity of the analyzed file version.
    pub file_id: FileId,
    /// Rolling-window RMS power in time order.
    pub energy: EnergySeries,
    /// Display range chosen from the series' peak power.
    pub scale: ScaleDecision,
    /// Maximum absolute sample amplitude of the collapsed stream.
    pub peak_amplitude: f32,
    /// Mean absolute sample amplitude of the collapsed stream.
    pub average_amplitude: f32,
    /// Estimated tempo in BPM, when the estimator produced one.
    pub tempo_bpm: Option<f32>,
    /// Artist/title metadata, when the reader found any.
    pub tags: Option<TrackTags>,
    /// How the run ended.
    pub status: AnalysisStatus,
    /// Wall-clock completion time.
    pub computed_at: SystemTime,
}

impl AnalysisResult {
    /// A result carrying only a failure, for requests that never produced
    /// metrics. The series is empty and the scale falls back to the tight
    /// range.
    pub(crate) fn failed(file_id: FileId, reason: impl Into<String>) -> Self {
        Self {
            file_id,
            energy: EnergySeries::default(),
            scale: classify_scale(0.0, DEFAULT_LOUD_THRESHOLD),
            peak_amplitude: 0.0,
            average_amplitude: 0.0,
            tempo_bpm: None,
            tags: None,
            status: AnalysisStatus::Failure(reason.into()),
            computed_at: SystemTime::now(),
        }
    }

    /// Best available display name: tags first, then the file stem, then the
    /// full path.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.tags.as_ref().and_then(|t| t.display_name()) {
            return name;
        }
        match self.file_id.file_stem() {
            Some(stem) => stem.to_string(),
            None => self.file_id.to_string(),
        }
    }

    /// Multi-line summary block for display beside a plot.
    pub fn summary_text(&self) -> String {
        let bpm = match self.tempo_bpm {
            Some(bpm) => format!("{bpm:.1}"),
            None => "unknown".to_string(),
        };
        format!(
            "Track: {}\nBPM: {}\nMax Amplitude: {:.3} ({:.1} dBFS)\nAvg Amplitude: {:.3} ({:.1} dBFS)",
            self.display_name(),
            bpm,
            self.peak_amplitude,
            linear_to_dbfs(self.peak_amplitude),
            self.average_amplitude,
            linear_to_dbfs(self.average_amplitude),
        )
    }
}
