//! Display-scale decision.
//!
//! A plot of RMS power needs a fixed vertical range, and one range does not
//! fit all masters: hot masters push sustained power well past where a
//! conservatively mastered track lives, and plotting both on the same axis
//! makes one of them unreadable. The decision here picks between two fixed
//! ranges based on the peak windowed power of the track.

/// Default boundary on peak windowed RMS power above which a master is
/// judged "loud".
///
/// 0.3 linear power is roughly -10.5 dBFS sustained; louder than that and
/// the wide range is needed. This is a display tuning knob, not a measured
/// constant - override it through
/// [`AnalysisParams::loud_threshold`](crate::analyze::AnalysisParams) when
/// the default clusters your material badly.
pub const DEFAULT_LOUD_THRESHOLD: f32 = 0.3;

/// Which of the two display ranges a track was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ScaleClass {
    /// Loud master: the wide 0-0.6 range keeps the curve on screen.
    HighDynamicRange,
    /// Quieter master: the tight 0-0.3 range keeps dynamics readable.
    Conservative,
}

/// A resolved display range for plotting an energy series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ScaleDecision {
    /// Bottom of the display range.
    pub lower_bound: f32,
    /// Top of the display range. Always greater than `lower_bound`.
    pub upper_bound: f32,
    /// Which range was chosen.
    pub classification: ScaleClass,
}

impl ScaleDecision {
    /// Height of the display range.
    pub fn span(&self) -> f32 {
        self.upper_bound - self.lower_bound
    }
}

/// Pick a display range from a track's peak windowed RMS power.
///
/// `peak_power > loud_threshold` selects the wide `{0, 0.6}` range
/// ([`ScaleClass::HighDynamicRange`]); anything else, including an empty
/// series (peak 0) and non-finite inputs, selects the tight `{0, 0.3}` range
/// ([`ScaleClass::Conservative`]).
///
/// Total and deterministic: every input maps to exactly one of the two
/// decisions and `lower_bound < upper_bound` always holds.
pub fn classify_scale(peak_power: f32, loud_threshold: f32) -> ScaleDecision {
    if peak_power > loud_threshold {
        ScaleDecision {
            lower_bound: 0.0,
            upper_bound: 0.6,
            classification: ScaleClass::HighDynamicRange,
        }
    } else {
        ScaleDecision {
            lower_bound: 0.0,
            upper_bound: 0.3,
            classification: ScaleClass::Conservative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loud_track_gets_wide_range() {
        let d = classify_scale(0.45, DEFAULT_LOUD_THRESHOLD);
        assert_eq!(d.classification, ScaleClass::HighDynamicRange);
        assert_eq!(d.upper_bound, 0.6);
    }

    #[test]
    fn quiet_track_gets_tight_range() {
        let d = classify_scale(0.12, DEFAULT_LOUD_THRESHOLD);
        assert_eq!(d.classification, ScaleClass::Conservative);
        assert_eq!(d.upper_bound, 0.3);
    }

    #[test]
    fn threshold_itself_is_not_loud() {
        let d = classify_scale(DEFAULT_LOUD_THRESHOLD, DEFAULT_LOUD_THRESHOLD);
        assert_eq!(d.classification, ScaleClass::Conservative);
    }

    #[test]
    fn decision_is_deterministic() {
        for &p in &[0.0, 0.1, 0.3, 0.3000001, 0.9, 2.0] {
            assert_eq!(
                classify_scale(p, DEFAULT_LOUD_THRESHOLD),
                classify_scale(p, DEFAULT_LOUD_THRESHOLD)
            );
        }
    }

    #[test]
    fn total_over_degenerate_inputs() {
        for &p in &[f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -1.0, 0.0] {
            let d = classify_scale(p, DEFAULT_LOUD_THRESHOLD);
            assert!(d.lower_bound < d.upper_bound);
            // NaN and anything <= threshold land in the tight range; +inf is
            // "loud". Either way exactly one class comes back.
            assert!(matches!(
                d.classification,
                ScaleClass::HighDynamicRange | ScaleClass::Conservative
            ));
        }
    }

    #[test]
    fn custom_threshold_moves_the_boundary() {
        assert_eq!(
            classify_scale(0.2, 0.1).classification,
            ScaleClass::HighDynamicRange
        );
        assert_eq!(
            classify_scale(0.2, 0.5).classification,
            ScaleClass::Conservative
        );
    }

    #[test]
    fn bounds_are_ordered() {
        for &p in &[0.0, 0.29, 0.31, 1.0] {
            let d = classify_scale(p, DEFAULT_LOUD_THRESHOLD);
            assert!(d.lower_bound < d.upper_bound);
            assert!(d.span() > 0.0);
        }
    }
}
