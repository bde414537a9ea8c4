//! Linear/dBFS conversions.

/// Floor returned for silence, matching 24-bit dynamic range.
pub const SILENCE_FLOOR_DB: f32 = -144.0;

/// Convert a linear amplitude or power value to dBFS.
///
/// Zero, negative, and non-finite inputs return [`SILENCE_FLOOR_DB`].
pub fn linear_to_dbfs(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        20.0 * value.log10()
    } else {
        SILENCE_FLOOR_DB
    }
}

/// Convert a dBFS value back to linear amplitude.
pub fn dbfs_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}
