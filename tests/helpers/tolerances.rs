//! Tolerance constants for audio metric testing.

/// Floating point rounding errors (exact operations: mono passthrough,
/// constant signals).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Windowed-RMS tolerance against analytic values. Covers partial-cycle
/// edge effects of sine fixtures and f32 accumulation differences.
pub const DSP_EPSILON: f32 = 1e-3;

/// 16-bit quantization step size. Use for values round-tripped through
/// PCM16 WAV fixtures.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;
