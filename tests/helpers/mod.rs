//! Test helpers and fixtures for crescendo integration tests.
//!
//! Signal generators and a WAV writer for on-disk fixtures, plus in-memory
//! collaborator fakes (decoders, tag readers, tempo estimators) for driving
//! the engine deterministically without touching disk.

pub mod tolerances;

use crescendo::{
    AnalysisEvent, AnalysisHandle, AudioDecoder, Error, SampleBuffer, TagReader, TempoEstimator,
    TrackTags,
};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default fixture sample rate. Low keeps fixtures small; the windowing
/// math is rate-independent.
pub const TEST_SAMPLE_RATE: u32 = 8_000;

// =============================================================================
// Signal Generators
// =============================================================================

/// Generate a sine wave at `frequency` Hz with the given peak amplitude.
pub fn generate_sine(
    frequency: f64,
    sample_rate: u32,
    num_samples: usize,
    amplitude: f32,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32 * amplitude
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate reproducible noise in [-1, 1] from a simple LCG.
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Interleave two equal-length channels.
pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter()
        .zip(right.iter())
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

// =============================================================================
// WAV Fixtures
// =============================================================================

/// Save stereo audio to a 16-bit PCM WAV file.
pub fn save_wav_file_pcm16(
    path: &Path,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> Result<(), String> {
    use hound::{WavSpec, WavWriter};

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {}", e))?;
    }

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        WavWriter::create(path, spec).map_err(|e| format!("Failed to create WAV: {}", e))?;

    let len = std::cmp::min(left.len(), right.len());
    for i in 0..len {
        let l = (left[i].clamp(-1.0, 1.0) * 32767.0).round() as i16;
        let r = (right[i].clamp(-1.0, 1.0) * 32767.0).round() as i16;
        writer
            .write_sample(l)
            .map_err(|e| format!("Write error: {}", e))?;
        writer
            .write_sample(r)
            .map_err(|e| format!("Write error: {}", e))?;
    }
    writer
        .finalize()
        .map_err(|e| format!("Finalize error: {}", e))?;
    Ok(())
}

/// Write a stereo sine fixture of `secs` seconds and return its path.
pub fn write_sine_fixture(dir: &Path, name: &str, secs: f32, amplitude: f32) -> PathBuf {
    let num_samples = (secs * TEST_SAMPLE_RATE as f32) as usize;
    let samples = generate_sine(440.0, TEST_SAMPLE_RATE, num_samples, amplitude);
    let path = dir.join(name);
    save_wav_file_pcm16(&path, &samples, &samples, TEST_SAMPLE_RATE).expect("write fixture");
    path
}

/// Decoder for the WAV fixtures written by these helpers.
pub struct WavFixtureDecoder;

impl AudioDecoder for WavFixtureDecoder {
    fn decode(&self, path: &Path) -> crescendo::Result<SampleBuffer> {
        let mut reader =
            hound::WavReader::open(path).map_err(|e| Error::Decode(e.to_string()))?;
        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| Error::Decode(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<_, _>>()
                    .map_err(|e| Error::Decode(e.to_string()))?
            }
        };
        Ok(SampleBuffer::new(samples, spec.sample_rate, spec.channels))
    }

    fn name(&self) -> &'static str {
        "wav-fixture"
    }
}

// =============================================================================
// In-Memory Collaborator Fakes
// =============================================================================

/// In-memory decoder with hooks for gating and failure injection.
pub struct MemoryDecoder {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    attempts: Arc<AtomicUsize>,
    gate: Option<Receiver<()>>,
    fail_with: Option<String>,
    fail_first: AtomicUsize,
}

impl MemoryDecoder {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            attempts: Arc::new(AtomicUsize::new(0)),
            gate: None,
            fail_with: None,
            fail_first: AtomicUsize::new(0),
        }
    }

    /// Block each decode until the returned sender releases it with one
    /// token. The attempt counter increments on entry, before blocking.
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.gate = Some(rx);
        (self, tx)
    }

    /// Every decode fails with this message.
    pub fn always_failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// The first `n` decodes fail; later ones succeed.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = AtomicUsize::new(n);
        self
    }

    /// Decode-attempt counter, usable after the engine takes the decoder.
    pub fn attempt_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl AudioDecoder for MemoryDecoder {
    fn decode(&self, _path: &Path) -> crescendo::Result<SampleBuffer> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        if let Some(message) = &self.fail_with {
            return Err(Error::Decode(message.clone()));
        }
        if self.fail_first.load(Ordering::SeqCst) > 0 {
            self.fail_first.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Decode("transient read error".into()));
        }
        Ok(SampleBuffer::new(
            self.samples.clone(),
            self.sample_rate,
            self.channels,
        ))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Decoder that panics, for fault containment tests.
pub struct PanickingDecoder;

impl AudioDecoder for PanickingDecoder {
    fn decode(&self, _path: &Path) -> crescendo::Result<SampleBuffer> {
        panic!("decoder exploded");
    }
}

/// Tag reader returning a fixed artist/title.
pub struct StaticTags {
    pub artist: &'static str,
    pub title: &'static str,
}

impl TagReader for StaticTags {
    fn read_tags(&self, _path: &Path) -> Option<TrackTags> {
        Some(TrackTags {
            artist: Some(self.artist.to_string()),
            title: Some(self.title.to_string()),
        })
    }
}

/// Tag reader that never finds tags.
pub struct MissingTags;

impl TagReader for MissingTags {
    fn read_tags(&self, _path: &Path) -> Option<TrackTags> {
        None
    }
}

/// Tempo estimator returning a fixed BPM.
pub struct FixedTempo(pub f32);

impl TempoEstimator for FixedTempo {
    fn estimate(&self, _buffer: &SampleBuffer) -> Option<f32> {
        Some(self.0)
    }
}

// =============================================================================
// Event Helpers
// =============================================================================

/// Drain a handle's events until the terminal one arrives.
///
/// Panics after 5 seconds without a terminal event so a wedged engine fails
/// the test instead of hanging it.
pub fn collect_events(handle: &mut AnalysisHandle) -> Vec<AnalysisEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        match handle.try_next() {
            Some(event) => {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    return events;
                }
            }
            None => std::thread::sleep(Duration::from_millis(2)),
        }
    }
    panic!("no terminal event within 5s; saw {} events", events.len());
}

/// Spin until `condition` holds (5s safety timeout).
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_generator_hits_requested_level() {
        let samples = generate_sine(440.0, 8_000, 8_000, 0.5);
        assert_eq!(samples.len(), 8_000);
        assert!((rms(&samples) - 0.5 * std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert!(peak(&samples) <= 0.5 + 1e-6);
    }

    #[test]
    fn interleave_alternates_channels() {
        let out = interleave(&[1.0, 2.0], &[-1.0, -2.0]);
        assert_eq!(out, vec![1.0, -1.0, 2.0, -2.0]);
    }
}
