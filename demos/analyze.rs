//! # Analyze - Track Metrics From WAV Files
//!
//! Decode one or more WAV files and print their loudness metrics: windowed
//! RMS energy, peak/average amplitude, and the display-scale decision.
//!
//! Accepts audio paths directly or a `.txt` batch list (one path per line,
//! `#`/`;` lines are comments).
//!
//! ```bash
//! cargo run --example analyze -- track.wav
//! cargo run --example analyze -- playlist.txt
//! ```

use crescendo::prelude::*;
use std::path::{Path, PathBuf};

/// WAV decoder backed by hound. Integer samples normalize to [-1, 1].
struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, path: &Path) -> crescendo::Result<SampleBuffer> {
        let mut reader =
            hound::WavReader::open(path).map_err(|e| crescendo::Error::Decode(e.to_string()))?;
        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| crescendo::Error::Decode(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<_, _>>()
                    .map_err(|e| crescendo::Error::Decode(e.to_string()))?
            }
        };
        Ok(SampleBuffer::new(samples, spec.sample_rate, spec.channels))
    }

    fn name(&self) -> &'static str {
        "hound-wav"
    }
}

/// Expand `.txt` batch lists into their entries; other args pass through.
fn expand_args(args: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for arg in args {
        let path = PathBuf::from(arg);
        let is_list = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if !is_list {
            paths.push(path);
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(list) => {
                for line in list.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                        continue;
                    }
                    paths.push(PathBuf::from(line));
                }
            }
            Err(e) => eprintln!("cannot read list {}: {e}", path.display()),
        }
    }
    paths
}

fn main() -> crescendo::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: analyze <track.wav | playlist.txt> ...");
        std::process::exit(1);
    }
    let paths = expand_args(&args);

    let engine = AnalysisEngine::builder(WavDecoder).build()?;

    // Queue everything up front; the pool fans the work out.
    let handles: Vec<AnalysisHandle> = paths.iter().map(|p| engine.request(p)).collect();

    for mut handle in handles {
        let result = match handle.wait_result() {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{}: {e}", handle.file_id());
                continue;
            }
        };

        println!("{}", result.summary_text());
        match &result.status {
            AnalysisStatus::Success => {}
            AnalysisStatus::PartialFailure(reason) => println!("Degraded: {reason}"),
            AnalysisStatus::Failure(reason) => {
                println!("Failed: {reason}\n");
                continue;
            }
        }
        println!(
            "Windows: {} | Peak window power: {:.4} | Scale: 0 - {:.1} ({:?})",
            result.energy.len(),
            result.energy.peak_power(),
            result.scale.upper_bound,
            result.scale.classification
        );
        println!();
    }

    let metrics = engine.metrics();
    println!(
        "Analyzed {} request(s): {} completed, {} failed, {} from cache",
        metrics.requests, metrics.completed, metrics.failed, metrics.cache_hits
    );
    Ok(())
}
