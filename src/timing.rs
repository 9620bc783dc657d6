//! Keeping word-boundary timestamps consistent with the audio they describe.
//!
//! Two corrections are applied to provider timestamps, in this order:
//!
//! 1. [`calibrate`] removes the provider's constant timestamp bias. It runs exactly
//!    once, when boundaries come back from the provider, and never again.
//! 2. [`rescale`] maps offsets onto time-stretched audio. It is always computed from
//!    the calibrated original offsets, so applying a speed never compounds.

use std::path::{Path, PathBuf};

use crate::audio::AudioStretcher;
use crate::error::Result;
use crate::record::WordBoundary;

const ADJUSTED_SUFFIX: &str = "_adjusted";

/// Subtract the provider's timestamp bias from freshly received boundaries.
pub fn calibrate(raw: Vec<WordBoundary>, bias_ms: u64) -> Vec<WordBoundary> {
    let bias = bias_ms as i64;
    raw.into_iter()
        .map(|mut boundary| {
            boundary.audio_offset -= bias;
            if boundary.audio_offset < 0 {
                log::warn!(
                    "Boundary {:?} lands {}ms before the audio start after calibration",
                    boundary.text,
                    -boundary.audio_offset
                );
            }
            boundary
        })
        .collect()
}

/// Map offsets (and durations) onto audio played back `speed` times faster.
///
/// `adjusted = floor(original / speed)`. Order is preserved.
pub fn rescale(boundaries: &[WordBoundary], speed: f64) -> Vec<WordBoundary> {
    if speed == 1.0 {
        return boundaries.to_vec();
    }

    boundaries
        .iter()
        .map(|boundary| WordBoundary {
            audio_offset: (boundary.audio_offset as f64 / speed).floor() as i64,
            duration_ms: (boundary.duration_ms as f64 / speed).floor() as u64,
            ..boundary.clone()
        })
        .collect()
}

/// `dir/name.mp3` -> `dir/name_adjusted.mp3`.
pub fn adjusted_audio_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match original.extension() {
        Some(ext) => format!("{stem}{ADJUSTED_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{ADJUSTED_SUFFIX}"),
    };
    original.with_file_name(file_name)
}

/// Produces time-stretched copies of synthesized audio.
#[derive(Debug, Clone, Default)]
pub struct TimingAdjuster<S> {
    stretcher: S,
}

impl<S: AudioStretcher> TimingAdjuster<S> {
    pub fn new(stretcher: S) -> Self {
        Self { stretcher }
    }

    pub fn stretcher(&self) -> &S {
        &self.stretcher
    }

    /// Write a copy of `original` played `speed` times faster and return its path.
    ///
    /// At unit speed there is nothing to do and `original` itself is returned.
    pub fn adjust(&self, original: &Path, speed: f64) -> Result<PathBuf> {
        if speed == 1.0 {
            return Ok(original.to_path_buf());
        }

        let adjusted = adjusted_audio_path(original);
        log::info!(
            "Adjusting {} to {speed}x speed -> {}",
            original.display(),
            adjusted.display()
        );
        self.stretcher.stretch(original, &adjusted, speed)?;
        Ok(adjusted)
    }
}
