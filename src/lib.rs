//! # voiceover-rs
//!
//! A Rust library for synthesizing narration tracks for programmatically generated
//! video, with a persistent cache so that re-running a deterministic script never
//! pays for the same synthesis twice.
//!
//! ## Features
//!
//! - **Content-addressed cache**: every request is fingerprinted (SHA-256 over the
//!   rendered SSML and the full config) and stored as `<fingerprint>.mp3` plus a
//!   `<fingerprint>.json` record
//! - **Word-level timing**: word-boundary timestamps are calibrated for the provider's
//!   bias and kept consistent with the audio
//! - **Global speed**: audio is time-stretched with ffmpeg and timestamps are rescaled
//!   to match, keeping both original and adjusted versions
//! - **Azure Speech**: websocket (with word boundaries) and REST providers behind the
//!   `azure` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! voiceover-rs = { version = "2026.10", features = ["azure"] }
//! ```
//!
//! ```ignore
//! use voiceover_rs::{engines::azure::AzureStreamingEngine, SynthesisConfig, Synthesizer};
//!
//! let engine = AzureStreamingEngine::from_env()?;
//! let config = SynthesisConfig::builder().global_speed(1.2).build()?;
//! let mut synthesizer = Synthesizer::new(engine, config)?;
//!
//! let record = synthesizer.synthesize_from_text("Hello, world!")?;
//! println!("{} ({} words)", record.final_audio_path.display(), record.word_boundaries.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod engines;
pub mod error;
pub mod markup;
pub mod record;
pub mod synthesizer;
pub mod timing;

use std::path::Path;

pub use audio::{AudioStretcher, FfmpegStretcher};
pub use config::{AudioFormat, SynthesisConfig, SynthesisConfigBuilder};
pub use credentials::AzureCredentials;
pub use error::{Result, VoiceoverError};
pub use record::{BoundaryType, SynthesisRecord, WordBoundary};
pub use synthesizer::Synthesizer;

/// A speech synthesis backend.
///
/// Only called on a cache miss. Implementations block until synthesis has finished
/// and must not retry on their own; any failure is final for that request.
pub trait SpeechProvider {
    /// Synthesize `markup` and write the audio to `audio_path`.
    ///
    /// Returns the word boundaries in the order the provider emitted them, with
    /// offsets exactly as the provider reported them (uncalibrated). A provider that
    /// reports no timing returns an empty vector.
    fn synthesize(
        &mut self,
        markup: &str,
        format: &AudioFormat,
        audio_path: &Path,
    ) -> Result<Vec<WordBoundary>>;

    /// Constant bias, in milliseconds, of the provider's reported offsets.
    ///
    /// Subtracted once from every boundary as it is received.
    fn timestamp_bias_ms(&self) -> u64 {
        0
    }
}
