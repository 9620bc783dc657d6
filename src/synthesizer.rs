use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::{AudioStretcher, FfmpegStretcher};
use crate::cache::store::write_record;
use crate::cache::{fingerprint, Fingerprint, ResultStore};
use crate::config::{AudioFormat, SynthesisConfig};
use crate::error::{Result, VoiceoverError};
use crate::markup::{normalize_text, render_ssml};
use crate::record::SynthesisRecord;
use crate::timing::{self, TimingAdjuster};
use crate::SpeechProvider;

/// Cached narration synthesis.
///
/// Each call normalizes the text, renders SSML, and fingerprints the request. A
/// persisted record for that fingerprint is returned as is. Otherwise the provider
/// is called, the audio is time-stretched if `global_speed != 1`, and the new record
/// is persisted before being returned.
///
/// ```ignore
/// use voiceover_rs::{engines::azure::AzureEngine, SynthesisConfig, Synthesizer};
///
/// let mut synthesizer = Synthesizer::new(AzureEngine::from_env()?, SynthesisConfig::default())?;
/// let first = synthesizer.synthesize_from_text("Welcome   back.")?;
/// let again = synthesizer.synthesize_from_text("Welcome back.")?; // cache hit
/// assert_eq!(first, again);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Synthesizer<P, S = FfmpegStretcher> {
    provider: P,
    adjuster: TimingAdjuster<S>,
    config: SynthesisConfig,
    format: AudioFormat,
    store: ResultStore,
}

impl<P: SpeechProvider> Synthesizer<P, FfmpegStretcher> {
    /// Create a synthesizer that time-stretches with `ffmpeg` from PATH.
    pub fn new(provider: P, config: SynthesisConfig) -> Result<Self> {
        Self::with_stretcher(provider, FfmpegStretcher::new(), config)
    }
}

impl<P: SpeechProvider, S: AudioStretcher> Synthesizer<P, S> {
    /// Create a synthesizer with an explicit time-stretch backend.
    ///
    /// Fails on an invalid config, including an unsupported output format, before
    /// anything touches the network or the filesystem.
    pub fn with_stretcher(provider: P, stretcher: S, config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        let format = AudioFormat::parse(&config.output_format)?;
        let store = ResultStore::new(&config.output_dir);

        Ok(Self {
            provider,
            adjuster: TimingAdjuster::new(stretcher),
            config,
            format,
            store,
        })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn stretcher(&self) -> &S {
        self.adjuster.stretcher()
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// SSML for `text` under this synthesizer's voice, style and language.
    pub fn render_markup(&self, text: &str) -> String {
        render_ssml(
            &normalize_text(text),
            &self.config.voice,
            self.config.style.as_deref(),
            &self.config.language,
        )
    }

    /// Cache key `text` would be stored under.
    pub fn fingerprint_for(&self, text: &str) -> Result<Fingerprint> {
        fingerprint(&self.render_markup(text), &self.config)
    }

    /// Synthesize `text`, reusing a cached result when one exists.
    pub fn synthesize_from_text(&mut self, text: &str) -> Result<SynthesisRecord> {
        let markup = self.prepare_markup(text);
        let fp = fingerprint(&markup, &self.config)?;
        log::debug!("Fingerprint {fp} for {text:?}");

        if let Some(record_path) = self.store.locate(&fp) {
            log::debug!("Cache hit: {}", record_path.display());
            return self.store.load(&record_path);
        }

        log::info!("Cache miss for {fp}, synthesizing");
        self.store.ensure_dir()?;
        let audio_path = self.store.audio_path(&fp, &self.format);
        let record_path = self.store.record_path(&fp);
        let record = self.synthesize_uncached(markup, audio_path, record_path)?;
        self.store.persist(&fp, &record)?;
        Ok(record)
    }

    /// Synthesize `text` into `audio_path`, bypassing the cache.
    ///
    /// The record is written next to the audio, as `<stem>.json`. Any existing files
    /// at those paths are overwritten.
    pub fn synthesize_to_path(&mut self, text: &str, audio_path: &Path) -> Result<SynthesisRecord> {
        if audio_path.extension().is_some_and(|ext| ext == std::ffi::OsStr::new("json")) {
            return Err(VoiceoverError::InvalidConfig(format!(
                "audio path {} would collide with its own record",
                audio_path.display()
            )));
        }

        let markup = self.prepare_markup(text);
        if let Some(parent) = audio_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let record_path = audio_path.with_extension("json");
        let record = self.synthesize_uncached(markup, audio_path.to_path_buf(), record_path)?;
        write_record(&record.record_path, &record)?;
        Ok(record)
    }

    fn prepare_markup(&self, text: &str) -> String {
        if normalize_text(text).is_empty() {
            log::warn!("Narration text is empty after normalization");
        }
        self.render_markup(text)
    }

    fn synthesize_uncached(
        &mut self,
        markup: String,
        audio_path: PathBuf,
        record_path: PathBuf,
    ) -> Result<SynthesisRecord> {
        let raw = self.provider.synthesize(&markup, &self.format, &audio_path)?;
        let original_word_boundaries = timing::calibrate(raw, self.provider.timestamp_bias_ms());
        log::info!(
            "Synthesized {} ({} word boundaries)",
            audio_path.display(),
            original_word_boundaries.len()
        );

        let speed = self.config.global_speed;
        let final_audio_path = self.adjuster.adjust(&audio_path, speed)?;
        let word_boundaries = timing::rescale(&original_word_boundaries, speed);

        Ok(SynthesisRecord {
            markup,
            global_speed: speed,
            word_boundaries,
            original_word_boundaries,
            original_audio_path: audio_path,
            final_audio_path,
            record_path,
        })
    }
}
