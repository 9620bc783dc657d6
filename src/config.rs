use std::path::PathBuf;

use derive_builder::Builder;
use serde::Serialize;

use crate::error::{Result, VoiceoverError};

/// Version of the [`SynthesisConfig`] layout.
///
/// Every config field is part of the cache fingerprint, so adding or renaming a
/// field re-keys the whole cache. Bump this whenever that happens on purpose.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_OUTPUT_FORMAT: &str = "Audio48Khz192KBitRateMonoMp3";
pub const DEFAULT_OUTPUT_DIR: &str = "media/tts";

/// Parameters for a synthesis request.
///
/// Every field participates in the fingerprint, including ones that do not change
/// the audio (like `output_dir`). Two configs that differ anywhere are separate
/// cache entries.
///
/// ```
/// use voiceover_rs::SynthesisConfig;
///
/// let config = SynthesisConfig::builder()
///     .voice("en-US-GuyNeural")
///     .style("newscast-casual")
///     .global_speed(1.25)
///     .build()?;
/// assert_eq!(config.output_format, "Audio48Khz192KBitRateMonoMp3");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
#[builder(default, setter(into), build_fn(validate = "Self::validate"))]
pub struct SynthesisConfig {
    #[builder(setter(skip), default = "CONFIG_SCHEMA_VERSION")]
    pub schema_version: u32,
    /// Provider voice name (e.g. `"en-US-AriaNeural"`).
    pub voice: String,
    /// Expressive speaking style. `None` is the voice's neutral style.
    #[builder(setter(into, strip_option))]
    pub style: Option<String>,
    /// `xml:lang` of the rendered markup.
    pub language: String,
    /// Provider output format tag. Must name an MP3 format.
    pub output_format: String,
    /// Playback-rate multiplier applied after synthesis. `> 1` speeds up.
    pub global_speed: f64,
    /// Directory holding cached audio and records.
    pub output_dir: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            voice: DEFAULT_VOICE.to_string(),
            style: None,
            language: DEFAULT_LANGUAGE.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            global_speed: 1.0,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl SynthesisConfig {
    pub fn builder() -> SynthesisConfigBuilder {
        SynthesisConfigBuilder::default()
    }

    /// Check the invariants the builder enforces, for configs built by hand.
    pub fn validate(&self) -> Result<()> {
        check_speed(self.global_speed).map_err(VoiceoverError::InvalidConfig)?;
        if self.voice.trim().is_empty() {
            return Err(VoiceoverError::InvalidConfig(
                "voice must not be empty".to_string(),
            ));
        }
        AudioFormat::parse(&self.output_format)?;
        Ok(())
    }

    /// Whether synthesized audio needs a time-stretch pass.
    pub fn needs_speed_adjustment(&self) -> bool {
        self.global_speed != 1.0
    }
}

impl SynthesisConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(speed) = self.global_speed {
            check_speed(speed)?;
        }
        if let Some(voice) = &self.voice {
            if voice.trim().is_empty() {
                return Err("voice must not be empty".to_string());
            }
        }
        Ok(())
    }
}

impl From<SynthesisConfigBuilderError> for VoiceoverError {
    fn from(err: SynthesisConfigBuilderError) -> Self {
        VoiceoverError::InvalidConfig(err.to_string())
    }
}

fn check_speed(speed: f64) -> std::result::Result<(), String> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(format!("global_speed must be a positive number, got {speed}"))
    }
}

/// A validated output format tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    name: String,
}

impl AudioFormat {
    /// Accept a provider format tag. Only MP3 variants (names ending in `Mp3`) are
    /// supported.
    pub fn parse(name: &str) -> Result<Self> {
        if name.ends_with("Mp3") {
            Ok(Self {
                name: name.to_string(),
            })
        } else {
            Err(VoiceoverError::UnsupportedFormat(name.to_string()))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extension for audio in this format, without the dot.
    pub fn extension(&self) -> &'static str {
        "mp3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let config = SynthesisConfig::builder().build().unwrap();
        assert_eq!(config, SynthesisConfig::default());
        assert_eq!(config.schema_version, CONFIG_SCHEMA_VERSION);
    }

    #[test]
    fn builder_rejects_non_positive_speed() {
        assert!(SynthesisConfig::builder().global_speed(0.0).build().is_err());
        assert!(SynthesisConfig::builder().global_speed(-1.5).build().is_err());
        assert!(SynthesisConfig::builder()
            .global_speed(f64::INFINITY)
            .build()
            .is_err());
    }

    #[test]
    fn builder_error_converts_to_invalid_config() {
        let err: VoiceoverError = SynthesisConfig::builder()
            .voice("  ")
            .build()
            .unwrap_err()
            .into();
        assert!(matches!(err, VoiceoverError::InvalidConfig(_)));
    }

    #[test]
    fn mp3_formats_are_accepted() {
        let format = AudioFormat::parse("Audio16Khz32KBitRateMonoMp3").unwrap();
        assert_eq!(format.extension(), "mp3");
        assert_eq!(format.name(), "Audio16Khz32KBitRateMonoMp3");
    }

    #[test]
    fn non_mp3_formats_are_rejected() {
        for name in ["Riff24Khz16BitMonoPcm", "Ogg48Khz16BitMonoOpus", "mp3", ""] {
            assert!(
                matches!(AudioFormat::parse(name), Err(VoiceoverError::UnsupportedFormat(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn validate_catches_hand_built_configs() {
        let config = SynthesisConfig {
            output_format: "Riff24Khz16BitMonoPcm".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VoiceoverError::UnsupportedFormat(_))
        ));

        let config = SynthesisConfig {
            global_speed: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VoiceoverError::InvalidConfig(_))
        ));
    }
}
