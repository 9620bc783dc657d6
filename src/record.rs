use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of unit a [`WordBoundary`] marks in the synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryType {
    Word,
    Punctuation,
    Sentence,
}

/// A timestamped marker for where a word (or punctuation mark) starts in the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBoundary {
    pub boundary_type: BoundaryType,
    /// Milliseconds from the start of the audio this boundary refers to.
    /// May be negative right after calibration for the very first word.
    pub audio_offset: i64,
    /// Spoken duration in milliseconds, as reported by the provider.
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub text: String,
    /// Character offset of `text` inside the markup.
    #[serde(default)]
    pub text_offset: u32,
    #[serde(default)]
    pub word_length: u32,
}

impl WordBoundary {
    /// Convenience constructor for a plain word boundary.
    pub fn word(text: impl Into<String>, audio_offset: i64) -> Self {
        let text = text.into();
        Self {
            boundary_type: BoundaryType::Word,
            audio_offset,
            duration_ms: 0,
            word_length: text.chars().count() as u32,
            text,
            text_offset: 0,
        }
    }
}

/// The outcome of synthesizing one narration snippet.
///
/// Produced once per fingerprint on a cache miss, then reloaded from disk on every
/// later hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRecord {
    /// SSML sent to the provider.
    pub markup: String,
    /// Playback-rate multiplier baked into `final_audio_path`.
    pub global_speed: f64,
    /// Boundaries with offsets relative to `final_audio_path`.
    pub word_boundaries: Vec<WordBoundary>,
    /// Boundaries with offsets relative to `original_audio_path`. This is the
    /// form stored in the record file.
    pub original_word_boundaries: Vec<WordBoundary>,
    /// Audio exactly as the provider produced it.
    pub original_audio_path: PathBuf,
    /// Audio to play back. Same as `original_audio_path` when `global_speed` is 1.
    pub final_audio_path: PathBuf,
    /// Location of the JSON record describing this result.
    pub record_path: PathBuf,
}

impl SynthesisRecord {
    /// Whether `final_audio_path` is a time-stretched copy of the original audio.
    pub fn is_speed_adjusted(&self) -> bool {
        self.final_audio_path != self.original_audio_path
    }

    /// Offset of the last boundary in the final audio, if any.
    pub fn last_offset_ms(&self) -> Option<i64> {
        self.word_boundaries.last().map(|b| b.audio_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryType, WordBoundary};

    #[test]
    fn boundary_type_serializes_by_name() {
        let json = serde_json::to_string(&BoundaryType::Punctuation).unwrap();
        assert_eq!(json, "\"Punctuation\"");
    }

    #[test]
    fn provider_fields_default_when_missing() {
        let boundary: WordBoundary =
            serde_json::from_str(r#"{"boundary_type":"Word","audio_offset":781}"#).unwrap();
        assert_eq!(boundary.audio_offset, 781);
        assert_eq!(boundary.duration_ms, 0);
        assert!(boundary.text.is_empty());
    }
}
