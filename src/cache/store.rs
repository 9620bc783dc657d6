use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprint;
use crate::config::AudioFormat;
use crate::error::{Result, VoiceoverError};
use crate::record::{SynthesisRecord, WordBoundary};
use crate::timing;

const RECORD_EXTENSION: &str = "json";

/// On-disk form of a [`SynthesisRecord`].
///
/// Boundaries are stored relative to the original audio. The final-audio offsets
/// are derived from them on load.
#[derive(Serialize, Deserialize)]
struct RecordFile {
    markup: String,
    #[serde(default = "unit_speed")]
    global_speed: f64,
    #[serde(default)]
    word_boundaries: Vec<WordBoundary>,
    original_audio: PathBuf,
    final_audio: PathBuf,
    #[serde(default)]
    record_path: Option<PathBuf>,
}

fn unit_speed() -> f64 {
    1.0
}

/// Fingerprint-addressed storage for synthesized audio and its records.
///
/// Layout inside the store directory:
///
/// ```text
/// <fingerprint>.mp3            # audio as produced by the provider
/// <fingerprint>_adjusted.mp3   # time-stretched copy, only when global_speed != 1
/// <fingerprint>.json           # the record
/// ```
///
/// The record file is the only liveness signal: an entry exists once its record
/// does. Entries are never rewritten or removed.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Canonical path of the original audio for `fingerprint`.
    pub fn audio_path(&self, fingerprint: &Fingerprint, format: &AudioFormat) -> PathBuf {
        self.dir.join(format!("{fingerprint}.{}", format.extension()))
    }

    /// Canonical path of the record for `fingerprint`.
    pub fn record_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{fingerprint}.{RECORD_EXTENSION}"))
    }

    /// Path of the record for `fingerprint`, if one has been persisted.
    pub fn locate(&self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        let path = self.record_path(fingerprint);
        path.is_file().then_some(path)
    }

    /// Read the record at `path`.
    ///
    /// The returned record's `record_path` is `path`, whatever the file itself says.
    pub fn load(&self, path: &Path) -> Result<SynthesisRecord> {
        load_record(path)
    }

    /// Write `record` as the entry for `fingerprint` and return the record path.
    ///
    /// The audio the record references must already exist.
    pub fn persist(&self, fingerprint: &Fingerprint, record: &SynthesisRecord) -> Result<PathBuf> {
        let path = self.record_path(fingerprint);
        write_record(&path, record)?;
        Ok(path)
    }
}

/// Read and validate a record file.
pub fn load_record(path: &Path) -> Result<SynthesisRecord> {
    let corrupt = |reason: String| VoiceoverError::CorruptRecord {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| corrupt(format!("unreadable: {e}")))?;
    let file: RecordFile =
        serde_json::from_str(&content).map_err(|e| corrupt(format!("malformed: {e}")))?;

    if !(file.global_speed.is_finite() && file.global_speed > 0.0) {
        return Err(corrupt(format!(
            "global_speed {} is not a positive number",
            file.global_speed
        )));
    }
    if file.global_speed == 1.0 && file.final_audio != file.original_audio {
        return Err(corrupt(
            "final audio differs from original audio at unit speed".to_string(),
        ));
    }

    if let Some(stored) = &file.record_path {
        if stored != path {
            log::debug!(
                "Record at {} names itself {}, using actual location",
                path.display(),
                stored.display()
            );
        }
    }

    Ok(SynthesisRecord {
        word_boundaries: timing::rescale(&file.word_boundaries, file.global_speed),
        original_word_boundaries: file.word_boundaries,
        markup: file.markup,
        global_speed: file.global_speed,
        original_audio_path: file.original_audio,
        final_audio_path: file.final_audio,
        record_path: path.to_path_buf(),
    })
}

/// Write `record` to `path`.
///
/// The JSON goes to a temporary sibling first and is renamed into place, so a
/// reader never observes a partially written record.
pub fn write_record(path: &Path, record: &SynthesisRecord) -> Result<()> {
    for audio in [&record.original_audio_path, &record.final_audio_path] {
        if !audio.is_file() {
            return Err(VoiceoverError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "Refusing to persist record {}: audio {} does not exist",
                    path.display(),
                    audio.display()
                ),
            )));
        }
    }

    let file = RecordFile {
        markup: record.markup.clone(),
        global_speed: record.global_speed,
        word_boundaries: record.original_word_boundaries.clone(),
        original_audio: record.original_audio_path.clone(),
        final_audio: record.final_audio_path.clone(),
        record_path: Some(path.to_path_buf()),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| VoiceoverError::ConfigSerialization(e.to_string()))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    log::info!("Persisted synthesis record {}", path.display());
    Ok(())
}
