use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum VoiceoverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize synthesis config: {0}")]
    ConfigSerialization(String),
    #[error("Invalid synthesis config: {0}")]
    InvalidConfig(String),
    #[error("Unrecognized output format '{0}'. Only MP3 output formats are supported.")]
    UnsupportedFormat(String),
    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(&'static str),
    #[error(
        "Speech synthesis failed: {reason}{}",
        .details.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
    )]
    Synthesis {
        reason: String,
        details: Option<String>,
    },
    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),
    #[error("Corrupt synthesis record at {}: {reason}", .path.display())]
    CorruptRecord { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, VoiceoverError>;
