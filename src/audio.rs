use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, VoiceoverError};

/// Range a single ffmpeg `atempo` stage accepts.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Changes audio playback speed without changing pitch.
pub trait AudioStretcher {
    /// Write `input` played back `speed` times faster to `output`.
    ///
    /// The result lasts `duration(input) / speed`.
    fn stretch(&self, input: &Path, output: &Path, speed: f64) -> Result<()>;
}

/// [`AudioStretcher`] backed by the `ffmpeg` command-line tool.
///
/// Uses `ffmpeg` from PATH unless a binary is given explicitly.
#[derive(Debug, Clone, Default)]
pub struct FfmpegStretcher {
    pub bin_path: Option<PathBuf>,
}

impl FfmpegStretcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: Some(bin_path.into()),
        }
    }

    fn program(&self) -> &OsStr {
        self.bin_path
            .as_deref()
            .map(Path::as_os_str)
            .unwrap_or_else(|| OsStr::new("ffmpeg"))
    }
}

impl AudioStretcher for FfmpegStretcher {
    fn stretch(&self, input: &Path, output: &Path, speed: f64) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(VoiceoverError::AudioProcessing(format!(
                "speed must be a positive number, got {speed}"
            )));
        }

        let filter = atempo_filter(speed);
        log::debug!(
            "ffmpeg -i {} -filter:a {filter} {}",
            input.display(),
            output.display()
        );

        let result = Command::new(self.program())
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-filter:a", filter.as_str()])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VoiceoverError::AudioProcessing(
                        "ffmpeg not found. Install it (e.g. `sudo apt-get install ffmpeg`, \
                         `brew install ffmpeg`) or point FfmpegStretcher at a binary"
                            .to_string(),
                    )
                } else {
                    VoiceoverError::Io(e)
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(VoiceoverError::AudioProcessing(format!(
                "ffmpeg exited with code {:?}: {}",
                result.status.code(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Split `speed` into `atempo` stages that each stay within ffmpeg's range.
fn atempo_stages(speed: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    let mut remaining = speed;
    while remaining > ATEMPO_MAX {
        stages.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    stages.push(remaining);
    stages
}

fn atempo_filter(speed: f64) -> String {
    atempo_stages(speed)
        .iter()
        .map(|stage| format!("atempo={stage}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn in_range_speed_is_a_single_stage() {
        assert_eq!(atempo_filter(1.25), "atempo=1.25");
        assert_eq!(atempo_filter(0.5), "atempo=0.5");
        assert_eq!(atempo_filter(2.0), "atempo=2");
    }

    #[test]
    fn fast_speeds_are_chained() {
        assert_eq!(atempo_filter(5.0), "atempo=2,atempo=2,atempo=1.25");
    }

    #[test]
    fn slow_speeds_are_chained() {
        assert_eq!(atempo_filter(0.2), "atempo=0.5,atempo=0.5,atempo=0.8");
    }

    #[test]
    fn stages_multiply_back_to_speed() {
        for speed in [0.1, 0.33, 0.75, 1.5, 3.0, 7.5] {
            let product: f64 = atempo_stages(speed).iter().product();
            assert!((product - speed).abs() < 1e-9, "{speed}");
        }
    }

    #[test]
    fn missing_binary_is_an_audio_processing_error() {
        let dir = tempdir().unwrap();
        let stretcher = FfmpegStretcher::with_binary(dir.path().join("no-such-ffmpeg"));
        let err = stretcher
            .stretch(&dir.path().join("in.mp3"), &dir.path().join("out.mp3"), 2.0)
            .unwrap_err();
        assert!(matches!(err, VoiceoverError::AudioProcessing(_)));
    }

    #[test]
    fn ffmpeg_rejects_garbage_input() {
        // Skip when ffmpeg is unavailable in the execution environment.
        if Command::new("ffmpeg").arg("-version").output().is_err() {
            return;
        }

        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp3");
        std::fs::write(&input, b"definitely not audio").unwrap();
        let err = FfmpegStretcher::new()
            .stretch(&input, &dir.path().join("out.mp3"), 1.5)
            .unwrap_err();
        assert!(matches!(err, VoiceoverError::AudioProcessing(_)));
    }
}
