use std::fs;
use std::path::Path;

use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::protocol::frame::CloseFrame;
use tungstenite::Message;
use uuid::Uuid;

use super::engine::AZURE_TIMESTAMP_BIAS_MS;
use super::format::rest_output_format;
use super::protocol::{speech_config_message, ssml_message, TurnCollector};
use crate::config::AudioFormat;
use crate::credentials::AzureCredentials;
use crate::error::{Result, VoiceoverError};
use crate::record::WordBoundary;
use crate::SpeechProvider;

fn synthesis_failure(reason: &str, err: impl std::fmt::Display) -> VoiceoverError {
    VoiceoverError::Synthesis {
        reason: reason.to_string(),
        details: Some(err.to_string()),
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Azure Speech text-to-speech over the synthesis websocket.
///
/// Each call opens one connection, requests word-boundary metadata, and collects
/// the audio chunks and `WordBoundary` events of a single turn. Offsets are
/// converted from Azure's 100 ns ticks to milliseconds and returned uncalibrated.
///
/// # Quick Start
///
/// ```rust,no_run
/// use voiceover_rs::engines::azure::AzureStreamingEngine;
///
/// // Reads AZURE_SUBSCRIPTION_KEY and AZURE_SERVICE_REGION
/// let engine = AzureStreamingEngine::from_env()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AzureStreamingEngine {
    credentials: AzureCredentials,
    endpoint: Option<String>,
}

impl AzureStreamingEngine {
    /// Create an engine for the given credentials. Blank values fail with
    /// `MissingCredentials`.
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        credentials.validate()?;
        Ok(Self {
            credentials,
            endpoint: None,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AzureCredentials::from_env()?)
    }

    /// Connect to `endpoint` instead of the regional default.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn region(&self) -> &str {
        &self.credentials.region
    }

    pub fn endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "wss://{}.tts.speech.microsoft.com/cognitiveservices/websocket/v1",
                self.credentials.region
            )
        })
    }
}

impl SpeechProvider for AzureStreamingEngine {
    fn synthesize(
        &mut self,
        markup: &str,
        format: &AudioFormat,
        audio_path: &Path,
    ) -> Result<Vec<WordBoundary>> {
        let output_format = rest_output_format(format.name())?;
        let connection_id = Uuid::new_v4().simple().to_string();
        let url = format!("{}?X-ConnectionId={connection_id}", self.endpoint());

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| synthesis_failure("Invalid Azure Speech websocket URL", e))?;
        let key = HeaderValue::from_str(&self.credentials.subscription_key)
            .map_err(|e| synthesis_failure("Subscription key is not a valid header", e))?;
        request
            .headers_mut()
            .insert("Ocp-Apim-Subscription-Key", key);

        log::debug!("Connecting to {url} ({output_format})");
        let (mut socket, _) = tungstenite::connect(request)
            .map_err(|e| synthesis_failure("Connection to Azure Speech failed", e))?;

        let request_id = Uuid::new_v4().simple().to_string();
        for message in [
            speech_config_message(output_format, &timestamp()),
            ssml_message(&request_id, markup, &timestamp()),
        ] {
            socket
                .send(Message::text(message))
                .map_err(|e| synthesis_failure("Failed to send request to Azure Speech", e))?;
        }

        let mut turn = TurnCollector::default();
        while !turn.is_finished() {
            let message = socket
                .read()
                .map_err(|e| synthesis_failure("Azure Speech connection failed", e))?;
            match message {
                Message::Text(frame) => turn.handle_text(frame.as_str())?,
                Message::Binary(frame) => turn.handle_binary(&frame)?,
                Message::Close(frame) => return Err(canceled(frame)),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        if let Err(e) = socket.close(None) {
            log::debug!("Closing Azure Speech connection: {e}");
        }

        let (audio, boundaries) = turn.finish()?;
        fs::write(audio_path, &audio)?;
        log::info!(
            "Azure Speech wrote {} bytes and {} boundaries to {}",
            audio.len(),
            boundaries.len(),
            audio_path.display()
        );

        Ok(boundaries)
    }

    fn timestamp_bias_ms(&self) -> u64 {
        AZURE_TIMESTAMP_BIAS_MS
    }
}

/// The service closes the socket mid-turn when it rejects the request.
fn canceled(frame: Option<CloseFrame>) -> VoiceoverError {
    VoiceoverError::Synthesis {
        reason: "Canceled".to_string(),
        details: frame.map(|f| format!("{}: {}", f.code, f.reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::SUBSCRIPTION_KEY_VAR;
    use tempfile::tempdir;
    use tungstenite::protocol::frame::coding::CloseCode;

    #[test]
    fn endpoint_follows_region() {
        let engine = AzureStreamingEngine::new(AzureCredentials::new("key", "westeurope")).unwrap();
        assert_eq!(
            engine.endpoint(),
            "wss://westeurope.tts.speech.microsoft.com/cognitiveservices/websocket/v1"
        );
        assert_eq!(engine.region(), "westeurope");
        assert_eq!(engine.timestamp_bias_ms(), 219);
    }

    #[test]
    fn blank_key_fails_fast() {
        assert!(matches!(
            AzureStreamingEngine::new(AzureCredentials::new(" ", "eastus")),
            Err(VoiceoverError::MissingCredentials(SUBSCRIPTION_KEY_VAR))
        ));
    }

    #[test]
    fn close_frame_becomes_canceled_synthesis_error() {
        let err = canceled(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "Quota exceeded".into(),
        }));
        match err {
            VoiceoverError::Synthesis { reason, details } => {
                assert_eq!(reason, "Canceled");
                assert!(details.unwrap().contains("Quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreachable_endpoint_is_a_synthesis_error_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let audio_path = dir.path().join("out.mp3");
        let mut engine = AzureStreamingEngine::new(AzureCredentials::new("key", "eastus"))
            .unwrap()
            .with_endpoint("ws://127.0.0.1:9/cognitiveservices/websocket/v1");
        let format = AudioFormat::parse("Audio48Khz192KBitRateMonoMp3").unwrap();

        let err = engine
            .synthesize("<speak/>", &format, &audio_path)
            .unwrap_err();
        assert!(matches!(err, VoiceoverError::Synthesis { .. }));
        assert!(!audio_path.exists());
    }
}
