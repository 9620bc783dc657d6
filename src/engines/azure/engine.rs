use std::fs;
use std::path::Path;

use reqwest::blocking::Client;

use super::format::rest_output_format;
use crate::config::AudioFormat;
use crate::credentials::AzureCredentials;
use crate::error::{Result, VoiceoverError};
use crate::record::WordBoundary;
use crate::SpeechProvider;

/// How late Azure reports word-boundary offsets, in milliseconds.
pub const AZURE_TIMESTAMP_BIAS_MS: u64 = 219;

const USER_AGENT: &str = concat!("voiceover-rs/", env!("CARGO_PKG_VERSION"));

/// Azure Speech text-to-speech over REST.
///
/// The REST endpoint returns audio only, so every call reports an empty boundary
/// list. Use [`AzureStreamingEngine`](super::AzureStreamingEngine) when word timing
/// is needed; this engine is the fallback for networks that block websockets.
///
/// # Quick Start
///
/// ```rust,no_run
/// use voiceover_rs::{engines::azure::AzureEngine, AzureCredentials};
///
/// // Reads AZURE_SUBSCRIPTION_KEY and AZURE_SERVICE_REGION
/// let engine = AzureEngine::from_env()?;
///
/// // Or pass credentials explicitly
/// let engine = AzureEngine::new(AzureCredentials::new("key", "westeurope"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AzureEngine {
    credentials: AzureCredentials,
    client: Client,
    endpoint: Option<String>,
}

impl AzureEngine {
    /// Create an engine for the given credentials.
    ///
    /// Blank credential values fail with `MissingCredentials` here, before any
    /// request can be made.
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        credentials.validate()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VoiceoverError::Synthesis {
                reason: "Failed to build HTTP client".to_string(),
                details: Some(e.to_string()),
            })?;

        Ok(Self {
            credentials,
            client,
            endpoint: None,
        })
    }

    /// Create an engine from `AZURE_SUBSCRIPTION_KEY` / `AZURE_SERVICE_REGION`.
    pub fn from_env() -> Result<Self> {
        Self::new(AzureCredentials::from_env()?)
    }

    /// Send requests to `endpoint` instead of the regional default.
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
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.credentials.region
            )
        })
    }
}

impl SpeechProvider for AzureEngine {
    fn synthesize(
        &mut self,
        markup: &str,
        format: &AudioFormat,
        audio_path: &Path,
    ) -> Result<Vec<WordBoundary>> {
        let output_format = rest_output_format(format.name())?;
        let endpoint = self.endpoint();
        log::debug!("POST {endpoint} ({output_format})");

        let response = self
            .client
            .post(&endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.credentials.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", output_format)
            .body(markup.to_string())
            .send()
            .map_err(|e| VoiceoverError::Synthesis {
                reason: "Request to Azure Speech failed".to_string(),
                details: Some(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let body = body.trim();
            return Err(VoiceoverError::Synthesis {
                reason: format!("Azure Speech returned {status}"),
                details: (!body.is_empty()).then(|| body.to_string()),
            });
        }

        let audio = response.bytes().map_err(|e| VoiceoverError::Synthesis {
            reason: "Failed to read Azure Speech audio".to_string(),
            details: Some(e.to_string()),
        })?;
        if audio.is_empty() {
            return Err(VoiceoverError::Synthesis {
                reason: "Azure Speech returned no audio".to_string(),
                details: None,
            });
        }

        fs::write(audio_path, &audio)?;
        log::info!(
            "Azure Speech wrote {} bytes to {}",
            audio.len(),
            audio_path.display()
        );

        // REST carries no boundary events
        Ok(Vec::new())
    }

    fn timestamp_bias_ms(&self) -> u64 {
        AZURE_TIMESTAMP_BIAS_MS
    }
}
