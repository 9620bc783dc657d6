//! Azure Speech text-to-speech provider.
//!
//! Two adapters talk to the Azure Speech service of the configured region. Both are
//! blocking; each call returns once the full audio has been received and written.
//!
//! | Engine | Transport | Word boundaries |
//! |---|---|---|
//! | [`AzureStreamingEngine`] | websocket (`/cognitiveservices/websocket/v1`) | yes |
//! | [`AzureEngine`] | REST (`/cognitiveservices/v1`) | no |
//!
//! # Credentials
//!
//! Two values are required, normally taken from the environment (or a `.env` file):
//!
//! | Variable | Meaning |
//! |---|---|
//! | `AZURE_SUBSCRIPTION_KEY` | Speech resource key |
//! | `AZURE_SERVICE_REGION` | Region of the resource, e.g. `westeurope` |
//!
//! # Word Boundaries
//!
//! The streaming engine asks for `WordBoundary` metadata and converts its 100 ns
//! ticks to milliseconds. The REST endpoint has no such events, so its records carry
//! an empty boundary list. Azure's offsets run [`AZURE_TIMESTAMP_BIAS_MS`] late; the
//! bias is exposed through
//! [`SpeechProvider::timestamp_bias_ms`](crate::SpeechProvider::timestamp_bias_ms).
//!
//! # Examples
//!
//! ```rust,no_run
//! use voiceover_rs::{engines::azure::AzureStreamingEngine, SynthesisConfig, Synthesizer};
//!
//! let engine = AzureStreamingEngine::from_env()?;
//! let config = SynthesisConfig::builder()
//!     .voice("en-US-JennyNeural")
//!     .style("cheerful")
//!     .build()?;
//!
//! let mut synthesizer = Synthesizer::new(engine, config)?;
//! let record = synthesizer.synthesize_from_text("Let's get started.")?;
//! println!("Narration at {}", record.final_audio_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod format;
pub mod protocol;
pub mod streaming;

pub use engine::{AzureEngine, AZURE_TIMESTAMP_BIAS_MS};
pub use format::rest_output_format;
pub use streaming::AzureStreamingEngine;
