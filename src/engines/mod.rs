//! Speech synthesis providers.
//!
//! This module contains implementations of [`SpeechProvider`](crate::SpeechProvider).
//!
//! # Available Providers
//!
//! Enable providers via Cargo features:
//! - `azure` - Azure Speech text-to-speech (REST, requires a subscription key)

#[cfg(feature = "azure")]
pub mod azure;
