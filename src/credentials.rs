use std::fmt;

use crate::error::{Result, VoiceoverError};

pub const SUBSCRIPTION_KEY_VAR: &str = "AZURE_SUBSCRIPTION_KEY";
pub const SERVICE_REGION_VAR: &str = "AZURE_SERVICE_REGION";

/// Azure Speech subscription key and service region.
///
/// Validated once, when a provider is constructed, so a missing value fails before
/// any request is sent or any file is written.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureCredentials {
    pub subscription_key: String,
    pub region: String,
}

impl AzureCredentials {
    pub fn new(subscription_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            subscription_key: subscription_key.into(),
            region: region.into(),
        }
    }

    /// Read credentials from the process environment, loading a `.env` file from
    /// the working directory (or its parents) first if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(VoiceoverError::MissingCredentials(name))
        };

        Ok(Self {
            subscription_key: require(SUBSCRIPTION_KEY_VAR)?,
            region: require(SERVICE_REGION_VAR)?,
        })
    }

    /// Fail with `MissingCredentials` when either value is blank.
    pub fn validate(&self) -> Result<()> {
        if self.subscription_key.trim().is_empty() {
            return Err(VoiceoverError::MissingCredentials(SUBSCRIPTION_KEY_VAR));
        }
        if self.region.trim().is_empty() {
            return Err(VoiceoverError::MissingCredentials(SERVICE_REGION_VAR));
        }
        Ok(())
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("subscription_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}
