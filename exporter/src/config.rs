use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("provider base_url cannot be empty")]
    EmptyProviderUrl,

    #[error("provider api_key cannot be empty")]
    EmptyApiKey,

    #[error("poller max_attempts must be at least 1")]
    ZeroAttempts,
}

/// Which provider style the export flow drives.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// One call, artifact bytes in the response.
    Direct,
    /// Submit a job, poll its status, download the artifact.
    Polled,
}

/// Conversion provider endpoint and credentials.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub mode: ConversionMode,
}

/// Poll cadence and budget for the polled provider style.
///
/// The defaults (1s between polls, 30 polls) bound one generation call to
/// roughly half a minute of waiting; no correctness property depends on the
/// exact values.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct PollerSettings {
    #[serde(default = "default_poll_interval_millis")]
    pub poll_interval_millis: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval_millis() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    30
}

impl Default for PollerSettings {
    fn default() -> Self {
        PollerSettings {
            poll_interval_millis: default_poll_interval_millis(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollerSettings {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_millis)
    }
}

/// Exporter configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ExporterConfig {
    pub provider: ProviderConfig,

    #[serde(default)]
    pub poller: PollerSettings,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider.base_url.is_empty() {
            return Err(ValidationError::EmptyProviderUrl);
        }
        if self.provider.api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        if self.poller.max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        Ok(())
    }
}
