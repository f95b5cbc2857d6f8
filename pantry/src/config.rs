use catalog::executor::Throttle;
use exporter::config::ExporterConfig;
use serde::Deserialize;
use std::fs::File;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("auth api_key cannot be empty")]
    EmptyApiKey,

    #[error("store base_url cannot be empty")]
    EmptyStoreUrl,

    #[error("store collection cannot be empty")]
    EmptyCollection,

    #[error("exporter: {0}")]
    Exporter(#[from] exporter::config::ValidationError),
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Bearer token callers must present on every endpoint.
    pub api_key: String,
}

/// Managed entity store endpoint and credentials.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: String,
    /// Collection the batch endpoints mutate.
    pub collection: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogConfig {
    pub store: StoreConfig,

    /// Delete-path throttle. Defaults to the observed provider rate limit;
    /// explicit `null` disables pausing. The update path never pauses.
    #[serde(default = "default_delete_throttle")]
    pub delete_throttle: Option<Throttle>,
}

fn default_delete_throttle() -> Option<Throttle> {
    Some(Throttle::default())
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NotificationTarget {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    pub recipient: String,
    pub targets: Vec<NotificationTarget>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub auth: AuthConfig,
    pub exporter: ExporterConfig,
    pub catalog: CatalogConfig,
    pub notifications: Option<NotificationsConfig>,
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.listener.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.auth.api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        if self.catalog.store.base_url.is_empty() {
            return Err(ValidationError::EmptyStoreUrl);
        }
        if self.catalog.store.collection.is_empty() {
            return Err(ValidationError::EmptyCollection);
        }
        self.exporter.validate()?;

        Ok(())
    }
}
