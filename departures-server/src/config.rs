//! Process configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::sncf::SncfConfig;

/// Address the server listens on.
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither an API key nor a mock directory was provided
    #[error("SNCF_API_KEY is not set (set SNCF_MOCK_DIR to run on fixtures)")]
    MissingApiKey,

    /// A variable was set to an empty or whitespace value
    #[error("{0} is set but empty")]
    Empty(&'static str),
}

/// Where transit data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// The live SNCF API.
    Live(SncfSettings),
    /// Fixture files in a directory.
    Mock(PathBuf),
}

/// Settings for the live client.
#[derive(Debug, Clone, PartialEq)]
pub struct SncfSettings {
    pub api_key: String,
    pub base_url: Option<String>,
}

impl SncfSettings {
    /// Client configuration for these settings.
    pub fn client_config(&self) -> SncfConfig {
        let config = SncfConfig::new(&self.api_key);
        match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub source: DataSource,
    pub addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// - `SNCF_MOCK_DIR`: serve fixtures from this directory instead of the API
    /// - `SNCF_API_KEY`: API key, required unless `SNCF_MOCK_DIR` is set
    /// - `SNCF_BASE_URL`: override of the coverage base URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                None => Ok(None),
                Some(v) if v.trim().is_empty() => Err(ConfigError::Empty(name)),
                Some(v) => Ok(Some(v.trim().to_string())),
            }
        };

        let source = match var("SNCF_MOCK_DIR")? {
            Some(dir) => DataSource::Mock(PathBuf::from(dir)),
            None => {
                let api_key = var("SNCF_API_KEY")?.ok_or(ConfigError::MissingApiKey)?;
                DataSource::Live(SncfSettings {
                    api_key,
                    base_url: var("SNCF_BASE_URL")?,
                })
            }
        };

        Ok(Self {
            source,
            addr: SocketAddr::from(DEFAULT_ADDR),
        })
    }
}
