//! Layered configuration loading via the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::ProviderConfig;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "FASTSSM";

/// Environment variable naming a configuration file
pub const CONFIG_PATH_ENV: &str = "FASTSSM_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Defaults, then `FASTSSM_CONFIG_PATH` if set, then environment overrides
    pub fn load() -> ConfigResult<ProviderConfig> {
        let mut loader = Self::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            loader = loader.with_file(path);
        }
        loader.build()
    }

    /// Defaults, then `path`, then environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<ProviderConfig> {
        Self::new().with_file(path.as_ref()).build()
    }

    pub fn build(&self) -> ConfigResult<ProviderConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigurationError::file_not_found(path.display().to_string()));
            }
            debug!(path = %path.display(), "📁 Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ProviderConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(ConfigurationError::load_error)?;

        let sanitized = config.sanitized();
        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&sanitized)
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            region = config.region.as_deref().unwrap_or("<default>"),
            credentials = ?config.credential_source(),
            "✅ Provider configuration loaded"
        );
        Ok(config)
    }
}
