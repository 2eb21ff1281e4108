//! Configuration Loader
//!
//! Environment-aware configuration loading built on the `config` crate.
//! Handles file discovery, environment detection, and layering of overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::LineflowConfig;
use crate::constants;
use crate::error::Result;

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: LineflowConfig,
    environment: String,
    config_source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    ///
    /// The file named by `LINEFLOW_CONFIG` is required when the variable is set;
    /// otherwise `config/lineflow.{toml,yaml,json}` is used if present.
    pub fn load() -> Result<Arc<ConfigManager>> {
        let path = env::var(constants::env::CONFIG_PATH).ok().map(PathBuf::from);
        Self::load_from_path(path.as_deref())
    }

    /// Load configuration from an explicit file, still honouring `LINEFLOW_*` overrides
    pub fn load_from_path(path: Option<&Path>) -> Result<Arc<ConfigManager>> {
        Self::build(path, Some(constants::env::CONFIG_PREFIX))
    }

    fn build(path: Option<&Path>, env_prefix: Option<&str>) -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let defaults = config::Config::try_from(&LineflowConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder.add_source(config::File::from(path.to_path_buf()).required(true))
            }
            None => builder.add_source(
                config::File::with_name(constants::DEFAULT_CONFIG_FILE).required(false),
            ),
        };

        if let Some(prefix) = env_prefix {
            let overrides = config::Environment::with_prefix(prefix).try_parsing(true);
            builder = builder.add_source(overrides);
        }

        let config: LineflowConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Configuration loaded: {}",
            serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %environment,
            poll_interval_ms = config.poll_interval_ms,
            record_max_len = config.record_max_len,
            terminate_on_eof = config.terminate_on_eof,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_source: path.map(Path::to_path_buf),
        }))
    }

    pub fn config(&self) -> &LineflowConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Explicit file the configuration was read from, if any
    pub fn config_source(&self) -> Option<&Path> {
        self.config_source.as_deref()
    }

    /// Detect current environment: LINEFLOW_ENV || APP_ENV || 'development'
    pub(crate) fn detect_environment() -> String {
        env::var(constants::env::ENVIRONMENT)
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}
