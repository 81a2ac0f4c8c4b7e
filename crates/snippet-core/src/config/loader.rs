//! Configuration loader for YAML files and environment overrides

use std::env;
use std::path::Path;
use tokio::fs;

use crate::config::RunnerConfig;
use crate::errors::ConfigError;

pub const ENV_TIMEOUT_SECONDS: &str = "SNIPPET_RUNNER_TIMEOUT_SECONDS";
pub const ENV_REFRESH_IMAGES: &str = "SNIPPET_RUNNER_REFRESH_IMAGES";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file, then apply environment overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let mut config = Self::from_str(&content)?;
        Self::apply_env_overrides(&mut config)?;
        log::debug!("Loaded runner configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from an optional file; defaults plus environment
    /// overrides when no path is given.
    pub async fn load(path: Option<&Path>) -> Result<RunnerConfig, ConfigError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => {
                let mut config = RunnerConfig::default();
                Self::apply_env_overrides(&mut config)?;
                Ok(config)
            }
        }
    }

    pub fn from_str(content: &str) -> Result<RunnerConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(RunnerConfig::default());
        }
        let config: RunnerConfig = serde_yaml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn apply_env_overrides(config: &mut RunnerConfig) -> Result<(), ConfigError> {
        if let Ok(value) = env::var(ENV_TIMEOUT_SECONDS) {
            let seconds = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_SECONDS.to_string(),
                value: value.clone(),
            })?;
            config.sandbox.timeout_seconds = Some(seconds);
        }

        if let Ok(value) = env::var(ENV_REFRESH_IMAGES) {
            let refresh = match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: ENV_REFRESH_IMAGES.to_string(),
                        value,
                    })
                }
            };
            config.set_refresh_images(refresh);
        }

        Ok(())
    }

    fn validate(config: &RunnerConfig) -> Result<(), ConfigError> {
        let root = config.sandbox.root.trim_end_matches('/');
        if !config.sandbox.root.starts_with('/') || root.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "sandbox.root must be an absolute directory other than '/', got '{}'",
                config.sandbox.root
            )));
        }
        if config.sandbox.timeout_seconds == Some(0) {
            return Err(ConfigError::Invalid(
                "sandbox.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        for (language, overrides) in &config.languages {
            if matches!(&overrides.image, Some(image) if image.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "languages.{}.image must not be empty",
                    language
                )));
            }
        }
        Ok(())
    }
}
