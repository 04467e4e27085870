//! Configuration management for VisionForge.
//!
//! Configuration is loaded from the platform config directory
//! (`visionforge/config.toml`) with sensible defaults for every section.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::types::{ProcessingOptions, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider selection and credentials
    pub provider: ProviderSection,

    /// Captioning prompt
    pub prompt: PromptConfig,

    /// Optional output fields requested by default
    pub options: ProcessingOptions,

    /// Sampling parameters
    pub request: RequestConfig,

    /// Input discovery
    pub processing: ProcessingConfig,

    /// Output files
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.visionforge.visionforge/config.toml
    /// - Linux: ~/.config/visionforge/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\visionforge\config\config.toml
    ///
    /// Falls back to ~/.visionforge/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "visionforge", "visionforge")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".visionforge").join("config.toml")
            })
    }

    /// Resolve the provider section into a run-ready [`ProviderConfig`].
    ///
    /// The credential may be empty here; the adapter factory refuses it.
    pub fn provider_config(&self) -> ProviderConfig {
        let section = &self.provider;
        let preset = section.kind.preset();

        let api_key = resolve_env_var(&section.api_key)
            .or_else(|| std::env::var(preset.api_key_env).ok())
            .unwrap_or_default();
        let model = if section.model.trim().is_empty() {
            preset.default_model.to_string()
        } else {
            section.model.clone()
        };

        ProviderConfig {
            kind: section.kind,
            api_key,
            base_url: section.base_url.clone(),
            model,
        }
    }

    /// Default dataset output path (with ~ expansion).
    pub fn dataset_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output.dataset_file).into_owned())
    }

    /// Default statistics report path (with ~ expansion).
    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output.report_file).into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
