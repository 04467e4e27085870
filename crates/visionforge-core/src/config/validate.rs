//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.request.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "request.max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.request.temperature) {
            return Err(ConfigError::ValidationError(
                "request.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.processing.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.prompt.text.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prompt.text must not be empty".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
