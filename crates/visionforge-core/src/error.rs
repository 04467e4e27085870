//! Error types for VisionForge.
//!
//! Errors are split by where they originate: configuration problems refuse a
//! run before it starts, adapter errors are scoped to a single image.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No credential configured for the selected provider
    #[error("{provider} API key not set. Set {env_var} or pass --api-key.")]
    MissingCredential { provider: String, env_var: String },

    /// Provider needs an explicit base URL and none was given
    #[error("{provider} requires a base URL. Set provider.base_url or pass --base-url.")]
    MissingEndpoint { provider: String },
}

/// Errors raised by a provider adapter for one request.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Network failure or non-success HTTP status
    #[error("{provider} transport error{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        provider: String,
        status: Option<u16>,
        body: String,
    },

    /// The provider replied, but the reply could not be decoded
    #[error("Failed to parse {provider} reply: {message}")]
    Parse { provider: String, message: String },
}

impl AdapterError {
    /// HTTP status code, when the failure came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::Transport { status, .. } => *status,
            AdapterError::Parse { .. } => None,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, AdapterError::Parse { .. })
    }
}
