//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating fighter configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON document could not be decoded
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML document could not be decoded
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Decoded but semantically unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
