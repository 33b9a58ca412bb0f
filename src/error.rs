// Error types for i3-statusline
//
// This module defines error types using thiserror for better error handling
// and debugging throughout the application.

use thiserror::Error;

/// Main error type for the bar runtime
#[derive(Error, Debug)]
pub enum BarError {
    #[error("Failed to write status line: {0}")]
    Output(#[source] std::io::Error),

    #[error("Failed to encode status line: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Secret bootstrap and token storage errors
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret store access failed: {0}")]
    Store(String),

    #[error("Failed to obtain random bytes: {0}")]
    Random(#[from] rand::Error),

    #[error("Invalid key encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Encryption key must be {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("Token could not be decrypted (wrong key or corrupted file)")]
    Decrypt,

    #[error("Token could not be encrypted")]
    Encrypt,

    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data directory not found")]
    NoDataDir,
}

impl From<keyring::Error> for SecretError {
    fn from(e: keyring::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// GitHub notifications errors
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("No GitHub token stored")]
    NoToken,

    #[error("GitHub rejected the stored token")]
    Unauthorized,
}

impl GithubError {
    /// Worth retrying: network failures and unexpected HTTP statuses
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::InvalidResponse(_))
    }
}

// Convenience type aliases for common Result types
pub type Result<T> = std::result::Result<T, BarError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type SecretResult<T> = std::result::Result<T, SecretError>;
pub type GithubResult<T> = std::result::Result<T, GithubError>;
