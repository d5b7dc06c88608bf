//! Error types for shieldrule.

use thiserror::Error;

/// Error type for shieldrule operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filter list could not be fetched
    #[error("download error: {0}")]
    Download(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid domain name
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Unknown feature or toggle value
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// Filter rule parse error
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type alias for shieldrule operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for filter rule parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Pattern is empty once surrounding whitespace is removed
    #[error("malformed pattern: empty after trimming")]
    MalformedPattern,
}
