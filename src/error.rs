//! Typed errors for configuration loading and CI history lookups

use std::path::PathBuf;
use thiserror::Error;

/// Fatal misconfiguration. A run never recovers from these.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported exclusion file extension '.{extension}' for file {path}")]
    UnsupportedExtension { extension: String, path: PathBuf },

    #[error("Failed to extract settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// Failures talking to the CI provider. These never escape the exclusion
/// registry; they are logged and degraded to "no history".
#[derive(Error, Debug)]
pub enum CiError {
    #[error("CIRCLE_API_TOKEN not set")]
    MissingToken,

    #[error("invalid CI token header value")]
    InvalidToken,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid pipeline timestamp '{0}'")]
    Timestamp(String),
}

pub type CiResult<T> = std::result::Result<T, CiError>;
