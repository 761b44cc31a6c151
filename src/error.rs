// Error types shared by the remote clients and the config loader.
// Navigation itself never fails: exhaustion and guard rejections are states,
// not errors, so only I/O and configuration show up here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid URL '{url}': {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, PlayerError>;
