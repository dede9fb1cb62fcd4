use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("malformed classifier response: {0}")]
    MalformedBody(String),
    #[error("no species information for '{0}'")]
    NotFound(String),
    #[error("invalid classifier endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl ClassifyError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{name}' is not an image (media type {media_type})")]
    NotAnImage { name: String, media_type: String },
}
