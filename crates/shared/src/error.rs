use serde::{Deserialize, Serialize};

/// Error envelope returned by the classification service on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Pulls `detail` out of an error body, falling back to the raw text.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<ApiError>(body).unwrap_or_else(|_| Self::new(body.trim()))
    }
}
