use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ClassifyError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/predict/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const SETTINGS_FILE: &str = "classifier.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies a timeout override; zero would fail every request and is ignored.
    pub fn set_request_timeout_secs(&mut self, secs: u64, source: &str) {
        if secs == 0 {
            tracing::warn!(
                "ignoring zero request timeout from {source}; keeping {}s",
                self.request_timeout_secs
            );
            return;
        }
        self.request_timeout_secs = secs;
    }

    /// Parses the endpoint, accepting only absolute http(s) URLs.
    pub fn endpoint_url(&self) -> Result<Url, ClassifyError> {
        let invalid = |reason: String| ClassifyError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(self.endpoint.trim()).map_err(|err| invalid(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    fn apply_file(&mut self, raw: &str) {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.endpoint {
                    self.endpoint = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    self.set_request_timeout_secs(v, SETTINGS_FILE);
                }
            }
            Err(err) => tracing::warn!("ignoring unreadable {SETTINGS_FILE}: {err}"),
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CLASSIFIER_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("APP__ENDPOINT") {
            self.endpoint = v;
        }

        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(parsed) => {
                    self.set_request_timeout_secs(parsed, "APP__REQUEST_TIMEOUT_SECS")
                }
                Err(_) => tracing::warn!("ignoring non-numeric APP__REQUEST_TIMEOUT_SECS={v}"),
            }
        }
    }
}

/// Defaults, then `classifier.toml` (or the file named by `CLASSIFIER_CONFIG`),
/// then environment overrides.
pub fn load_settings() -> ClientSettings {
    let path = std::env::var("CLASSIFIER_CONFIG").unwrap_or_else(|_| SETTINGS_FILE.to_string());
    load_settings_from(Path::new(&path), |name| {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    })
}

pub fn load_settings_from(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw);
    }
    settings.apply_env(lookup);

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
