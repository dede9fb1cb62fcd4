use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{BoundingBox, SpeciesInfo};

/// Body of a successful `POST /predict/` call.
///
/// Only `detected` is guaranteed. A positive detection is expected to carry
/// `species`, `confidence` and `info`; a negative one may carry `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// A box of the wrong shape decodes as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_bounding_box",
        skip_serializing_if = "Option::is_none"
    )]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<SpeciesInfo>,
}

impl ClassificationResponse {
    pub fn detection(species: impl Into<String>, confidence: f64, info: SpeciesInfo) -> Self {
        Self {
            detected: true,
            species: Some(species.into()),
            confidence: Some(confidence),
            info: Some(info),
            ..Self::default()
        }
    }

    pub fn not_detected(message: Option<String>) -> Self {
        Self {
            detected: false,
            message,
            ..Self::default()
        }
    }

    /// Server-supplied notice for a negative detection, if it sent a non-empty one.
    pub fn notice(&self) -> Option<&str> {
        self.message.as_deref().filter(|message| !message.is_empty())
    }
}

fn lenient_bounding_box<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value::<BoundingBox>(raw) {
        Ok(bbox) => Ok(Some(bbox)),
        Err(err) => {
            tracing::warn!("ignoring malformed bounding_box: {err}");
            Ok(None)
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}
