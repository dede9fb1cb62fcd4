use serde::{Deserialize, Serialize};

/// Shown wherever the classifier left a descriptive field blank.
pub const INFO_PLACEHOLDER: &str = "N/A";

/// Descriptive metadata the classifier attaches to a detected species.
///
/// Every field is optional on the wire. The live service sometimes answers
/// with only `name` and `error` when its lookup failed, which still
/// deserializes here with the descriptive fields left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habitat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SpeciesInfo {
    pub fn scientific_name_or_placeholder(&self) -> &str {
        or_placeholder(self.scientific_name.as_deref())
    }

    pub fn lifespan_or_placeholder(&self) -> &str {
        or_placeholder(self.lifespan.as_deref())
    }

    pub fn habitat_or_placeholder(&self) -> &str {
        or_placeholder(self.habitat.as_deref())
    }

    pub fn description_or_placeholder(&self) -> &str {
        or_placeholder(self.description.as_deref())
    }
}

/// Absent and empty values count as missing; anything else is shown as sent.
pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => INFO_PLACEHOLDER,
    }
}

/// Detection box in source-image pixels, serialized as `[x_min, y_min, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub width: f64,
    pub height: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x_min, y_min, width, height]: [f64; 4]) -> Self {
        Self {
            x_min,
            y_min,
            width,
            height,
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(value: BoundingBox) -> Self {
        [value.x_min, value.y_min, value.width, value.height]
    }
}
