//! Local image selection: the bytes and media type of one chosen file.

use std::path::Path;

use crate::error::MediaError;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl SelectedImage {
    /// Builds a selection from in-memory bytes. A blank `declared_type` is
    /// replaced by a guess from the file extension.
    pub fn new(name: impl Into<String>, declared_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = resolve_media_type(&name, declared_type);
        Self {
            name,
            media_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, MediaError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, None, bytes))
    }

    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }

    pub fn require_image(self) -> Result<Self, MediaError> {
        if self.is_image() {
            Ok(self)
        } else {
            Err(MediaError::NotAnImage {
                name: self.name,
                media_type: self.media_type,
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.trim().to_ascii_lowercase().starts_with("image/")
}

fn resolve_media_type(name: &str, declared_type: Option<&str>) -> String {
    match declared_type.map(str::trim) {
        Some(declared) if !declared.is_empty() => declared.to_string(),
        _ => mime_guess::from_path(name)
            .first_raw()
            .unwrap_or(FALLBACK_MEDIA_TYPE)
            .to_string(),
    }
}

#[cfg(test)]
#[path = "tests/media_tests.rs"]
mod tests;
