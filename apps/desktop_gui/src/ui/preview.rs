//! Local image preview decoding and detection box placement.

use eframe::egui;
use shared::domain::BoundingBox;

const PREVIEW_MAX_DIMENSION: u32 = 1024;

#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
    /// Dimensions of the undecimated source, which detection boxes refer to.
    pub source_width: u32,
    pub source_height: u32,
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let (source_width, source_height) = (dynamic.width(), dynamic.height());
    let resized = dynamic
        .thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
        .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
        source_width,
        source_height,
    })
}

/// Size the preview is drawn at: the texture scaled down to fit `max`, never up.
pub fn fit_preview_size(texture_size: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
    let scale = (max.x / texture_size.x)
        .min(max.y / texture_size.y)
        .min(1.0);
    texture_size * scale
}

/// Maps a box in source-image pixels onto the rect the preview occupies.
pub fn bbox_screen_rect(bbox: &BoundingBox, preview: &PreviewImage, drawn: egui::Rect) -> egui::Rect {
    let sx = drawn.width() / preview.source_width.max(1) as f32;
    let sy = drawn.height() / preview.source_height.max(1) as f32;
    let min = drawn.min + egui::vec2(bbox.x_min as f32 * sx, bbox.y_min as f32 * sy);
    let size = egui::vec2(bbox.width as f32 * sx, bbox.height as f32 * sy);
    egui::Rect::from_min_size(min, size).intersect(drawn)
}
