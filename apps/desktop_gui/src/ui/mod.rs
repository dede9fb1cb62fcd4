//! UI layer for desktop GUI: app shell, screen state and image preview.

pub mod app;
pub mod preview;
pub mod screen;

pub use app::{DesktopGuiApp, PersistedDesktopSettings, SETTINGS_STORAGE_KEY};
