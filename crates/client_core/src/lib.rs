pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;

pub use classifier::{HttpClassifier, RemoteClassifier, UPLOAD_FIELD};
pub use config::{load_settings, ClientSettings};
pub use controller::{
    Notice, Presenter, ResultView, Settled, UiState, UploadController, UploadRequest, UploadTicket,
    CONNECTIVITY_NOTICE, NO_DETECTION_NOTICE,
};
pub use error::{ClassifyError, MediaError};
pub use media::SelectedImage;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
