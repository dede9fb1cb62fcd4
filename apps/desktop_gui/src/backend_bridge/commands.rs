//! Backend commands queued from UI to backend worker.

use std::sync::Arc;

use client_core::{SelectedImage, UploadTicket};

pub enum BackendCommand {
    Classify {
        ticket: UploadTicket,
        image: Arc<SelectedImage>,
    },
    /// Decode the selection for display off the UI thread.
    DecodePreview {
        ticket: UploadTicket,
        image: Arc<SelectedImage>,
    },
    /// Abort whatever upload is in flight; its outcome is no longer wanted.
    CancelPending,
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Classify { .. } => "classify",
            BackendCommand::DecodePreview { .. } => "decode_preview",
            BackendCommand::CancelPending => "cancel_pending",
            BackendCommand::CheckHealth => "check_health",
        }
    }
}
