//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ClassifyError, UploadTicket};
use shared::protocol::ClassificationResponse;

use crate::ui::preview::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    ClassificationSettled {
        ticket: UploadTicket,
        outcome: Result<ClassificationResponse, ClassifyError>,
    },
    PreviewDecoded {
        ticket: UploadTicket,
        outcome: Result<PreviewImage, String>,
    },
    ServiceReachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    HealthCheck,
    FileSelection,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("malformed")
            || message_lower.contains("unsupported")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("connect")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Validation => "Configuration",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_refused_connection_as_transport() {
        let err = UiError::from_message(
            UiErrorContext::HealthCheck,
            "classifier request failed: error sending request: connection refused",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::HealthCheck);
        assert_eq!(err_label(err.category()), "Connection");
    }

    #[test]
    fn classifies_bad_endpoint_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "invalid classifier endpoint 'ftp://x': unsupported scheme 'ftp'",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn falls_back_to_unknown() {
        let err = UiError::from_message(UiErrorContext::General, "something odd");
        assert_eq!(err.category(), UiErrorCategory::Unknown);
        assert_eq!(err.message(), "something odd");
    }
}
