//! Upload lifecycle: selection, preview, remote classification, result or
//! notice, reset.
//!
//! The controller owns the UI state machine and talks to the rendering
//! surface only through [`Presenter`], so every transition can be driven
//! without a window. The network call itself happens outside the
//! controller: [`UploadController::submit_image`] hands out an
//! [`UploadRequest`] and the caller reports back through
//! [`UploadController::on_classification_settled`].

use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{or_placeholder, BoundingBox},
    protocol::ClassificationResponse,
};
use tracing::{debug, info, warn};

use crate::{classifier::RemoteClassifier, error::ClassifyError, media::SelectedImage};

pub const NO_DETECTION_NOTICE: &str = "No bird detected.";
pub const CONNECTIVITY_NOTICE: &str =
    "Failed to connect to the classification service. Ensure it is running and reachable.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadTicket(u64);

impl UploadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// An accepted submission the caller must send to the classifier.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub ticket: UploadTicket,
    pub image: Arc<SelectedImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiState {
    /// Drop zone visible, nothing selected.
    Idle,
    /// Local preview shown, classification in flight.
    Previewing,
    Result(ResultView),
}

/// Rendered projection of a positive detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub species: String,
    pub confidence_percent: u32,
    pub scientific_name: String,
    pub lifespan: String,
    pub habitat: String,
    pub description: String,
    pub bounding_box: Option<BoundingBox>,
}

impl ResultView {
    /// Fails when a positive detection lacks its species or confidence.
    pub fn from_response(response: &ClassificationResponse) -> Result<Self, ClassifyError> {
        let species = response
            .species
            .as_deref()
            .filter(|species| !species.is_empty())
            .ok_or_else(|| ClassifyError::MalformedBody("detection without species".into()))?;
        let confidence = response
            .confidence
            .filter(|confidence| confidence.is_finite())
            .ok_or_else(|| ClassifyError::MalformedBody("detection without confidence".into()))?;
        let info = response.info.clone().unwrap_or_default();

        Ok(Self {
            species: species.to_string(),
            confidence_percent: confidence_percent(confidence),
            scientific_name: or_placeholder(info.scientific_name.as_deref()).to_string(),
            lifespan: or_placeholder(info.lifespan.as_deref()).to_string(),
            habitat: or_placeholder(info.habitat.as_deref()).to_string(),
            description: or_placeholder(info.description.as_deref()).to_string(),
            bounding_box: response.bounding_box,
        })
    }

    pub fn confidence_label(&self) -> String {
        format!("{}%", self.confidence_percent)
    }
}

/// `round(confidence * 100)`; negative and NaN inputs saturate to zero.
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence * 100.0).round() as u32
}

/// Blocking, user-acknowledged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoDetection(String),
    Connectivity,
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::NoDetection(message) => message,
            Self::Connectivity => CONNECTIVITY_NOTICE,
        }
    }
}

/// Rendering surface driven by [`UploadController`].
pub trait Presenter {
    fn show_preview(&mut self, image: &SelectedImage);
    fn show_loader(&mut self);
    fn hide_loader(&mut self);
    fn show_result(&mut self, view: &ResultView);
    fn hide_result(&mut self);
    /// Presents a notice and waits for acknowledgement where the surface can.
    fn show_notice(&mut self, notice: &Notice) -> anyhow::Result<()>;
    /// Clears the file input, shows the drop zone, hides preview, result and loader.
    fn reset_view(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Displayed(ResultView),
    NotDetected(Notice),
    Failed(Notice),
    /// A newer submission or a reset replaced this request; nothing rendered.
    Superseded,
}

#[derive(Debug)]
pub struct UploadController {
    state: UiState,
    selection: Option<Arc<SelectedImage>>,
    active: Option<UploadTicket>,
    next_ticket: u64,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadController {
    pub fn new() -> Self {
        Self {
            state: UiState::Idle,
            selection: None,
            active: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn active_ticket(&self) -> Option<UploadTicket> {
        self.active
    }

    pub fn selection(&self) -> Option<&SelectedImage> {
        self.selection.as_deref()
    }

    /// Accepts `image` if its media type is `image/*`, otherwise does nothing.
    ///
    /// An accepted image replaces any pending one; the older ticket's outcome
    /// will be reported as [`Settled::Superseded`].
    pub fn submit_image<P: Presenter>(
        &mut self,
        presenter: &mut P,
        image: SelectedImage,
    ) -> Option<UploadRequest> {
        if !image.is_image() {
            debug!(
                file = image.name(),
                media_type = image.media_type(),
                "ignoring non-image selection"
            );
            return None;
        }

        let ticket = UploadTicket(self.next_ticket);
        self.next_ticket += 1;
        if let Some(previous) = self.active.replace(ticket) {
            info!(
                previous = previous.id(),
                current = ticket.id(),
                "new selection supersedes pending classification"
            );
        }

        let image = Arc::new(image);
        self.selection = Some(Arc::clone(&image));
        self.state = UiState::Previewing;

        presenter.show_preview(&image);
        presenter.show_loader();
        presenter.hide_result();

        info!(
            ticket = ticket.id(),
            file = image.name(),
            size_bytes = image.len(),
            "image submitted"
        );
        Some(UploadRequest { ticket, image })
    }

    pub fn on_classification_settled<P: Presenter>(
        &mut self,
        presenter: &mut P,
        ticket: UploadTicket,
        outcome: Result<ClassificationResponse, ClassifyError>,
    ) -> Settled {
        if self.active != Some(ticket) {
            debug!(ticket = ticket.id(), "dropping outcome of superseded request");
            return Settled::Superseded;
        }
        self.active = None;

        let settled = self.apply_outcome(presenter, outcome);
        presenter.hide_loader();
        settled
    }

    fn apply_outcome<P: Presenter>(
        &mut self,
        presenter: &mut P,
        outcome: Result<ClassificationResponse, ClassifyError>,
    ) -> Settled {
        let outcome = outcome.and_then(|response| {
            if response.detected {
                ResultView::from_response(&response).map(Ok)
            } else {
                let message = response.notice().unwrap_or(NO_DETECTION_NOTICE);
                Ok(Err(Notice::NoDetection(message.to_string())))
            }
        });

        match outcome {
            Ok(Ok(view)) => {
                info!(
                    species = %view.species,
                    confidence = view.confidence_percent,
                    "classification displayed"
                );
                presenter.show_result(&view);
                self.state = UiState::Result(view.clone());
                Settled::Displayed(view)
            }
            Ok(Err(notice)) => {
                info!(notice = notice.text(), "classifier found no subject");
                self.notify_and_reset(presenter, &notice);
                Settled::NotDetected(notice)
            }
            Err(err) => {
                warn!("classification failed: {err}");
                let notice = Notice::Connectivity;
                self.notify_and_reset(presenter, &notice);
                Settled::Failed(notice)
            }
        }
    }

    fn notify_and_reset<P: Presenter>(&mut self, presenter: &mut P, notice: &Notice) {
        if let Err(err) = presenter.show_notice(notice) {
            warn!("failed to present notice '{}': {err:#}", notice.text());
        }
        self.reset(presenter);
    }

    /// Returns to `Idle` from any state; calling it repeatedly is harmless.
    pub fn reset<P: Presenter>(&mut self, presenter: &mut P) {
        if let Some(ticket) = self.active.take() {
            debug!(ticket = ticket.id(), "reset abandons pending classification");
        }
        self.selection = None;
        self.state = UiState::Idle;
        presenter.reset_view();
    }

    /// Submits `image`, awaits `classifier` and settles the outcome in one go.
    ///
    /// Returns `None` when the selection was ignored.
    pub async fn classify_with<P, C>(
        &mut self,
        presenter: &mut P,
        classifier: &C,
        image: SelectedImage,
    ) -> Option<Settled>
    where
        P: Presenter,
        C: RemoteClassifier + ?Sized,
    {
        let request = self.submit_image(presenter, image)?;
        let outcome = classifier.classify(&request.image).await;
        Some(self.on_classification_settled(presenter, request.ticket, outcome))
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
