//! Visibility state of the classifier window, driven by the upload controller.

use std::collections::VecDeque;

use client_core::{Notice, Presenter, ResultView, SelectedImage, UploadTicket};
use egui::TextureHandle;

use crate::ui::preview::PreviewImage;

pub enum PreviewState {
    /// Waiting on the backend worker to decode the selection.
    Decoding,
    Decoded {
        image: PreviewImage,
        texture: Option<TextureHandle>,
    },
    /// Preview is best effort; the upload proceeds regardless.
    Unavailable(String),
}

pub struct ScreenState {
    pub selected_file: Option<String>,
    pub drop_zone_visible: bool,
    pub preview: Option<PreviewState>,
    preview_ticket: Option<UploadTicket>,
    pub loader_visible: bool,
    pub result: Option<ResultView>,
    pub notices: VecDeque<String>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            selected_file: None,
            drop_zone_visible: true,
            preview: None,
            preview_ticket: None,
            loader_visible: false,
            result: None,
            notices: VecDeque::new(),
        }
    }
}

impl ScreenState {
    pub fn notice_pending(&self) -> bool {
        !self.notices.is_empty()
    }

    pub fn acknowledge_notice(&mut self) {
        self.notices.pop_front();
    }

    /// Marks the preview shown for `ticket` as pending a backend decode.
    pub fn await_preview(&mut self, ticket: UploadTicket) {
        self.preview_ticket = Some(ticket);
    }

    /// Installs a decoded preview. Returns `false` when the selection it was
    /// decoded for is no longer on screen.
    pub fn apply_preview(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<PreviewImage, String>,
    ) -> bool {
        if self.preview_ticket != Some(ticket) {
            tracing::debug!(ticket = ticket.id(), "dropping preview for replaced selection");
            return false;
        }
        self.preview = Some(match outcome {
            Ok(image) => PreviewState::Decoded {
                image,
                texture: None,
            },
            Err(reason) => {
                tracing::debug!(ticket = ticket.id(), "preview unavailable: {reason}");
                PreviewState::Unavailable(reason)
            }
        });
        true
    }
}

impl Presenter for ScreenState {
    fn show_preview(&mut self, image: &SelectedImage) {
        self.selected_file = Some(image.name().to_string());
        self.drop_zone_visible = false;
        self.preview = Some(PreviewState::Decoding);
        self.preview_ticket = None;
    }

    fn show_loader(&mut self) {
        self.loader_visible = true;
    }

    fn hide_loader(&mut self) {
        self.loader_visible = false;
    }

    fn show_result(&mut self, view: &ResultView) {
        self.result = Some(view.clone());
    }

    fn hide_result(&mut self) {
        self.result = None;
    }

    fn show_notice(&mut self, notice: &Notice) -> anyhow::Result<()> {
        self.notices.push_back(notice.text().to_string());
        Ok(())
    }

    fn reset_view(&mut self) {
        self.selected_file = None;
        self.drop_zone_visible = true;
        self.preview = None;
        self.preview_ticket = None;
        self.result = None;
        self.loader_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{UiState, UploadController, CONNECTIVITY_NOTICE};
    use shared::protocol::ClassificationResponse;

    use crate::ui::preview::decode_preview_image;

    fn tiny_preview() -> PreviewImage {
        PreviewImage {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
            source_width: 1,
            source_height: 1,
        }
    }

    fn assert_idle(screen: &ScreenState) {
        assert!(screen.selected_file.is_none());
        assert!(screen.drop_zone_visible);
        assert!(screen.preview.is_none());
        assert!(!screen.loader_visible);
        assert!(screen.result.is_none());
    }

    #[test]
    fn undecodable_preview_still_enters_previewing() {
        let mut screen = ScreenState::default();
        let mut controller = UploadController::new();
        let bytes = b"not really a png".to_vec();

        let request = controller
            .submit_image(&mut screen, SelectedImage::new("broken.png", None, bytes.clone()))
            .expect("accepted");
        assert!(matches!(screen.preview, Some(PreviewState::Decoding)));

        screen.await_preview(request.ticket);
        assert!(screen.apply_preview(request.ticket, decode_preview_image(&bytes)));

        assert_eq!(controller.state(), &UiState::Previewing);
        assert!(matches!(screen.preview, Some(PreviewState::Unavailable(_))));
        assert!(screen.loader_visible);
        assert!(!screen.drop_zone_visible);
    }

    #[test]
    fn preview_for_replaced_selection_is_dropped() {
        let mut screen = ScreenState::default();
        let mut controller = UploadController::new();
        let first = controller
            .submit_image(&mut screen, SelectedImage::new("a.png", None, vec![1]))
            .expect("accepted");
        screen.await_preview(first.ticket);
        let second = controller
            .submit_image(&mut screen, SelectedImage::new("b.png", None, vec![2]))
            .expect("accepted");
        screen.await_preview(second.ticket);

        assert!(!screen.apply_preview(first.ticket, Ok(tiny_preview())));
        assert!(matches!(screen.preview, Some(PreviewState::Decoding)));
        assert!(screen.apply_preview(second.ticket, Ok(tiny_preview())));
        assert!(matches!(screen.preview, Some(PreviewState::Decoded { .. })));

        controller.reset(&mut screen);
        assert!(!screen.apply_preview(second.ticket, Ok(tiny_preview())));
        assert!(screen.preview.is_none());
    }

    #[test]
    fn preview_arriving_after_result_is_still_shown() {
        let mut screen = ScreenState::default();
        let mut controller = UploadController::new();
        let request = controller
            .submit_image(&mut screen, SelectedImage::new("jay.png", None, vec![1]))
            .expect("accepted");
        screen.await_preview(request.ticket);
        controller.on_classification_settled(
            &mut screen,
            request.ticket,
            Ok(ClassificationResponse::detection("Blue Jay", 0.92, Default::default())),
        );

        assert!(screen.apply_preview(request.ticket, Ok(tiny_preview())));
        assert!(screen.result.is_some());
    }

    #[test]
    fn failure_queues_blocking_notice_and_resets() {
        let mut screen = ScreenState::default();
        let mut controller = UploadController::new();
        let request = controller
            .submit_image(&mut screen, SelectedImage::new("jay.png", None, vec![1]))
            .expect("accepted");

        controller.on_classification_settled(
            &mut screen,
            request.ticket,
            Err(client_core::ClassifyError::MalformedBody("x".into())),
        );

        assert_idle(&screen);
        assert!(screen.notice_pending());
        assert_eq!(screen.notices.front().map(String::as_str), Some(CONNECTIVITY_NOTICE));
        screen.acknowledge_notice();
        assert!(!screen.notice_pending());
    }

    #[test]
    fn reset_after_result_matches_fresh_screen() {
        let mut screen = ScreenState::default();
        let mut controller = UploadController::new();
        let request = controller
            .submit_image(&mut screen, SelectedImage::new("jay.png", None, vec![1]))
            .expect("accepted");
        controller.on_classification_settled(
            &mut screen,
            request.ticket,
            Ok(ClassificationResponse::detection(
                "Blue Jay",
                0.92,
                Default::default(),
            )),
        );
        assert!(screen.result.is_some());

        controller.reset(&mut screen);
        assert_idle(&screen);
        controller.reset(&mut screen);
        assert_idle(&screen);
    }
}
