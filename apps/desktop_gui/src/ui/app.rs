use std::{fs, path::PathBuf, time::Duration};

use client_core::{Notice, Presenter, ResultView, SelectedImage, UploadController};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::preview::{bbox_screen_rect, fit_preview_size};
use crate::ui::screen::{PreviewState, ScreenState};

pub const SETTINGS_STORAGE_KEY: &str = "desktop_gui.settings";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    #[serde(default)]
    pub last_directory: Option<PathBuf>,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    controller: UploadController,
    screen: ScreenState,
    endpoint: String,
    status: String,
    status_banner: Option<UiError>,
    settings: PersistedDesktopSettings,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        endpoint: String,
        persisted_settings: Option<PersistedDesktopSettings>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            controller: UploadController::new(),
            screen: ScreenState::default(),
            endpoint,
            status: "Starting...".to_string(),
            status_banner: None,
            settings: persisted_settings.unwrap_or_default(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::ServiceReachable(message) => {
                    self.status = format!("Service reachable: {message}");
                    self.status_banner = None;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = err.message().to_string();
                    self.status_banner = Some(err);
                }
                UiEvent::ClassificationSettled { ticket, outcome } => {
                    self.controller
                        .on_classification_settled(&mut self.screen, ticket, outcome);
                }
                UiEvent::PreviewDecoded { ticket, outcome } => {
                    self.screen.apply_preview(ticket, outcome);
                }
            }
        }
    }

    fn submit(&mut self, image: SelectedImage) {
        let Some(request) = self.controller.submit_image(&mut self.screen, image) else {
            return;
        };
        self.status = format!("Analyzing {}...", request.image.name());
        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Classify {
                ticket: request.ticket,
                image: request.image.clone(),
            },
            &mut self.status,
        );
        if !queued {
            if let Err(err) = self.screen.show_notice(&Notice::Connectivity) {
                tracing::warn!("failed to present connectivity notice: {err:#}");
            }
            self.controller.reset(&mut self.screen);
            return;
        }

        self.screen.await_preview(request.ticket);
        let preview_queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::DecodePreview {
                ticket: request.ticket,
                image: request.image,
            },
            &mut self.status,
        );
        if !preview_queued {
            self.screen
                .apply_preview(request.ticket, Err("preview decoder unavailable".to_string()));
        }
    }

    fn reset(&mut self) {
        if self.controller.active_ticket().is_some() {
            dispatch_backend_command(&self.cmd_tx, BackendCommand::CancelPending, &mut self.status);
        }
        self.controller.reset(&mut self.screen);
    }

    fn pick_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
        if let Some(dir) = &self.settings.last_directory {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.settings.last_directory = path.parent().map(PathBuf::from);
        match read_selected_image(&path, None) {
            Ok(image) => self.submit(image),
            Err(err) => self.report_file_error(err),
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.first() else {
            return;
        };
        if self.screen.notice_pending() {
            return;
        }
        match selected_image_from_drop(file) {
            Ok(Some(image)) => self.submit(image),
            Ok(None) => {}
            Err(err) => self.report_file_error(err),
        }
    }

    fn report_file_error(&mut self, message: String) {
        tracing::warn!("failed to read selected file: {message}");
        let err = UiError::from_message(UiErrorContext::FileSelection, message);
        self.status = err.message().to_string();
        self.status_banner = Some(err);
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("app_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Bird Species Identifier");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Check service").clicked() {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::CheckHealth,
                            &mut self.status,
                        );
                    }
                    ui.label(egui::RichText::new(&self.endpoint).weak().small());
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(egui::RichText::new(&self.status).weak());
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let text = format!("{}: {}", err_label(banner.category()), banner.message());
        let mut dismissed = false;
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            dismissed = true;
                        }
                    });
                });
            });
        if dismissed {
            self.status_banner = None;
        }
        ui.add_space(8.0);
    }

    fn show_drop_zone(&mut self, ui: &mut egui::Ui) {
        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let stroke_color = if hovering {
            ui.visuals().selection.stroke.color
        } else {
            ui.visuals().widgets.inactive.bg_stroke.color
        };
        let fill = if hovering {
            ui.visuals().selection.bg_fill.linear_multiply(0.25)
        } else {
            ui.visuals().faint_bg_color
        };

        let desired = egui::vec2(ui.available_width(), ui.available_height().clamp(180.0, 320.0));
        let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click());
        ui.painter()
            .rect_filled(rect, egui::CornerRadius::same(12), fill);
        ui.painter().rect_stroke(
            rect,
            egui::CornerRadius::same(12),
            egui::Stroke::new(2.0, stroke_color),
            egui::StrokeKind::Inside,
        );
        ui.painter().text(
            rect.center() - egui::vec2(0.0, 12.0),
            egui::Align2::CENTER_CENTER,
            "Drag & drop a bird photo here",
            egui::FontId::proportional(20.0),
            ui.visuals().strong_text_color(),
        );
        ui.painter().text(
            rect.center() + egui::vec2(0.0, 16.0),
            egui::Align2::CENTER_CENTER,
            "or click to browse",
            egui::FontId::proportional(14.0),
            ui.visuals().weak_text_color(),
        );

        if response.on_hover_cursor(egui::CursorIcon::PointingHand).clicked() {
            self.pick_file();
        }
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        let bounding_box = self.screen.result.as_ref().and_then(|view| view.bounding_box);
        let file_label = self.screen.selected_file.clone().unwrap_or_default();
        let Some(preview) = self.screen.preview.as_mut() else {
            return;
        };

        match preview {
            PreviewState::Decoded { image, texture } => {
                let texture = texture.get_or_insert_with(|| {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    ui.ctx().load_texture(
                        format!("upload_preview:{file_label}"),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    )
                });
                let max = egui::vec2(ui.available_width(), 360.0);
                let size = fit_preview_size(texture.size_vec2(), max);
                let response = ui.add(egui::Image::new(&*texture).fit_to_exact_size(size));
                if let Some(bbox) = bounding_box {
                    let rect = bbox_screen_rect(&bbox, image, response.rect);
                    ui.painter().rect_stroke(
                        rect,
                        egui::CornerRadius::same(2),
                        egui::Stroke::new(2.0, egui::Color32::from_rgb(255, 196, 0)),
                        egui::StrokeKind::Outside,
                    );
                }
            }
            PreviewState::Decoding => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Loading preview...").weak());
                });
            }
            PreviewState::Unavailable(_) => {
                ui.label(egui::RichText::new("Preview unavailable").italics().weak());
            }
        }
        ui.small(file_label);
    }

    fn show_result(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.screen.result.clone() else {
            return;
        };
        ui.add_space(12.0);
        result_panel(ui, &view);
        ui.add_space(12.0);
        if ui.button("Identify another bird").clicked() {
            self.reset();
        }
    }

    fn show_notice_window(&mut self, ctx: &egui::Context) {
        let Some(text) = self.screen.notices.front().cloned() else {
            return;
        };
        let mut acknowledged = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(text);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        acknowledged = true;
                    }
                });
            });
        if acknowledged {
            self.screen.acknowledge_notice();
        }
    }
}

fn result_panel(ui: &mut egui::Ui, view: &ResultView) {
    ui.horizontal(|ui| {
        ui.heading(&view.species);
        ui.label(egui::RichText::new(view.confidence_label()).strong());
    });
    egui::Grid::new("species_info_grid")
        .num_columns(2)
        .spacing([16.0, 6.0])
        .show(ui, |ui| {
            for (label, value) in [
                ("Scientific name", &view.scientific_name),
                ("Lifespan", &view.lifespan),
                ("Habitat", &view.habitat),
            ] {
                ui.label(egui::RichText::new(label).strong());
                ui.label(value);
                ui.end_row();
            }
        });
    ui.add_space(6.0);
    ui.label(&view.description);
}

/// First dropped file as a selection. Files the platform delivered without
/// bytes are read from their path.
pub fn selected_image_from_drop(file: &egui::DroppedFile) -> Result<Option<SelectedImage>, String> {
    let declared = Some(file.mime.as_str());
    if let Some(bytes) = &file.bytes {
        let name = if file.name.is_empty() {
            "dropped-image".to_string()
        } else {
            file.name.clone()
        };
        return Ok(Some(SelectedImage::new(name, declared, bytes.to_vec())));
    }
    match &file.path {
        Some(path) => read_selected_image(path, declared).map(Some),
        None => Ok(None),
    }
}

fn read_selected_image(path: &std::path::Path, declared: Option<&str>) -> Result<SelectedImage, String> {
    let bytes = fs::read(path).map_err(|err| format!("could not read {}: {err}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(SelectedImage::new(name, declared, bytes))
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);

        self.show_top_bar(ctx);
        let notice_pending = self.screen.notice_pending();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!notice_pending, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_status_banner(ui);
                    if self.screen.drop_zone_visible {
                        self.show_drop_zone(ui);
                    }
                    self.show_preview(ui);
                    if self.screen.loader_visible {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Analyzing image...");
                        });
                    }
                    self.show_result(ui);
                });
            });
        });
        self.show_notice_window(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use client_core::{UiState, UploadTicket};
    use crossbeam_channel::bounded;
    use shared::protocol::ClassificationResponse;

    fn app() -> (DesktopGuiApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let app = DesktopGuiApp::new(cmd_tx, ui_rx, "http://localhost:8000/predict/".into(), None);
        (app, cmd_rx, ui_tx)
    }

    fn dropped(name: &str, mime: &str, bytes: Option<&[u8]>) -> egui::DroppedFile {
        egui::DroppedFile {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.map(Arc::from),
            ..Default::default()
        }
    }

    #[test]
    fn dropped_bytes_keep_declared_type() {
        let image = selected_image_from_drop(&dropped("x.bin", "image/png", Some(&[1, 2])))
            .expect("read")
            .expect("selection");
        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.bytes(), &[1, 2]);
    }

    #[test]
    fn dropped_path_is_read_and_type_guessed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("owl.jpeg");
        fs::write(&path, [0xff, 0xd8, 0xff]).expect("write");
        let file = egui::DroppedFile {
            path: Some(path),
            ..Default::default()
        };

        let image = selected_image_from_drop(&file).expect("read").expect("selection");
        assert_eq!(image.name(), "owl.jpeg");
        assert_eq!(image.media_type(), "image/jpeg");
    }

    #[test]
    fn dropped_file_without_content_is_skipped() {
        assert!(selected_image_from_drop(&egui::DroppedFile::default())
            .expect("no error")
            .is_none());
    }

    #[test]
    fn submitting_image_queues_classify_and_preview_decode() {
        let (mut app, cmd_rx, _ui_tx) = app();
        app.submit(SelectedImage::new("jay.png", None, vec![1, 2, 3]));

        let classify_ticket = match cmd_rx.try_recv().expect("queued") {
            BackendCommand::Classify { ticket, image } => {
                assert_eq!(image.name(), "jay.png");
                ticket
            }
            other => panic!("unexpected command {}", other.name()),
        };
        match cmd_rx.try_recv().expect("queued") {
            BackendCommand::DecodePreview { ticket, .. } => assert_eq!(ticket, classify_ticket),
            other => panic!("unexpected command {}", other.name()),
        }
        assert_eq!(app.controller.state(), &UiState::Previewing);
        assert!(matches!(app.screen.preview, Some(PreviewState::Decoding)));
    }

    #[test]
    fn decoded_preview_event_replaces_placeholder() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.submit(SelectedImage::new("jay.png", None, vec![1]));
        let ticket = match cmd_rx.try_recv().expect("queued") {
            BackendCommand::Classify { ticket, .. } => ticket,
            other => panic!("unexpected command {}", other.name()),
        };

        ui_tx
            .send(UiEvent::PreviewDecoded {
                ticket,
                outcome: Err("unsupported format".to_string()),
            })
            .expect("send");
        app.process_ui_events();

        assert!(matches!(app.screen.preview, Some(PreviewState::Unavailable(_))));
        assert!(app.screen.loader_visible);
    }

    #[test]
    fn non_image_drop_queues_nothing() {
        let (mut app, cmd_rx, _ui_tx) = app();
        app.submit(SelectedImage::new("notes.txt", None, b"hi".to_vec()));
        assert!(cmd_rx.try_recv().is_err());
        assert!(app.screen.drop_zone_visible);
        assert_eq!(app.controller.state(), &UiState::Idle);
    }

    #[test]
    fn settled_event_renders_result() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.submit(SelectedImage::new("jay.png", None, vec![1]));
        let ticket: UploadTicket = match cmd_rx.try_recv().expect("queued") {
            BackendCommand::Classify { ticket, .. } => ticket,
            other => panic!("unexpected command {}", other.name()),
        };

        ui_tx
            .send(UiEvent::ClassificationSettled {
                ticket,
                outcome: Ok(ClassificationResponse::detection(
                    "Blue Jay",
                    0.92,
                    Default::default(),
                )),
            })
            .expect("send");
        app.process_ui_events();

        assert!(matches!(app.controller.state(), UiState::Result(_)));
        assert_eq!(
            app.screen.result.as_ref().map(|view| view.confidence_label()),
            Some("92%".to_string())
        );
        assert!(!app.screen.loader_visible);
    }

    #[test]
    fn reset_while_pending_cancels_backend_request() {
        let (mut app, cmd_rx, _ui_tx) = app();
        app.submit(SelectedImage::new("jay.png", None, vec![1]));
        let queued: Vec<_> = cmd_rx.try_iter().collect();
        assert_eq!(queued.len(), 2);

        app.reset();

        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::CancelPending)));
        assert!(app.screen.drop_zone_visible);
        assert_eq!(app.controller.state(), &UiState::Idle);
    }

    #[test]
    fn disconnected_backend_surfaces_connectivity_notice() {
        let (mut app, cmd_rx, _ui_tx) = app();
        drop(cmd_rx);
        app.submit(SelectedImage::new("jay.png", None, vec![1]));

        assert_eq!(app.controller.state(), &UiState::Idle);
        assert_eq!(
            app.screen.notices.front().map(String::as_str),
            Some(client_core::CONNECTIVITY_NOTICE)
        );
    }

    #[test]
    fn persisted_settings_round_trip_through_storage_format() {
        let settings = PersistedDesktopSettings {
            last_directory: Some(PathBuf::from("/tmp/birds")),
        };
        let text = serde_json::to_string(&settings).expect("encode");
        let decoded: PersistedDesktopSettings = serde_json::from_str(&text).expect("decode");
        assert_eq!(decoded, settings);
        let empty: PersistedDesktopSettings = serde_json::from_str("{}").expect("decode");
        assert_eq!(empty.last_directory, None);
    }
}
