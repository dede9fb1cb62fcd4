//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, HttpClassifier, RemoteClassifier};
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::preview::decode_preview_image;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let classifier = match HttpClassifier::new(&settings) {
            Ok(classifier) => Arc::new(classifier),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    err.to_string(),
                )));
                tracing::error!("failed to build classifier client: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Ready - uploads go to {}",
                classifier.endpoint()
            )));

            let mut in_flight: Option<JoinHandle<()>> = None;
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Classify { ticket, image } => {
                        if let Some(task) = in_flight.take() {
                            task.abort();
                        }
                        let classifier = Arc::clone(&classifier);
                        let ui_tx = ui_tx.clone();
                        in_flight = Some(tokio::spawn(async move {
                            let outcome = classifier.classify(&image).await;
                            if ui_tx
                                .send(UiEvent::ClassificationSettled { ticket, outcome })
                                .is_err()
                            {
                                tracing::warn!(
                                    ticket = ticket.id(),
                                    "ui closed before classification settled"
                                );
                            }
                        }));
                    }
                    BackendCommand::DecodePreview { ticket, image } => {
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let outcome = tokio::task::spawn_blocking(move || {
                                decode_preview_image(image.bytes())
                            })
                            .await
                            .unwrap_or_else(|err| Err(format!("preview decoder stopped: {err}")));
                            let _ = ui_tx.try_send(UiEvent::PreviewDecoded { ticket, outcome });
                        });
                    }
                    BackendCommand::CancelPending => {
                        if let Some(task) = in_flight.take() {
                            tracing::debug!("aborting in-flight classification");
                            task.abort();
                        }
                    }
                    BackendCommand::CheckHealth => {
                        let classifier = Arc::clone(&classifier);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let event = match classifier.health().await {
                                Ok(health) => UiEvent::ServiceReachable(health.message),
                                Err(err) => UiEvent::Error(UiError::from_message(
                                    UiErrorContext::HealthCheck,
                                    format!("{} unreachable: {err}", classifier.base_url()),
                                )),
                            };
                            let _ = ui_tx.try_send(event);
                        });
                    }
                }
            }
            tracing::debug!("ui command queue closed; backend worker exiting");
        });
    });
}
