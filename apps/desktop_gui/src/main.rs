mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{DesktopGuiApp, PersistedDesktopSettings, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
#[command(about = "Desktop bird species identifier")]
struct Args {
    /// Classifier upload endpoint; overrides classifier.toml and the environment.
    #[arg(long)]
    endpoint: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn settings(&self) -> ClientSettings {
        let mut settings = load_settings();
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.set_request_timeout_secs(timeout_secs, "--timeout-secs");
        }
        settings
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let settings = args.settings();
    let endpoint = settings.endpoint.clone();
    tracing::info!(endpoint = %endpoint, "starting desktop gui");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Bird Species Identifier")
            .with_inner_size([900.0, 760.0])
            .with_min_inner_size([520.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Bird Species Identifier",
        options,
        Box::new(|cc| {
            let persisted_settings = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            Ok(Box::new(DesktopGuiApp::new(
                cmd_tx,
                ui_rx,
                endpoint,
                persisted_settings,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_loaded_settings() {
        let args = Args::try_parse_from([
            "desktop_gui",
            "--endpoint",
            "http://10.0.0.5:9000/predict/",
            "--timeout-secs",
            "5",
        ])
        .expect("parse");
        let settings = args.settings();
        assert_eq!(settings.endpoint, "http://10.0.0.5:9000/predict/");
        assert_eq!(settings.request_timeout_secs, 5);
    }
}
