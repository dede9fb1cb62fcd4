use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ClientSettings, HttpClassifier, Notice, Presenter, ResultView, SelectedImage,
    Settled, UploadController,
};
use shared::domain::SpeciesInfo;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Identify bird species by uploading photos to a classification service")]
struct Cli {
    /// Classifier upload endpoint; overrides classifier.toml and the environment.
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image and print the detected species.
    Classify {
        path: PathBuf,
        /// Print the result as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Look up descriptive information for a species by name.
    Species { name: String },
    /// Check that the classification service is reachable.
    Ping,
}

impl Cli {
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

/// Renders the upload lifecycle as terminal output.
struct TerminalPresenter<O: Write, E: Write> {
    out: O,
    err: E,
    json: bool,
}

impl<O: Write, E: Write> Presenter for TerminalPresenter<O, E> {
    fn show_preview(&mut self, image: &SelectedImage) {
        let _ = writeln!(
            self.err,
            "Selected {} ({}, {})",
            image.name(),
            image.media_type(),
            human_readable_bytes(image.len() as u64)
        );
    }

    fn show_loader(&mut self) {
        let _ = writeln!(self.err, "Analyzing...");
    }

    fn hide_loader(&mut self) {
        let _ = self.err.flush();
    }

    fn show_result(&mut self, view: &ResultView) {
        if self.json {
            match serde_json::to_string_pretty(view) {
                Ok(text) => {
                    let _ = writeln!(self.out, "{text}");
                }
                Err(err) => tracing::error!("failed to encode result: {err}"),
            }
            return;
        }
        let _ = write!(self.out, "{}", format_result(view));
    }

    fn hide_result(&mut self) {}

    fn show_notice(&mut self, notice: &Notice) -> Result<()> {
        writeln!(self.err, "{}", notice.text()).context("failed to write notice")
    }

    fn reset_view(&mut self) {}
}

fn format_result(view: &ResultView) -> String {
    let mut text = format!(
        "Species:          {}\nConfidence:       {}\nScientific name:  {}\nLifespan:         {}\nHabitat:          {}\n",
        view.species,
        view.confidence_label(),
        view.scientific_name,
        view.lifespan,
        view.habitat,
    );
    if let Some(bbox) = view.bounding_box {
        text.push_str(&format!(
            "Bounding box:     x={:.0} y={:.0} w={:.0} h={:.0}\n",
            bbox.x_min, bbox.y_min, bbox.width, bbox.height
        ));
    }
    text.push_str(&format!("\n{}\n", view.description));
    text
}

fn format_species_info(name: &str, info: &SpeciesInfo) -> String {
    format!(
        "Species:          {}\nScientific name:  {}\nLifespan:         {}\nHabitat:          {}\n\n{}\n",
        info.name.as_deref().unwrap_or(name),
        info.scientific_name_or_placeholder(),
        info.lifespan_or_placeholder(),
        info.habitat_or_placeholder(),
        info.description_or_placeholder(),
    )
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = cli.settings();
    let classifier = HttpClassifier::new(&settings)
        .with_context(|| format!("cannot use classifier endpoint '{}'", settings.endpoint))?;
    tracing::debug!(endpoint = %classifier.endpoint(), "classifier configured");

    match cli.command {
        Command::Classify { path, json } => {
            let image = SelectedImage::from_path(&path)
                .await?
                .require_image()?;
            let mut presenter = TerminalPresenter {
                out: io::stdout().lock(),
                err: io::stderr().lock(),
                json,
            };
            let mut controller = UploadController::new();
            let settled = controller
                .classify_with(&mut presenter, &classifier, image)
                .await;
            Ok(match settled {
                Some(Settled::Displayed(_)) => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        Command::Species { name } => {
            let info = classifier
                .species_info(&name)
                .await
                .with_context(|| format!("species lookup for '{name}' failed"))?;
            print!("{}", format_species_info(&name, &info));
            Ok(ExitCode::SUCCESS)
        }
        Command::Ping => {
            let health = classifier
                .health()
                .await
                .with_context(|| format!("{} is unreachable", classifier.base_url()))?;
            println!("{}", health.message);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    run(Cli::parse()).await
}
