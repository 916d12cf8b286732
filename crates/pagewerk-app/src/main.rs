// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewerk — ordered images to a single PDF.
//
// Entry point. Initialises logging, loads saved settings, applies command
// line overrides, and runs one conversion into the output directory.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::human_errors::humanize_error;
use pagewerk_core::types::{Orientation, PageFormat, Quality};
use pagewerk_core::{AppConfig, ImageRegistry};
use pagewerk_document::PdfInspector;
use pagewerk_pipeline::{ConversionOrchestrator, ConversionReport, DirectoryDelivery, StartOutcome};

use services::{data_dir, settings};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

impl From<FormatArg> for PageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::A4 => PageFormat::A4,
            FormatArg::Letter => PageFormat::Letter,
            FormatArg::Legal => PageFormat::Legal,
            FormatArg::A3 => PageFormat::A3,
            FormatArg::A5 => PageFormat::A5,
        }
    }
}

/// Combine images into a single PDF, one image per page.
#[derive(Debug, Parser)]
#[command(name = "pagewerk", version)]
struct Cli {
    /// Images to convert, in page order
    #[arg(required_unless_present = "save_settings")]
    images: Vec<PathBuf>,

    /// Page orientation
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Page format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JPEG quality for compressed images (10-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(10..=100))]
    quality: Option<u8>,

    /// Embed images without re-encoding them
    #[arg(long)]
    no_compress: bool,

    /// Skip the structural optimisation pass
    #[arg(long)]
    no_optimize: bool,

    /// Output file name (".pdf" is appended if missing)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory the PDF is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the size estimate and exit
    #[arg(long)]
    estimate: bool,

    /// Re-open the written PDF and report its pages
    #[arg(long)]
    verify: bool,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "pagewerk failed");
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dir = data_dir::data_dir();
    let mut config = settings::load_settings(&dir);
    apply_overrides(&cli, &mut config)?;

    if cli.save_settings {
        let path = settings::persist_settings(&dir, &config)?;
        println!("Settings saved to {}", path.display());
    }
    if cli.images.is_empty() {
        return Ok(());
    }

    let mut registry = ImageRegistry::new();
    for path in &cli.images {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        registry.add_bytes(bytes, name);
    }

    let estimate = registry.estimate(&config.compression);
    println!(
        "{} image(s), {:.2} MB in, about {:.2} MB out ({}% smaller)",
        registry.len(),
        estimate.original_megabytes(),
        estimate.estimated_megabytes(),
        estimate.reduction_percent()
    );
    if cli.estimate {
        return Ok(());
    }

    let delivery = Arc::new(DirectoryDelivery::new(&cli.out_dir));
    let orchestrator = ConversionOrchestrator::new(&config, delivery.clone());

    match orchestrator
        .start(&registry, &config.conversion, &config.compression)
        .await?
    {
        StartOutcome::AlreadyRunning => {
            tracing::warn!("a conversion is already running");
        }
        StartOutcome::Delivered(report) => {
            print_report(&report);
            println!(
                "Wrote {} ({:.2} MB)",
                delivery.path_for(&report.result.name).display(),
                report.result.bytes.len() as f64 / (1024.0 * 1024.0)
            );
            if cli.verify {
                verify(&report)?;
            }
        }
    }
    Ok(())
}

/// Apply command line flags on top of the saved settings.
fn apply_overrides(cli: &Cli, config: &mut AppConfig) -> Result<()> {
    if let Some(orientation) = cli.orientation {
        config.conversion.set_orientation(orientation.into());
    }
    if let Some(format) = cli.format {
        config.conversion.set_page_format(format.into());
    }
    if let Some(name) = &cli.output {
        config.conversion.set_output_name(name.as_str());
    }
    if let Some(quality) = cli.quality {
        config.compression.set_quality(Quality::new(quality)?);
    }
    if cli.no_compress {
        config.compression.set_compress_enabled(false);
    }
    if cli.no_optimize {
        config.compression.set_optimize_enabled(false);
    }
    Ok(())
}

fn print_report(report: &ConversionReport) {
    for (index, page) in report.pages.iter().enumerate() {
        println!(
            "  page {:>3}: {} at {:.0}x{:.0} pt{}",
            index + 1,
            page.display_name,
            page.rect.width,
            page.rect.height,
            if page.scaled { " (scaled to fit)" } else { "" }
        );
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

/// Read the delivered bytes back and check every page carries an image.
fn verify(report: &ConversionReport) -> Result<()> {
    let inspector = PdfInspector::from_bytes(&report.result.bytes)?;
    let pages = inspector.page_count();
    if pages != report.pages.len() {
        return Err(PagewerkError::PdfError(format!(
            "expected {} pages, found {}",
            report.pages.len(),
            pages
        )));
    }

    for page in 1..=pages as u32 {
        let (width, height) = inspector.page_size(page)?;
        let images = inspector.image_placements(page)?;
        if images.is_empty() {
            return Err(PagewerkError::PdfError(format!("page {} has no image", page)));
        }
        println!("  verified page {:>3}: {:.2}x{:.2} pt, {} image(s)", page, width, height, images.len());
    }
    println!("Verified {} page(s)", pages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_saved_settings() {
        let cli = Cli::try_parse_from([
            "pagewerk",
            "a.png",
            "b.jpg",
            "--orientation",
            "landscape",
            "--format",
            "letter",
            "--quality",
            "40",
            "--no-optimize",
            "-o",
            "album",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(cli.images.len(), 2);
        assert_eq!(config.conversion.orientation(), Orientation::Landscape);
        assert_eq!(config.conversion.page_format(), PageFormat::Letter);
        assert_eq!(config.conversion.file_name().unwrap(), "album.pdf");
        assert_eq!(config.compression.quality().percent(), 40);
        assert!(config.compression.compress_enabled());
        assert!(!config.compression.optimize_enabled());
    }

    #[test]
    fn quality_outside_range_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["pagewerk", "a.png", "--quality", "5"]).is_err());
        assert!(Cli::try_parse_from(["pagewerk", "a.png", "--quality", "101"]).is_err());
    }

    #[test]
    fn images_required_unless_saving_settings() {
        assert!(Cli::try_parse_from(["pagewerk"]).is_err());
        let cli = Cli::try_parse_from(["pagewerk", "--save-settings", "--no-compress"]).unwrap();
        assert!(cli.images.is_empty());
    }
}
