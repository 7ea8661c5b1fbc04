// Main entry point - Configuration, dependency wiring and the comparison run
mod domain;
mod application;
mod infrastructure;
mod presentation;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::comparison_service::{ComparisonPlan, ComparisonService, ReferenceSource};
use crate::application::threshold_service::threshold_range;
use crate::infrastructure::config::{load_settings, to_toml};
use crate::infrastructure::file_output::FileOutput;
use crate::infrastructure::file_repository::FileSeriesRepository;
use crate::infrastructure::plot_renderer::PlotRenderer;
use crate::presentation::cli::Cli;

const OBSERVED_LABEL: &str = "Sym-H (Kyoto)";

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so --print-config output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);

    if cli.print_config {
        print!("{}", to_toml(&settings)?);
        return Ok(());
    }

    let sim_log = cli
        .sim_log
        .clone()
        .context("a simulation log path is required")?;

    let thresholds = threshold_range(
        settings.analysis.thresholds.start,
        settings.analysis.thresholds.stop,
        settings.analysis.thresholds.step,
    )?;

    // Create repository and regression strategy
    let repository = FileSeriesRepository::new(settings.analysis.start_time);
    let strategy = settings.analysis.regression.strategy();

    let plan = ComparisonPlan {
        reference: ReferenceSource {
            path: settings.reference.path.clone(),
            time_key: settings.reference.time_key.clone(),
            value_key: settings.reference.value_key.clone(),
        },
        first: settings.variants.first.clone(),
        second: settings.variants.second.clone(),
        selection: settings.variants.selection,
        alignment: settings.analysis.alignment,
        thresholds,
    };
    let service = ComparisonService::new(Box::new(repository), strategy, plan);

    let renderer = settings
        .output
        .render_plots
        .then(|| PlotRenderer::new(settings.plot.clone()));
    let mut output = FileOutput::new(settings.output.clone(), renderer, OBSERVED_LABEL.to_string());

    tracing::info!("Verifying {} against {}", sim_log.display(), settings.reference.path.display());
    let report = service.run(&sim_log, &mut output)?;
    tracing::info!(
        "Compared {} variant(s) over {} points",
        report.variants.len(),
        report.n_points()
    );

    Ok(())
}
