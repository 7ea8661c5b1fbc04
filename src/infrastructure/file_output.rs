// File-backed sink for comparison artifacts
use crate::application::comparison_service::{ComparisonOutput, ComparisonReport};
use crate::domain::sweep::ThresholdSweepTable;
use crate::infrastructure::config::OutputSettings;
use crate::infrastructure::headed_ascii::write_threshold_table;
use crate::infrastructure::metrics_log::MetricsLog;
use crate::infrastructure::plot_renderer::PlotRenderer;
use anyhow::Context;

pub struct FileOutput {
    settings: OutputSettings,
    renderer: Option<PlotRenderer>,
    observed_label: String,
}

impl FileOutput {
    pub fn new(settings: OutputSettings, renderer: Option<PlotRenderer>, observed_label: String) -> Self {
        Self {
            settings,
            renderer,
            observed_label,
        }
    }

    fn prepare_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.settings.dir)
            .with_context(|| format!("cannot create output directory {}", self.settings.dir.display()))
    }

    fn model_label(report: &ComparisonReport, label: &str) -> String {
        if report.variants.len() > 1 {
            format!("Sym-H (RAM/{})", label)
        } else {
            "Sym-H (RAM)".to_string()
        }
    }
}

impl ComparisonOutput for FileOutput {
    fn render_plots(&mut self, report: &ComparisonReport) -> anyhow::Result<()> {
        let Some(renderer) = &self.renderer else {
            tracing::info!("Plot rendering disabled");
            return Ok(());
        };
        self.prepare_dir()?;

        let models: Vec<(String, &_)> = report
            .variants
            .iter()
            .map(|v| (Self::model_label(report, &v.variant.label), &v.model))
            .collect();
        renderer.render_timeseries(
            &self.settings.timeseries_plot_path(),
            (self.observed_label.as_str(), &report.reference),
            &models,
        )?;

        if let Some(primary) = report.primary() {
            let fit = primary
                .metrics
                .fit()
                .context("metrics carry no regression fit")?;
            renderer.render_scatter(
                &self.settings.scatter_plot_path(),
                &primary.aligned.obs.values(),
                &primary.aligned.model.values(),
                &fit,
                report.fit_name,
            )?;
        }
        Ok(())
    }

    fn write_metrics(&mut self, report: &ComparisonReport) -> anyhow::Result<()> {
        self.prepare_dir()?;
        let path = self.settings.metrics_log_path();
        let write = || -> std::io::Result<()> {
            let mut log = MetricsLog::create(&path)?;
            log.header(report.n_points())?;
            for variant in &report.variants {
                log.variant(&variant.variant.label, &variant.metrics)?;
            }
            if let (Some(percent), [first, second]) = (report.percent_better, report.variants.as_slice()) {
                log.percent_better(&first.variant.label, &second.variant.label, percent)?;
            }
            log.source(&report.source)?;
            log.finish()?;
            Ok(())
        };
        write().with_context(|| format!("failed to write metrics log {}", path.display()))?;
        tracing::info!("Wrote metrics log to {}", path.display());
        Ok(())
    }

    fn write_threshold_table(&mut self, sweep: &ThresholdSweepTable) -> anyhow::Result<()> {
        self.prepare_dir()?;
        write_threshold_table(&self.settings.threshold_table_path(), sweep)?;
        Ok(())
    }
}
