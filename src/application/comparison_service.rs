// Comparison service - Use case for verifying a model run against observations
use crate::application::alignment::{AlignedPair, AlignmentPolicy, align};
use crate::application::metrics_service::{continuous_metrics, percent_better};
use crate::application::regression::RegressionStrategy;
use crate::application::series_repository::{SeriesRepository, require_column};
use crate::application::threshold_service::sweep_thresholds;
use crate::domain::metrics::MetricsResult;
use crate::domain::series::TimeSeries;
use crate::domain::sweep::ThresholdSweepTable;
use crate::domain::variant::{ModelVariant, VariantSelection};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Where the reference series lives and which columns to read.
#[derive(Debug, Clone)]
pub struct ReferenceSource {
    pub path: PathBuf,
    pub time_key: String,
    pub value_key: String,
}

#[derive(Debug, Clone)]
pub struct ComparisonPlan {
    pub reference: ReferenceSource,
    pub first: ModelVariant,
    pub second: ModelVariant,
    pub selection: VariantSelection,
    pub alignment: AlignmentPolicy,
    pub thresholds: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct VariantReport {
    pub variant: ModelVariant,
    /// Full modeled series before alignment
    pub model: TimeSeries,
    pub aligned: AlignedPair,
    pub metrics: MetricsResult,
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub source: PathBuf,
    pub reference: TimeSeries,
    pub variants: Vec<VariantReport>,
    pub percent_better: Option<f64>,
    pub sweep: ThresholdSweepTable,
    pub fit_name: &'static str,
}

impl ComparisonReport {
    pub fn n_points(&self) -> usize {
        self.variants.first().map(|v| v.aligned.len()).unwrap_or(0)
    }

    /// The variant driving the scatter plot and threshold sweep.
    pub fn primary(&self) -> Option<&VariantReport> {
        self.variants.first()
    }
}

/// Sink for the artifacts of a comparison run.
pub trait ComparisonOutput {
    fn render_plots(&mut self, report: &ComparisonReport) -> anyhow::Result<()>;

    fn write_metrics(&mut self, report: &ComparisonReport) -> anyhow::Result<()>;

    fn write_threshold_table(&mut self, sweep: &ThresholdSweepTable) -> anyhow::Result<()>;
}

pub struct ComparisonService {
    repository: Box<dyn SeriesRepository>,
    strategy: Box<dyn RegressionStrategy>,
    plan: ComparisonPlan,
}

impl ComparisonService {
    pub fn new(
        repository: Box<dyn SeriesRepository>,
        strategy: Box<dyn RegressionStrategy>,
        plan: ComparisonPlan,
    ) -> Self {
        Self {
            repository,
            strategy,
            plan,
        }
    }

    /// Load, align and score. Nothing is written here.
    pub fn compare(&self, sim_log: &Path) -> anyhow::Result<ComparisonReport> {
        let run = self
            .repository
            .load_model_run(sim_log)
            .context("failed to load simulation log")?;
        let reference = &self.plan.reference;
        let obs = self
            .repository
            .load_reference(&reference.path, &reference.time_key, &reference.value_key)
            .context("failed to load reference series")?;

        let mut variants = Vec::new();
        for variant in self.plan.selection.select(&self.plan.first, &self.plan.second) {
            let model = require_column(&run, &variant.column)?.clone();
            let aligned = align(&model, &obs, self.plan.alignment)
                .with_context(|| format!("cannot align '{}' with '{}'", variant.column, obs.name()))?;
            let metrics = continuous_metrics(&aligned.model.values(), &aligned.obs.values(), self.strategy.as_ref())
                .with_context(|| format!("metrics failed for {}", variant.label))?;
            tracing::info!(
                "{}: {} samples, RMSE {:.3}",
                variant.label,
                aligned.len(),
                metrics.get(crate::domain::metrics::RMSE).unwrap_or(f64::NAN)
            );
            variants.push(VariantReport {
                variant: variant.clone(),
                model,
                aligned,
                metrics,
            });
        }

        let percent_better = match variants.as_slice() {
            [first, second] if self.plan.selection.is_both() => Some(
                percent_better(
                    &first.aligned.model.values(),
                    &second.aligned.model.values(),
                    &first.aligned.obs.values(),
                )
                .context("cannot compare model variants")?,
            ),
            _ => None,
        };

        let primary = variants
            .first()
            .context("no model variant selected")?;
        let sweep = sweep_thresholds(
            &primary.aligned.model.values(),
            &primary.aligned.obs.values(),
            &self.plan.thresholds,
        )
        .context("threshold sweep failed")?;
        tracing::info!("Threshold sweep produced {} rows", sweep.len());

        Ok(ComparisonReport {
            source: run.source.clone(),
            reference: obs,
            variants,
            percent_better,
            sweep,
            fit_name: self.strategy.name(),
        })
    }

    /// Compare, then hand every artifact to `output` in a fixed order.
    pub fn run(&self, sim_log: &Path, output: &mut dyn ComparisonOutput) -> anyhow::Result<ComparisonReport> {
        let report = self.compare(sim_log)?;
        output.render_plots(&report)?;
        output.write_metrics(&report)?;
        output.write_threshold_table(&report.sweep)?;
        Ok(report)
    }
}
