use crate::application::alignment::AlignmentPolicy;
use crate::application::regression::RegressionKind;
use crate::domain::variant::{ModelVariant, VariantSelection};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config/verify";
const ENV_PREFIX: &str = "SYMH_VERIFY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub reference: ReferenceSettings,
    #[serde(default)]
    pub variants: VariantSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub plot: PlotSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReferenceSettings {
    pub path: PathBuf,
    pub time_key: String,
    pub value_key: String,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("kyotodata_Jan2005.txt"),
            time_key: "time".to_string(),
            value_key: "sym-h".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VariantSettings {
    pub selection: VariantSelection,
    pub first: ModelVariant,
    pub second: ModelVariant,
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self {
            selection: VariantSelection::FirstOnly,
            first: ModelVariant::new("dstBiot", "Biot-Savart"),
            second: ModelVariant::new("dstRam", "DPS"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub alignment: AlignmentPolicy,
    pub regression: RegressionKind,
    /// Epoch for logs that carry elapsed seconds instead of calendar columns
    pub start_time: Option<NaiveDateTime>,
    pub thresholds: ThresholdSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            alignment: AlignmentPolicy::Strict,
            regression: RegressionKind::Ols,
            start_time: None,
            thresholds: ThresholdSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ThresholdSettings {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            start: -100.0,
            stop: 10.0,
            step: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub timeseries_plot: String,
    pub scatter_plot: String,
    pub metrics_log: String,
    pub threshold_table: String,
    pub render_plots: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            timeseries_plot: "DstCompare.png".to_string(),
            scatter_plot: "DstCompare_scatter.png".to_string(),
            metrics_log: "metrics_all.log".to_string(),
            threshold_table: "threshold_stats.txt".to_string(),
            render_plots: true,
        }
    }
}

impl OutputSettings {
    pub fn timeseries_plot_path(&self) -> PathBuf {
        self.dir.join(&self.timeseries_plot)
    }

    pub fn scatter_plot_path(&self) -> PathBuf {
        self.dir.join(&self.scatter_plot)
    }

    pub fn metrics_log_path(&self) -> PathBuf {
        self.dir.join(&self.metrics_log)
    }

    pub fn threshold_table_path(&self) -> PathBuf {
        self.dir.join(&self.threshold_table)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
    pub scatter_size: u32,
    pub scatter_min: f64,
    pub scatter_max: f64,
    pub density_bins: usize,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            scatter_size: 500,
            scatter_min: -125.0,
            scatter_max: 60.0,
            density_bins: 40,
        }
    }
}

/// Layer built-in defaults, the config file and `SYMH_VERIFY__*` environment overrides.
///
/// An explicit `path` must exist; the default `config/verify` file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let defaults = config::Config::try_from(&Settings::default())?;

    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = config::Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn to_toml(settings: &Settings) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[variants]
selection = "both"

[analysis]
alignment = "truncate"
regression = "theil-sen"

[analysis.thresholds]
start = -50.0
stop = 0.0
step = 5.0

[output]
render_plots = false
"#
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.variants.selection, VariantSelection::Both);
        assert_eq!(settings.analysis.alignment, AlignmentPolicy::Truncate);
        assert_eq!(settings.analysis.regression, RegressionKind::TheilSen);
        assert_eq!(settings.analysis.thresholds.step, 5.0);
        assert!(!settings.output.render_plots);
        // untouched sections keep their defaults
        assert_eq!(settings.reference, ReferenceSettings::default());
        assert_eq!(settings.variants.first.column, "dstBiot");
    }

    #[test]
    fn test_toml_dump_round_trips() {
        let settings = Settings::default();
        let dumped = to_toml(&settings).unwrap();
        assert!(dumped.contains("[analysis.thresholds]"));
        let parsed: Settings = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_output_paths_join_dir() {
        let output = OutputSettings {
            dir: PathBuf::from("out"),
            ..OutputSettings::default()
        };
        assert_eq!(output.threshold_table_path(), PathBuf::from("out/threshold_stats.txt"));
    }
}
