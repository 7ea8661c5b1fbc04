// Command-line interface
use crate::application::alignment::AlignmentPolicy;
use crate::application::regression::RegressionKind;
use crate::domain::variant::VariantSelection;
use crate::infrastructure::config::Settings;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "symh-verify",
    version,
    about = "Compare modeled SYM-H against an observed index series"
)]
pub struct Cli {
    /// Simulation log holding the modeled index columns
    pub sim_log: Option<PathBuf>,
    #[arg(long, help = "JSON-headed ASCII file with the reference series")]
    pub reference: Option<PathBuf>,
    #[arg(long, help = "Configuration file (defaults to config/verify.toml if present)")]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, help = "Model variants to compare")]
    pub variants: Option<VariantSelection>,
    #[arg(long, value_enum, help = "How to reconcile series of different length")]
    pub alignment: Option<AlignmentPolicy>,
    #[arg(long, value_enum, help = "Line-fitting method for the scatter regression")]
    pub regression: Option<RegressionKind>,
    #[arg(long, help = "Directory receiving plots, log and threshold table")]
    pub output_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Skip rendering the PNG figures")]
    pub no_plots: bool,
    #[arg(long, default_value_t = false, help = "Print the effective configuration as TOML and exit")]
    pub print_config: bool,
}

impl Cli {
    /// Command-line flags take precedence over every other configuration layer.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(reference) = &self.reference {
            settings.reference.path = reference.clone();
        }
        if let Some(selection) = self.variants {
            settings.variants.selection = selection;
        }
        if let Some(alignment) = self.alignment {
            settings.analysis.alignment = alignment;
        }
        if let Some(regression) = self.regression {
            settings.analysis.regression = regression;
        }
        if let Some(dir) = &self.output_dir {
            settings.output.dir = dir.clone();
        }
        if self.no_plots {
            settings.output.render_plots = false;
        }
    }
}
