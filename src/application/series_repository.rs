// Repository trait for loading model and reference series
use crate::domain::series::{ModelRun, SeriesError, TimeSeries};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}: required column '{column}' is missing", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error(
        "{}: cannot build times (need year/mo/dy/hr/mn/sc/msc columns, or a t/time column plus a start time)",
        .path.display()
    )]
    MissingTime { path: PathBuf },
    #[error("{}: malformed header: {message}", .path.display())]
    Header { path: PathBuf, message: String },
    #[error("{}: {source}", .path.display())]
    Series {
        path: PathBuf,
        #[source]
        source: SeriesError,
    },
}

pub trait SeriesRepository {
    /// Load every numeric column of a simulation log over its time base
    fn load_model_run(&self, path: &Path) -> Result<ModelRun, LoadError>;

    /// Load one named reference column over the named time column
    fn load_reference(&self, path: &Path, time_key: &str, value_key: &str) -> Result<TimeSeries, LoadError>;
}

/// Look up a required model column, failing loudly when it is absent.
pub fn require_column<'a>(run: &'a ModelRun, column: &str) -> Result<&'a TimeSeries, LoadError> {
    run.series(column).ok_or_else(|| LoadError::MissingColumn {
        path: run.source.clone(),
        column: column.to_string(),
    })
}
