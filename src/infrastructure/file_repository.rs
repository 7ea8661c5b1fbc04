// Local-file repository implementation
use crate::application::series_repository::{LoadError, SeriesRepository};
use crate::domain::series::{ModelRun, TimeSeries};
use crate::infrastructure::headed_ascii::read_headed_ascii;
use crate::infrastructure::ram_log_reader::RamLogReader;
use chrono::NaiveDateTime;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FileSeriesRepository {
    log_reader: RamLogReader,
}

impl FileSeriesRepository {
    pub fn new(start_time: Option<NaiveDateTime>) -> Self {
        Self {
            log_reader: RamLogReader::new(start_time),
        }
    }
}

impl SeriesRepository for FileSeriesRepository {
    fn load_model_run(&self, path: &Path) -> Result<ModelRun, LoadError> {
        tracing::debug!("Reading simulation log {}", path.display());
        self.log_reader.read(path)
    }

    fn load_reference(&self, path: &Path, time_key: &str, value_key: &str) -> Result<TimeSeries, LoadError> {
        tracing::debug!("Reading reference '{}' from {}", value_key, path.display());
        let series = read_headed_ascii(path)?.series(time_key, value_key)?;
        tracing::info!(
            "Loaded {} reference samples of '{}' from {}",
            series.len(),
            value_key,
            path.display()
        );
        Ok(series)
    }
}
