// Time series domain models
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("series '{name}' is not strictly increasing in time at sample {index}")]
    NonMonotonic { name: String, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time: NaiveDateTime, value: f64) -> Self {
        Self { time, value }
    }
}

/// A named, strictly time-ordered sequence of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    points: Vec<TimeSeriesPoint>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<TimeSeriesPoint>) -> Result<Self, SeriesError> {
        let name = name.into();
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].time <= pair[0].time)
        {
            return Err(SeriesError::NonMonotonic {
                name,
                index: index + 1,
            });
        }
        Ok(Self { name, points })
    }

    pub fn from_parts(
        name: impl Into<String>,
        times: &[NaiveDateTime],
        values: &[f64],
    ) -> Result<Self, SeriesError> {
        let points = times
            .iter()
            .zip(values)
            .map(|(&time, &value)| TimeSeriesPoint::new(time, value))
            .collect();
        Self::new(name, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.points.first().map(|p| p.time)
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.points.last().map(|p| p.time)
    }

    /// Spacing between the first two samples.
    pub fn cadence(&self) -> Option<TimeDelta> {
        match self.points.as_slice() {
            [first, second, ..] => Some(second.time - first.time),
            _ => None,
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.points.truncate(len);
    }
}

/// Every numeric column of a simulation log, keyed by column name.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub source: PathBuf,
    pub columns: BTreeMap<String, TimeSeries>,
}

impl ModelRun {
    pub fn new(source: PathBuf, columns: BTreeMap<String, TimeSeries>) -> Self {
        Self { source, columns }
    }

    pub fn series(&self, column: &str) -> Option<&TimeSeries> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.values().next().map(TimeSeries::len).unwrap_or(0)
    }
}
