// Reader for whitespace-columned simulation log files
use crate::application::series_repository::LoadError;
use crate::domain::series::{ModelRun, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const CALENDAR_COLUMNS: [&str; 7] = ["year", "mo", "dy", "hr", "mn", "sc", "msc"];
const ELAPSED_COLUMNS: [&str; 2] = ["t", "time"];

/// Parses logs whose first line is a description, second line the column
/// names, and remaining lines numeric rows.
#[derive(Debug, Clone, Default)]
pub struct RamLogReader {
    start_time: Option<NaiveDateTime>,
}

impl RamLogReader {
    pub fn new(start_time: Option<NaiveDateTime>) -> Self {
        Self { start_time }
    }

    pub fn read(&self, path: &Path) -> Result<ModelRun, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let parse_err = |line: usize, message: String| LoadError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let mut lines = reader.lines().enumerate();

        // description line
        if let Some((_, line)) = lines.next() {
            line.map_err(io_err)?;
        }
        let names: Vec<String> = match lines.next() {
            Some((_, line)) => line.map_err(io_err)?.split_whitespace().map(str::to_string).collect(),
            None => Vec::new(),
        };
        if names.is_empty() {
            return Err(LoadError::Header {
                path: path.to_path_buf(),
                message: "missing column-name line".to_string(),
            });
        }

        let mut data: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        let mut row_lines = Vec::new();
        for (idx, line) in lines {
            let line = line.map_err(io_err)?;
            let line_no = idx + 1;
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.is_empty() {
                continue;
            }
            if cells.len() != names.len() {
                return Err(parse_err(
                    line_no,
                    format!("expected {} columns, found {}", names.len(), cells.len()),
                ));
            }
            for (column, cell) in data.iter_mut().zip(&cells) {
                let value = cell
                    .parse::<f64>()
                    .map_err(|_| parse_err(line_no, format!("'{}' is not a number", cell)))?;
                column.push(value);
            }
            row_lines.push(line_no);
        }

        let times = self.build_times(path, &names, &data, &row_lines)?;

        let mut columns = BTreeMap::new();
        for (name, values) in names.iter().zip(&data) {
            if CALENDAR_COLUMNS.contains(&name.as_str()) || ELAPSED_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            let series = TimeSeries::from_parts(name.clone(), &times, values).map_err(|source| {
                LoadError::Series {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            columns.insert(name.clone(), series);
        }

        tracing::info!(
            "Loaded {} samples of {} columns from {}",
            times.len(),
            columns.len(),
            path.display()
        );
        Ok(ModelRun::new(path.to_path_buf(), columns))
    }

    fn build_times(
        &self,
        path: &Path,
        names: &[String],
        data: &[Vec<f64>],
        row_lines: &[usize],
    ) -> Result<Vec<NaiveDateTime>, LoadError> {
        let column = |name: &str| names.iter().position(|n| n == name).map(|i| data[i].as_slice());
        let calendar: Option<Vec<&[f64]>> = CALENDAR_COLUMNS.iter().map(|name| column(*name)).collect();
        if let Some(calendar) = calendar {
            return row_lines
                .iter()
                .enumerate()
                .map(|(row, &line)| {
                    let field = |i: usize| calendar[i][row];
                    calendar_time(field(0), field(1), field(2), field(3), field(4), field(5), field(6))
                        .ok_or_else(|| LoadError::Parse {
                            path: path.to_path_buf(),
                            line,
                            message: "invalid calendar date/time".to_string(),
                        })
                })
                .collect();
        }

        let elapsed = ELAPSED_COLUMNS.iter().find_map(|name| column(*name));
        match (elapsed, self.start_time) {
            (Some(seconds), Some(start)) => seconds
                .iter()
                .zip(row_lines)
                .map(|(&s, &line)| {
                    elapsed_time(start, s).ok_or_else(|| LoadError::Parse {
                        path: path.to_path_buf(),
                        line,
                        message: format!("elapsed time {} s is out of range", s),
                    })
                })
                .collect(),
            _ => Err(LoadError::MissingTime {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn elapsed_time(start: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    start.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

fn calendar_time(year: f64, mo: f64, dy: f64, hr: f64, mn: f64, sc: f64, msc: f64) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year as i32, mo as u32, dy as u32)?.and_hms_milli_opt(
        hr as u32,
        mn as u32,
        sc as u32,
        msc as u32,
    )
}
