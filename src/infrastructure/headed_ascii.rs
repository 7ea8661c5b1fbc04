// JSON-headed ASCII tables: a `#`-prefixed JSON header describing whitespace-separated columns
use crate::application::series_repository::LoadError;
use crate::domain::contingency::CategoricalScores;
use crate::domain::series::TimeSeries;
use crate::domain::sweep::{ThresholdRow, ThresholdSweepTable};
use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode header for {}", .path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub start_column: usize,
    pub dimension: usize,
    pub attrs: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct HeadedTable {
    pub path: PathBuf,
    metas: Vec<(String, ColumnMeta)>,
    rows: Vec<(usize, Vec<String>)>,
}

impl HeadedTable {
    pub fn meta(&self, name: &str) -> Option<&ColumnMeta> {
        self.metas.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.metas.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Raw cells of a one-dimensional column, with their source line numbers.
    fn cells(&self, name: &str) -> Result<Vec<(usize, &str)>, LoadError> {
        let meta = self.meta(name).ok_or_else(|| LoadError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })?;
        if meta.dimension != 1 {
            return Err(LoadError::Header {
                path: self.path.clone(),
                message: format!("column '{}' has dimension {}; only scalar columns are supported", name, meta.dimension),
            });
        }
        self.rows
            .iter()
            .map(|(line, cells)| {
                cells
                    .get(meta.start_column)
                    .map(|cell| (*line, cell.as_str()))
                    .ok_or_else(|| LoadError::Parse {
                        path: self.path.clone(),
                        line: *line,
                        message: format!("row has no column {} for '{}'", meta.start_column, name),
                    })
            })
            .collect()
    }

    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, LoadError> {
        self.cells(name)?
            .into_iter()
            .map(|(line, cell)| {
                cell.parse::<f64>().map_err(|_| LoadError::Parse {
                    path: self.path.clone(),
                    line,
                    message: format!("'{}' is not a number in column '{}'", cell, name),
                })
            })
            .collect()
    }

    pub fn times(&self, name: &str) -> Result<Vec<NaiveDateTime>, LoadError> {
        self.cells(name)?
            .into_iter()
            .map(|(line, cell)| {
                parse_iso_time(cell).ok_or_else(|| LoadError::Parse {
                    path: self.path.clone(),
                    line,
                    message: format!("'{}' is not an ISO-8601 time in column '{}'", cell, name),
                })
            })
            .collect()
    }

    pub fn series(&self, time_key: &str, value_key: &str) -> Result<TimeSeries, LoadError> {
        let times = self.times(time_key)?;
        let values = self.numbers(value_key)?;
        TimeSeries::from_parts(value_key, &times, &values).map_err(|source| LoadError::Series {
            path: self.path.clone(),
            source,
        })
    }
}

pub fn parse_iso_time(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn parse_meta(path: &Path, name: &str, value: &Value) -> Result<Option<ColumnMeta>, LoadError> {
    let Some(attrs) = value.as_object() else {
        return Ok(None);
    };
    let Some(start) = attrs.get("START_COLUMN") else {
        return Ok(None);
    };
    let start_column = start.as_u64().ok_or_else(|| LoadError::Header {
        path: path.to_path_buf(),
        message: format!("START_COLUMN of '{}' is not a column index", name),
    })? as usize;
    let dimension = attrs
        .get("DIMENSION")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(Value::as_u64)
        .unwrap_or(1) as usize;

    let mut attrs = attrs.clone();
    attrs.remove("START_COLUMN");
    attrs.remove("DIMENSION");
    Ok(Some(ColumnMeta {
        start_column,
        dimension,
        attrs,
    }))
}

/// Terminator line some writers put after the closing brace.
const END_JSON: &str = "END JSON";

pub fn read_headed_ascii(path: &Path) -> Result<HeadedTable, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut header = String::new();
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let trimmed = line.trim();
        if let Some(json_part) = trimmed.strip_prefix('#') {
            if json_part.trim() == END_JSON {
                continue;
            }
            header.push_str(json_part);
            header.push('\n');
        } else if !trimmed.is_empty() {
            rows.push((idx + 1, trimmed.split_whitespace().map(str::to_string).collect()));
        }
    }

    if header.trim().is_empty() {
        return Err(LoadError::Header {
            path: path.to_path_buf(),
            message: "no '#' header lines found".to_string(),
        });
    }
    let columns: Map<String, Value> = serde_json::from_str(&header).map_err(|e| LoadError::Header {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut metas = Vec::new();
    for (name, value) in &columns {
        if let Some(meta) = parse_meta(path, name, value)? {
            metas.push((name.clone(), meta));
        }
    }
    metas.sort_by_key(|(_, m)| m.start_column);

    tracing::debug!(
        "Read {} columns and {} rows from {}",
        metas.len(),
        rows.len(),
        path.display()
    );
    Ok(HeadedTable {
        path: path.to_path_buf(),
        metas,
        rows,
    })
}

type ScoreGetter = fn(&CategoricalScores) -> f64;

/// Score columns of the threshold table: name, description, accessor.
const SCORE_COLUMNS: [(&str, &str, ScoreGetter); 9] = [
    ("HSS", "Heidke Skill Score", |s| s.heidke),
    ("PSS", "Peirce Skill Score", |s| s.peirce),
    ("POD", "Probability of Detection", |s| s.pod),
    ("POFD", "Probability of False Detection", |s| s.pofd),
    ("FAR", "False Alarm Ratio", |s| s.far),
    ("FB", "Frequency Bias", |s| s.frequency_bias),
    ("PC", "Proportion Correct", |s| s.proportion_correct),
    ("TS", "Threat Score (Critical Success Index)", |s| s.threat_score),
    ("ETS", "Equitable Threat Score", |s| s.equitable_threat_score),
];

const THRESHOLD: &str = "Threshold";
const N_PREDICT: &str = "Npredict";

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", value)
    }
}

fn header_entries() -> Vec<(&'static str, Value)> {
    let mut entries = vec![(
        THRESHOLD,
        json!({"DIMENSION": [1], "START_COLUMN": 0, "Notes": "SYM-H threshold", "Units": "nT"}),
    )];
    for (idx, (name, notes, _)) in SCORE_COLUMNS.iter().enumerate() {
        entries.push((
            *name,
            json!({"DIMENSION": [1], "START_COLUMN": idx + 1, "Notes": notes, "DEPEND_0": THRESHOLD}),
        ));
    }
    entries.push((
        N_PREDICT,
        json!({
            "DIMENSION": [1],
            "START_COLUMN": SCORE_COLUMNS.len() + 1,
            "Notes": "Number of \"Events\" predicted",
            "DEPEND_0": THRESHOLD
        }),
    ));
    entries
}

/// Write the sweep keyed by its threshold column.
pub fn write_threshold_table(path: &Path, table: &ThresholdSweepTable) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);

    let header: Map<String, Value> = header_entries()
        .into_iter()
        .map(|(name, attrs)| (name.to_string(), attrs))
        .collect();
    let encoded = serde_json::to_string_pretty(&header).map_err(|source| ReportError::Header {
        path: path.to_path_buf(),
        source,
    })?;
    for line in encoded.lines() {
        writeln!(out, "#{}", line).map_err(io_err)?;
    }
    writeln!(out, "# {}", END_JSON).map_err(io_err)?;

    for row in table.rows() {
        let mut cells = vec![format_value(row.threshold)];
        cells.extend(SCORE_COLUMNS.iter().map(|(_, _, get)| format_value(get(&row.scores))));
        cells.push(row.n_predict.to_string());
        writeln!(out, "{}", cells.join(" ")).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    tracing::info!("Wrote {} threshold rows to {}", table.len(), path.display());
    Ok(())
}

pub fn read_threshold_table(path: &Path) -> Result<ThresholdSweepTable, LoadError> {
    let headed = read_headed_ascii(path)?;
    let thresholds = headed.numbers(THRESHOLD)?;
    let mut scores = Vec::with_capacity(SCORE_COLUMNS.len());
    for (name, _, _) in SCORE_COLUMNS {
        scores.push(headed.numbers(name)?);
    }
    let n_predict = headed.numbers(N_PREDICT)?;

    let rows = thresholds
        .iter()
        .enumerate()
        .map(|(i, &threshold)| ThresholdRow {
            threshold,
            scores: CategoricalScores {
                heidke: scores[0][i],
                peirce: scores[1][i],
                pod: scores[2][i],
                pofd: scores[3][i],
                far: scores[4][i],
                frequency_bias: scores[5][i],
                proportion_correct: scores[6][i],
                threat_score: scores[7][i],
                equitable_threat_score: scores[8][i],
            },
            n_predict: n_predict[i] as u64,
        })
        .collect();
    Ok(ThresholdSweepTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::threshold_service::{sweep_thresholds, threshold_range};

    const KYOTO: &str = r#"#{
#  "time": {"DIMENSION": [1], "START_COLUMN": 0},
#  "sym-h": {"DIMENSION": [1], "START_COLUMN": 1, "UNITS": "nT", "Description": "SYM-H index"},
#  "Source": "WDC Kyoto"
#}
2005-01-01T00:00:00 -12
2005-01-01T00:01:00 -13.5

2005-01-01T00:02:00Z -15
"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn same_bits(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || a == b
    }

    #[test]
    fn test_reads_reference_series() {
        let file = write_temp(KYOTO);
        let table = read_headed_ascii(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["time", "sym-h"]);
        assert_eq!(table.meta("sym-h").unwrap().attrs["UNITS"], "nT");

        let series = table.series("time", "sym-h").unwrap();
        assert_eq!(series.values(), vec![-12.0, -13.5, -15.0]);
        assert_eq!(series.cadence(), Some(chrono::TimeDelta::minutes(1)));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let file = write_temp(KYOTO);
        let table = read_headed_ascii(file.path()).unwrap();
        let err = table.numbers("dst").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column, .. } if column == "dst"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let file = write_temp(&KYOTO.replace("-13.5", "oops"));
        let table = read_headed_ascii(file.path()).unwrap();
        let err = table.numbers("sym-h").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 7, .. }));
    }

    #[test]
    fn test_end_json_terminator_is_skipped() {
        let file = write_temp(&KYOTO.replacen("#}\n", "#}\n# END JSON\n", 1));
        let table = read_headed_ascii(file.path()).unwrap();
        let series = table.series("time", "sym-h").unwrap();
        assert_eq!(series.values(), vec![-12.0, -13.5, -15.0]);
    }

    #[test]
    fn test_headerless_file_is_rejected() {
        let file = write_temp("2005-01-01T00:00:00 -12\n");
        assert!(matches!(
            read_headed_ascii(file.path()).unwrap_err(),
            LoadError::Header { .. }
        ));
    }

    #[test]
    fn test_threshold_table_round_trips() {
        let observed: Vec<f64> = (0..120).map(|i| ((i as f64) * 0.21).sin() * 70.0 - 25.0).collect();
        let predicted: Vec<f64> = observed.iter().map(|v| v * 0.87 - 1.3).collect();
        let sweep = sweep_thresholds(&predicted, &observed, &threshold_range(-100.0, 10.0, 1.0).unwrap())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threshold_stats.txt");
        write_threshold_table(&path, &sweep).unwrap();
        let reread = read_threshold_table(&path).unwrap();

        assert_eq!(reread.len(), sweep.len());
        for (a, b) in sweep.rows().iter().zip(reread.rows()) {
            assert_eq!(a.threshold, b.threshold);
            assert_eq!(a.n_predict, b.n_predict);
            for (_, _, get) in SCORE_COLUMNS {
                assert!(same_bits(get(&a.scores), get(&b.scores)));
            }
        }
    }

    #[test]
    fn test_threshold_header_is_self_describing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threshold_stats.txt");
        write_threshold_table(&path, &ThresholdSweepTable::default()).unwrap();

        let headed = read_headed_ascii(&path).unwrap();
        assert_eq!(headed.column_names()[0], THRESHOLD);
        assert_eq!(headed.meta(THRESHOLD).unwrap().attrs["Units"], "nT");
        let pod = headed.meta("POD").unwrap();
        assert_eq!(pod.attrs["Notes"], "Probability of Detection");
        assert_eq!(pod.attrs["DEPEND_0"], THRESHOLD);
        assert_eq!(headed.row_count(), 0);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().all(|line| line.starts_with('#')));
        assert_eq!(text.lines().last(), Some("# END JSON"));
    }
}
