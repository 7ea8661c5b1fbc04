// Threshold sweep table model
use super::contingency::{CategoricalScores, ContingencyTable, categorical_scores};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRow {
    pub threshold: f64,
    pub scores: CategoricalScores,
    pub n_predict: u64,
}

impl ThresholdRow {
    pub fn from_table(threshold: f64, table: &ContingencyTable) -> Self {
        Self {
            threshold,
            scores: categorical_scores(table),
            n_predict: table.predicted_events(),
        }
    }
}

/// Rows in the order the thresholds were swept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSweepTable {
    rows: Vec<ThresholdRow>,
}

impl ThresholdSweepTable {
    pub fn new(rows: Vec<ThresholdRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ThresholdRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.threshold).collect()
    }
}
