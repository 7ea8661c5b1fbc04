// Continuous verification metric models
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("series lengths differ: predicted has {predicted} samples, observed has {observed}")]
    LengthMismatch { predicted: usize, observed: usize },
    #[error("cannot compute metrics over an empty series")]
    Empty,
    #[error("non-finite value at sample {index}")]
    NonFinite { index: usize },
    #[error("cannot fit a line when all observed values are identical")]
    DegenerateRegression,
}

pub const ME: &str = "ME";
pub const MAE: &str = "MAE";
pub const MDAE: &str = "MdAE";
pub const MSE: &str = "MSE";
pub const RMSE: &str = "RMSE";
pub const BIAS: &str = "bias";
pub const PRED_EFF: &str = "PredEff";
pub const PEARSON_R: &str = "r";
pub const INTERCEPT: &str = "Intercept";
pub const SLOPE: &str = "Slope";

/// Metric names in reporting order.
pub const METRIC_KEYS: [&str; 10] = [
    ME, MAE, MDAE, MSE, RMSE, BIAS, PRED_EFF, PEARSON_R, INTERCEPT, SLOPE,
];

/// Straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn equation(&self) -> String {
        format!("y = {:0.3}x + {:0.3}", self.slope, self.intercept)
    }
}

/// Scalar agreement statistics keyed by metric name, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsResult {
    entries: Vec<(&'static str, f64)>,
}

impl MetricsResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fit(&self) -> Option<LinearFit> {
        Some(LinearFit::new(self.get(SLOPE)?, self.get(INTERCEPT)?))
    }
}
