// Pluggable line-fitting strategies for model-vs-observed regression
use crate::domain::metrics::{LinearFit, MetricsError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub trait RegressionStrategy {
    fn name(&self) -> &'static str;

    /// Fit `y = slope * x + intercept` with x as the independent variable
    fn fit(&self, x: &[f64], y: &[f64]) -> Result<LinearFit, MetricsError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RegressionKind {
    #[default]
    Ols,
    TheilSen,
}

impl RegressionKind {
    pub fn strategy(&self) -> Box<dyn RegressionStrategy> {
        match self {
            RegressionKind::Ols => Box::new(OrdinaryLeastSquares),
            RegressionKind::TheilSen => Box::new(TheilSen),
        }
    }
}

fn check_inputs(x: &[f64], y: &[f64]) -> Result<(), MetricsError> {
    if x.len() != y.len() {
        return Err(MetricsError::LengthMismatch {
            predicted: y.len(),
            observed: x.len(),
        });
    }
    if x.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Centered sums of squares and cross-products: (Sxx, Syy, Sxy).
pub(crate) fn centered_moments(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let x_mean = mean(x);
    let y_mean = mean(y);
    x.iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), (&xi, &yi)| {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
        })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

impl RegressionStrategy for OrdinaryLeastSquares {
    fn name(&self) -> &'static str {
        "OLS"
    }

    fn fit(&self, x: &[f64], y: &[f64]) -> Result<LinearFit, MetricsError> {
        check_inputs(x, y)?;
        let (sxx, _, sxy) = centered_moments(x, y);
        if sxx == 0.0 {
            return Err(MetricsError::DegenerateRegression);
        }
        let slope = sxy / sxx;
        let intercept = mean(y) - slope * mean(x);
        Ok(LinearFit::new(slope, intercept))
    }
}

/// Median of pairwise slopes; resistant to outliers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TheilSen;

impl RegressionStrategy for TheilSen {
    fn name(&self) -> &'static str {
        "Theil-Sen"
    }

    fn fit(&self, x: &[f64], y: &[f64]) -> Result<LinearFit, MetricsError> {
        check_inputs(x, y)?;
        let mut slopes = Vec::new();
        for i in 0..x.len() {
            for j in (i + 1)..x.len() {
                let dx = x[j] - x[i];
                if dx != 0.0 {
                    slopes.push((y[j] - y[i]) / dx);
                }
            }
        }
        if slopes.is_empty() {
            return Err(MetricsError::DegenerateRegression);
        }
        let slope = median(&mut slopes);
        let mut residuals: Vec<f64> = x.iter().zip(y).map(|(&xi, &yi)| yi - slope * xi).collect();
        let intercept = median(&mut residuals);
        Ok(LinearFit::new(slope, intercept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ols_recovers_exact_line() {
        let x = [-50.0, -20.0, 0.0, 10.0, 35.0];
        let y: Vec<f64> = x.iter().map(|v| 0.8 * v - 4.0).collect();
        let fit = OrdinaryLeastSquares.fit(&x, &y).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ols_constant_y_has_zero_slope() {
        let x = [-80.0, -10.0, 5.0, 22.0];
        let y = [-30.0; 4];
        let fit = OrdinaryLeastSquares.fit(&x, &y).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, -30.0);
    }

    #[test]
    fn test_identical_x_is_degenerate() {
        let x = [3.0; 5];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(
            OrdinaryLeastSquares.fit(&x, &y).unwrap_err(),
            MetricsError::DegenerateRegression
        );
        assert_eq!(TheilSen.fit(&x, &y).unwrap_err(), MetricsError::DegenerateRegression);
    }

    #[test]
    fn test_theil_sen_ignores_single_outlier() {
        let x: Vec<f64> = (0..11).map(|i| i as f64 * 10.0 - 100.0).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 1.5 * v + 2.0).collect();
        y[7] = 400.0;

        let robust = TheilSen.fit(&x, &y).unwrap();
        assert!((robust.slope - 1.5).abs() < 1e-12);
        assert!((robust.intercept - 2.0).abs() < 1e-12);

        let ols = OrdinaryLeastSquares.fit(&x, &y).unwrap();
        assert!((ols.slope - 1.5).abs() > 0.1);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
