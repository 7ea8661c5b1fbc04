// Continuous agreement statistics between a modeled and an observed series
use crate::application::regression::{RegressionStrategy, centered_moments, mean, median};
use crate::domain::metrics::{
    BIAS, INTERCEPT, MAE, MDAE, ME, MSE, MetricsError, MetricsResult, PEARSON_R, PRED_EFF, RMSE, SLOPE,
};

fn check_pair(model: &[f64], obs: &[f64]) -> Result<(), MetricsError> {
    if model.len() != obs.len() {
        return Err(MetricsError::LengthMismatch {
            predicted: model.len(),
            observed: obs.len(),
        });
    }
    if obs.is_empty() {
        return Err(MetricsError::Empty);
    }
    if let Some(index) = model
        .iter()
        .zip(obs)
        .position(|(m, o)| !m.is_finite() || !o.is_finite())
    {
        return Err(MetricsError::NonFinite { index });
    }
    Ok(())
}

fn mean_squared_error(predicted: &[f64], reference: impl Fn(usize) -> f64) -> f64 {
    predicted
        .iter()
        .enumerate()
        .map(|(i, p)| (p - reference(i)).powi(2))
        .sum::<f64>()
        / predicted.len() as f64
}

/// Pearson correlation, 0 when either series has no spread.
pub fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let (sxx, syy, sxy) = centered_moments(x, y);
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (sxy / denominator).clamp(-1.0, 1.0)
    }
}

/// Accuracy, bias, skill and regression statistics of `model` against `obs`.
///
/// The regression treats `obs` as x and `model` as y.
pub fn continuous_metrics(
    model: &[f64],
    obs: &[f64],
    strategy: &dyn RegressionStrategy,
) -> Result<MetricsResult, MetricsError> {
    check_pair(model, obs)?;

    let errors: Vec<f64> = model.iter().zip(obs).map(|(m, o)| m - o).collect();
    let mut abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();

    let mse = mean_squared_error(model, |i| obs[i]);
    let climatology = mean(obs);
    let mse_clim = mean_squared_error(obs, |_| climatology);
    let pred_eff = if mse_clim == 0.0 {
        if mse == 0.0 { 1.0 } else { f64::NAN }
    } else {
        1.0 - mse / mse_clim
    };

    let fit = strategy.fit(obs, model)?;

    let mut metrics = MetricsResult::new();
    metrics.insert(ME, mean(&errors));
    metrics.insert(MAE, mean(&abs_errors));
    metrics.insert(MDAE, median(&mut abs_errors));
    metrics.insert(MSE, mse);
    metrics.insert(RMSE, mse.sqrt());
    metrics.insert(BIAS, mean(model) - climatology);
    metrics.insert(PRED_EFF, pred_eff);
    metrics.insert(PEARSON_R, pearson_r(obs, model));
    metrics.insert(INTERCEPT, fit.intercept);
    metrics.insert(SLOPE, fit.slope);

    tracing::debug!(
        "Computed {} metrics over {} samples using {} fit",
        metrics.len(),
        obs.len(),
        strategy.name()
    );
    Ok(metrics)
}

/// Percentage of samples where `first` is strictly closer to `obs` than `second`.
pub fn percent_better(first: &[f64], second: &[f64], obs: &[f64]) -> Result<f64, MetricsError> {
    check_pair(first, obs)?;
    check_pair(second, obs)?;
    let better = first
        .iter()
        .zip(second)
        .zip(obs)
        .filter(|((a, b), o)| (*a - *o).abs() < (*b - *o).abs())
        .count();
    Ok(100.0 * better as f64 / obs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::regression::{OrdinaryLeastSquares, TheilSen};
    use crate::domain::metrics::METRIC_KEYS;

    const OBS: [f64; 8] = [-12.0, -25.0, -48.0, -90.0, -71.0, -40.0, -22.0, -8.0];

    #[test]
    fn test_identical_series_are_perfect() {
        let metrics = continuous_metrics(&OBS, &OBS, &OrdinaryLeastSquares).unwrap();
        assert_eq!(metrics.get(BIAS), Some(0.0));
        assert_eq!(metrics.get(MSE), Some(0.0));
        assert_eq!(metrics.get(PRED_EFF), Some(1.0));
        assert_eq!(metrics.get(SLOPE), Some(1.0));
        assert!(metrics.get(INTERCEPT).unwrap().abs() < 1e-12);
        assert!((metrics.get(PEARSON_R).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reports_every_key_in_order() {
        let model: Vec<f64> = OBS.iter().map(|v| v * 0.9 + 3.0).collect();
        let metrics = continuous_metrics(&model, &OBS, &OrdinaryLeastSquares).unwrap();
        let keys: Vec<_> = metrics.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, METRIC_KEYS.to_vec());
        assert!((metrics.get(SLOPE).unwrap() - 0.9).abs() < 1e-12);
        assert!((metrics.get(INTERCEPT).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_model_has_zero_slope() {
        let model = [-20.0; 8];
        let metrics = continuous_metrics(&model, &OBS, &OrdinaryLeastSquares).unwrap();
        assert!(metrics.get(SLOPE).unwrap().abs() < 1e-12);
        assert_eq!(metrics.get(PEARSON_R), Some(0.0));
    }

    #[test]
    fn test_bias_and_error_statistics() {
        let obs = [0.0, 10.0, 20.0, 30.0];
        let model = [2.0, 8.0, 24.0, 30.0];
        let metrics = continuous_metrics(&model, &obs, &OrdinaryLeastSquares).unwrap();
        assert_eq!(metrics.get(ME), Some(1.0));
        assert_eq!(metrics.get(BIAS), Some(1.0));
        assert_eq!(metrics.get(MAE), Some(2.0));
        assert_eq!(metrics.get(MDAE), Some(2.0));
        assert_eq!(metrics.get(MSE), Some(6.0));
        // climatological MSE is the population variance of obs: 125
        assert!((metrics.get(PRED_EFF).unwrap() - (1.0 - 6.0 / 125.0)).abs() < 1e-12);
    }

    #[test]
    fn test_climatology_forecast_has_zero_skill() {
        let clim = OBS.iter().sum::<f64>() / OBS.len() as f64;
        let model = [clim; 8];
        let metrics = continuous_metrics(&model, &OBS, &OrdinaryLeastSquares).unwrap();
        assert!(metrics.get(PRED_EFF).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert_eq!(
            continuous_metrics(&[1.0, 2.0], &[1.0], &OrdinaryLeastSquares).unwrap_err(),
            MetricsError::LengthMismatch {
                predicted: 2,
                observed: 1
            }
        );
        assert_eq!(
            continuous_metrics(&[], &[], &OrdinaryLeastSquares).unwrap_err(),
            MetricsError::Empty
        );
        assert_eq!(
            continuous_metrics(&[1.0, f64::NAN], &[1.0, 2.0], &OrdinaryLeastSquares).unwrap_err(),
            MetricsError::NonFinite { index: 1 }
        );
        assert_eq!(
            continuous_metrics(&[1.0, 2.0], &[5.0, 5.0], &OrdinaryLeastSquares).unwrap_err(),
            MetricsError::DegenerateRegression
        );
    }

    #[test]
    fn test_strategy_drives_fit() {
        let mut model: Vec<f64> = OBS.iter().map(|v| v * 1.1).collect();
        model[3] = 50.0;
        let robust = continuous_metrics(&model, &OBS, &TheilSen).unwrap();
        let ols = continuous_metrics(&model, &OBS, &OrdinaryLeastSquares).unwrap();
        assert!((robust.get(SLOPE).unwrap() - 1.1).abs() < 1e-9);
        assert_ne!(robust.get(SLOPE), ols.get(SLOPE));
        assert_eq!(robust.get(MSE), ols.get(MSE));
    }

    #[test]
    fn test_percent_better() {
        let obs = [0.0, 0.0, 0.0, 0.0];
        let first = [1.0, 1.0, 3.0, 2.0];
        let second = [2.0, 2.0, 1.0, 2.0];
        // first wins twice, loses once, ties once
        assert_eq!(percent_better(&first, &second, &obs).unwrap(), 50.0);
    }
}
