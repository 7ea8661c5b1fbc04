// Threshold-based categorical verification
use crate::domain::contingency::ContingencyTable;
use crate::domain::metrics::MetricsError;
use crate::domain::sweep::{ThresholdRow, ThresholdSweepTable};

/// Build the 2x2 table for events defined as `value <= threshold`.
pub fn contingency_from_threshold(
    predicted: &[f64],
    observed: &[f64],
    threshold: f64,
) -> Result<ContingencyTable, MetricsError> {
    if predicted.len() != observed.len() {
        return Err(MetricsError::LengthMismatch {
            predicted: predicted.len(),
            observed: observed.len(),
        });
    }
    Ok(ContingencyTable::from_events(
        predicted.iter().map(|&v| v <= threshold),
        observed.iter().map(|&v| v <= threshold),
    ))
}

pub fn sweep_thresholds(
    predicted: &[f64],
    observed: &[f64],
    thresholds: &[f64],
) -> Result<ThresholdSweepTable, MetricsError> {
    let rows = thresholds
        .iter()
        .map(|&threshold| {
            let table = contingency_from_threshold(predicted, observed, threshold)?;
            Ok(ThresholdRow::from_table(threshold, &table))
        })
        .collect::<Result<Vec<_>, MetricsError>>()?;

    tracing::debug!("Swept {} thresholds over {} samples", rows.len(), observed.len());
    Ok(ThresholdSweepTable::new(rows))
}

/// Upper bound on the number of thresholds in one sweep.
pub const MAX_THRESHOLDS: usize = 100_000;

/// Half-open range `start, start + step, ...` stopping before `stop`.
pub fn threshold_range(start: f64, stop: f64, step: f64) -> anyhow::Result<Vec<f64>> {
    if step == 0.0 || !step.is_finite() {
        anyhow::bail!("threshold step must be a non-zero finite number, got {}", step);
    }
    let count = ((stop - start) / step).ceil();
    if count.is_nan() || count <= 0.0 {
        return Ok(Vec::new());
    }
    if count > MAX_THRESHOLDS as f64 {
        anyhow::bail!(
            "threshold range {}..{} step {} yields more than {} thresholds",
            start,
            stop,
            step,
            MAX_THRESHOLDS
        );
    }
    Ok((0..count as usize).map(|i| start + step * i as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBS: [f64; 4] = [-50.0, -60.0, -70.0, -80.0];
    const MODEL: [f64; 4] = [-48.0, -65.0, -72.0, -75.0];

    #[test]
    fn test_worked_example() {
        let table = contingency_from_threshold(&MODEL, &OBS, -70.0).unwrap();
        assert_eq!(table, ContingencyTable::new(2, 0, 0, 2));

        let row = ThresholdRow::from_table(-70.0, &table);
        assert_eq!(row.scores.pod, 1.0);
        assert_eq!(row.scores.pofd, 0.0);
        assert_eq!(row.scores.proportion_correct, 1.0);
        assert_eq!(row.n_predict, 2);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let err = contingency_from_threshold(&MODEL, &OBS[..3], -70.0).unwrap_err();
        assert_eq!(
            err,
            MetricsError::LengthMismatch {
                predicted: 4,
                observed: 3
            }
        );
    }

    #[test]
    fn test_sweep_counts_and_monotonicity() {
        let observed: Vec<f64> = (0..200).map(|i| ((i as f64) * 0.37).sin() * 60.0 - 30.0).collect();
        let predicted: Vec<f64> = observed
            .iter()
            .enumerate()
            .map(|(i, v)| v + ((i as f64) * 1.3).cos() * 15.0)
            .collect();
        let thresholds = threshold_range(-100.0, 10.0, 1.0).unwrap();

        let sweep = sweep_thresholds(&predicted, &observed, &thresholds).unwrap();
        assert_eq!(sweep.thresholds(), thresholds);

        for &threshold in &thresholds {
            let table = contingency_from_threshold(&predicted, &observed, threshold).unwrap();
            assert_eq!(table.total(), observed.len() as u64);
            let pod = crate::domain::contingency::categorical_scores(&table).pod;
            if table.observed_events() > 0 {
                assert!((0.0..=1.0).contains(&pod));
            } else {
                assert!(pod.is_nan());
            }
        }

        let counts: Vec<u64> = sweep.rows().iter().map(|r| r.n_predict).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_threshold_range_matches_half_open_semantics() {
        let range = threshold_range(-100.0, 10.0, 1.0).unwrap();
        assert_eq!(range.len(), 110);
        assert_eq!(range[0], -100.0);
        assert_eq!(range[109], 9.0);

        assert_eq!(threshold_range(0.0, -3.0, -1.0).unwrap(), vec![0.0, -1.0, -2.0]);
        assert!(threshold_range(5.0, 0.0, 1.0).unwrap().is_empty());
        assert!(threshold_range(0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_threshold_range_rejects_oversized_sweep() {
        let err = threshold_range(-100.0, 10.0, 1e-18).unwrap_err();
        assert!(err.to_string().contains("more than"));
        assert!(threshold_range(f64::NEG_INFINITY, 10.0, 1.0).is_err());
        assert_eq!(threshold_range(0.0, MAX_THRESHOLDS as f64, 1.0).unwrap().len(), MAX_THRESHOLDS);
    }
}
