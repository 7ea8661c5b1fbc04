// Alignment of model and observed series onto a common base
use crate::domain::series::TimeSeries;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error(
        "model has {model} samples but observations have {obs}; \
         use the 'truncate' or 'match-times' alignment policy to compare anyway"
    )]
    LengthMismatch { model: usize, obs: usize },
    #[error("no samples remain after alignment")]
    Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentPolicy {
    /// Lengths must already agree
    #[default]
    Strict,
    /// Cut both series to the shorter length
    Truncate,
    /// Keep only timestamps present in both series
    MatchTimes,
}

/// Model and observed series over the same samples.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    pub model: TimeSeries,
    pub obs: TimeSeries,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }
}

pub fn align(model: &TimeSeries, obs: &TimeSeries, policy: AlignmentPolicy) -> Result<AlignedPair, AlignmentError> {
    let pair = match policy {
        AlignmentPolicy::Strict => {
            if model.len() != obs.len() {
                return Err(AlignmentError::LengthMismatch {
                    model: model.len(),
                    obs: obs.len(),
                });
            }
            AlignedPair {
                model: model.clone(),
                obs: obs.clone(),
            }
        }
        AlignmentPolicy::Truncate => {
            let len = model.len().min(obs.len());
            let dropped = model.len().max(obs.len()) - len;
            if dropped > 0 {
                tracing::warn!(
                    "Truncating '{}' ({} samples) and '{}' ({} samples) to {} samples; {} dropped",
                    model.name(),
                    model.len(),
                    obs.name(),
                    obs.len(),
                    len,
                    dropped
                );
            }
            let mut model = model.clone();
            let mut obs = obs.clone();
            model.truncate(len);
            obs.truncate(len);
            AlignedPair { model, obs }
        }
        AlignmentPolicy::MatchTimes => match_times(model, obs),
    };

    if pair.is_empty() {
        return Err(AlignmentError::Empty);
    }

    tracing::debug!(
        "Aligned '{}' against '{}' with {:?} policy: {} samples",
        pair.model.name(),
        pair.obs.name(),
        policy,
        pair.len()
    );
    Ok(pair)
}

fn match_times(model: &TimeSeries, obs: &TimeSeries) -> AlignedPair {
    let model_times: HashSet<_> = model.points().iter().map(|p| p.time).collect();
    let obs_times: HashSet<_> = obs.points().iter().map(|p| p.time).collect();

    let keep = |series: &TimeSeries, other: &HashSet<_>| {
        let points = series
            .points()
            .iter()
            .filter(|p| other.contains(&p.time))
            .copied()
            .collect();
        // a filtered subsequence of an increasing series is still increasing
        TimeSeries::new(series.name(), points).unwrap_or_else(|_| series.clone())
    };

    let matched_model = keep(model, &obs_times);
    let matched_obs = keep(obs, &model_times);

    tracing::info!(
        "Matched {} timestamps ({} model and {} observed samples unmatched)",
        matched_obs.len(),
        model.len() - matched_model.len(),
        obs.len() - matched_obs.len()
    );

    AlignedPair {
        model: matched_model,
        obs: matched_obs,
    }
}
