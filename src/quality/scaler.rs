//! Quality-indicator normalization.

use serde::{Deserialize, Serialize};

use crate::core::errors::{RecommendError, RecommendResult};
use crate::core::report::INDICATOR_COUNT;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FittedMoments {
    means: [f64; INDICATOR_COUNT],
    stds: [f64; INDICATOR_COUNT],
}

/// Standardizing scorer for the boolean quality indicators.
///
/// `fit` learns per-indicator mean and population standard deviation over
/// the whole corpus; `score` collapses a row's indicators into one scalar,
/// the sum of its standardized values. A constant indicator column has zero
/// variance and contributes `0.0` for every row instead of dividing by zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    fitted: Option<FittedMoments>,
}

impl StandardScaler {
    /// Create an unfitted scaler.
    #[must_use]
    pub const fn new() -> Self {
        Self { fitted: None }
    }

    /// True once `fit` has run.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit the per-indicator moments over all corpus rows.
    #[allow(clippy::cast_precision_loss)] // row counts stay far below 2^52
    pub fn fit(&mut self, rows: &[[f64; INDICATOR_COUNT]]) {
        let mut means = [0.0; INDICATOR_COUNT];
        let mut stds = [0.0; INDICATOR_COUNT];

        if !rows.is_empty() {
            let count = rows.len() as f64;
            for row in rows {
                for (mean, value) in means.iter_mut().zip(row) {
                    *mean += value;
                }
            }
            for mean in &mut means {
                *mean /= count;
            }

            for row in rows {
                for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                    let delta = value - mean;
                    *std += delta * delta;
                }
            }
            for std in &mut stds {
                *std = (*std / count).sqrt();
            }
        }

        self.fitted = Some(FittedMoments { means, stds });
    }

    /// Score one indicator row against the fitted moments.
    ///
    /// # Errors
    /// Returns `NotFitted` if called before `fit`.
    pub fn score(&self, indicators: &[f64; INDICATOR_COUNT]) -> RecommendResult<f64> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(RecommendError::NotFitted("quality scaler"))?;

        let mut total = 0.0;
        for ((value, mean), std) in indicators.iter().zip(&fitted.means).zip(&fitted.stds) {
            if *std > 0.0 {
                total += (value - mean) / std;
            }
        }
        Ok(total)
    }

    /// Score every row, preserving input order.
    ///
    /// # Errors
    /// Returns `NotFitted` if called before `fit`.
    pub fn score_all(&self, rows: &[[f64; INDICATOR_COUNT]]) -> RecommendResult<Vec<f64>> {
        rows.iter().map(|row| self.score(row)).collect()
    }
}
