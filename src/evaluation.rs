//! Post-processing of model output on the evaluation set.
//!
//! A trained model returns one normalized prediction per input step of every
//! evaluation pair. This module converts those outputs back into target
//! units and reduces them to one prediction per pair, either by taking the
//! last step or by averaging the overlapping predictions of consecutive
//! windows with a [`SlidingWindowAverager`](crate::preprocessing::SlidingWindowAverager).
//!
//! # Example
//!
//! ```
//! use rebate_dataset::evaluation::{evaluate, PredictionMode};
//! use rebate_dataset::preprocessing::FeatureRange;
//! use rebate_dataset::sequence_builder::{EvalPair, EvaluationSet};
//! use ndarray::Array2;
//!
//! let set = EvaluationSet {
//!     pairs: vec![EvalPair {
//!         entity_id: 2,
//!         day: 10,
//!         input: Array2::zeros((1, 4)),
//!         target: vec![50.0],
//!     }],
//!     input_days: 1,
//!     target_ranges: vec![FeatureRange::new(0.0, 100.0)],
//! };
//!
//! let report = evaluate(&set, &[vec![0.4]], 0, PredictionMode::LastStep).unwrap();
//! assert_eq!(report.predicted, vec![40.0]);
//! assert_eq!(report.mae, 10.0);
//! ```

use crate::error::{DatasetError, Result};
use crate::preprocessing::smooth_predictions;
use crate::sequence_builder::EvaluationSet;
use serde::{Deserialize, Serialize};

/// How per-step predictions are reduced to one value per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Use the prediction of the last input step
    #[default]
    LastStep,

    /// Average the predictions every overlapping window made for a day.
    ///
    /// Only meaningful when consecutive pairs target consecutive days of one
    /// entity (sequential evaluation sets, or a per-entity set restricted to
    /// one entity). Random-split sets are rejected.
    Averaged,
}

/// Predicted and actual series of one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Predictions in target units, one per pair
    pub predicted: Vec<f64>,

    /// Actual values, one per pair
    pub actual: Vec<f64>,

    /// Mean absolute error
    pub mae: f64,

    /// Root mean squared error
    pub rmse: f64,
}

impl EvaluationReport {
    /// Build a report from aligned series.
    pub fn from_series(predicted: Vec<f64>, actual: Vec<f64>) -> Self {
        let n = predicted.len().min(actual.len());
        let (mae, rmse) = if n == 0 {
            (0.0, 0.0)
        } else {
            let (abs, sq) = predicted
                .iter()
                .zip(&actual)
                .fold((0.0, 0.0), |(abs, sq), (p, a)| {
                    let err = p - a;
                    (abs + err.abs(), sq + err * err)
                });
            (abs / n as f64, (sq / n as f64).sqrt())
        };

        Self {
            predicted,
            actual,
            mae,
            rmse,
        }
    }

    /// Number of evaluated pairs.
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    /// True when nothing was evaluated.
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// Evaluate normalized model output against an evaluation set.
///
/// `predictions[i][j]` is the normalized output for target column `target`
/// of pair `i` at input step `j`.
///
/// # Errors
///
/// [`DatasetError::InvalidConfig`] if the prediction count does not match
/// the pair count, a pair has no predictions, `target` is out of range, or
/// `mode` is [`PredictionMode::Averaged`] and the pairs are not consecutive
/// days of one entity.
pub fn evaluate(
    set: &EvaluationSet,
    predictions: &[Vec<f64>],
    target: usize,
    mode: PredictionMode,
) -> Result<EvaluationReport> {
    if predictions.len() != set.len() {
        return Err(DatasetError::InvalidConfig(format!(
            "{} predictions for {} evaluation pairs",
            predictions.len(),
            set.len()
        )));
    }
    let range = set.target_ranges.get(target).ok_or_else(|| {
        DatasetError::InvalidConfig(format!(
            "target column {} out of range ({} targets)",
            target,
            set.target_ranges.len()
        ))
    })?;
    if let Some(index) = predictions.iter().position(Vec::is_empty) {
        return Err(DatasetError::InvalidConfig(format!(
            "evaluation pair {} has no predictions",
            index
        )));
    }

    if mode == PredictionMode::Averaged && !set.is_contiguous() {
        return Err(DatasetError::InvalidConfig(
            "averaged predictions need consecutive days of one entity".to_string(),
        ));
    }

    let denormalized: Vec<Vec<f64>> = predictions
        .iter()
        .map(|steps| steps.iter().map(|&v| range.denormalize(v)).collect())
        .collect();

    let predicted = match mode {
        PredictionMode::LastStep => denormalized
            .iter()
            .filter_map(|steps| steps.last().copied())
            .collect(),
        PredictionMode::Averaged => smooth_predictions(&denormalized, set.input_days.max(1)),
    };

    let report = EvaluationReport::from_series(predicted, set.actuals(target));
    log::info!(
        "Evaluated {} pairs ({:?}): MAE {:.4}, RMSE {:.4}",
        report.len(),
        mode,
        report.mae,
        report.rmse
    );
    Ok(report)
}
