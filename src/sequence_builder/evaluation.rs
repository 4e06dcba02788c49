//! Held-out evaluation pairs.

use crate::preprocessing::{FeatureRange, FeatureRanges};
use crate::record::Record;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One held-out example: a normalized input window and the raw target.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalPair {
    /// Entity of the target record
    pub entity_id: u32,

    /// Day of the target record
    pub day: i64,

    /// Normalized inputs, shape `[steps, input_width]`
    pub input: Array2<f64>,

    /// Target values in original units
    pub target: Vec<f64>,
}

impl EvalPair {
    /// Number of input time steps.
    pub fn steps(&self) -> usize {
        self.input.nrows()
    }
}

/// Ordered held-out pairs together with their denormalization metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationSet {
    /// Pairs in chronological order per entity
    pub pairs: Vec<EvalPair>,

    /// Input steps per pair
    pub input_days: usize,

    /// Ranges converting model output back into target units
    pub target_ranges: Vec<FeatureRange>,
}

/// Serializable summary of an evaluation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Number of pairs
    pub pairs: usize,

    /// Input steps per pair
    pub input_days: usize,

    /// Distinct entities covered
    pub entities: Vec<u32>,
}

impl EvaluationSet {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Raw targets of one target column, in pair order.
    ///
    /// Pairs without that column are skipped.
    pub fn actuals(&self, target: usize) -> Vec<f64> {
        self.pairs
            .iter()
            .filter_map(|p| p.target.get(target).copied())
            .collect()
    }

    /// Convert a normalized model output into target units.
    ///
    /// Returns `None` when `target` is not a target column.
    pub fn denormalize(&self, target: usize, value: f64) -> Option<f64> {
        self.target_ranges
            .get(target)
            .map(|range| range.denormalize(value))
    }

    /// True when every pair targets the day after the previous pair of the
    /// same entity.
    pub fn is_contiguous(&self) -> bool {
        self.pairs
            .windows(2)
            .all(|w| w[0].entity_id == w[1].entity_id && w[1].day == w[0].day + 1)
    }

    /// Short description for logs and metadata.
    pub fn summary(&self) -> EvaluationSummary {
        let mut entities: Vec<u32> = self.pairs.iter().map(|p| p.entity_id).collect();
        entities.dedup();
        EvaluationSummary {
            pairs: self.pairs.len(),
            input_days: self.input_days,
            entities,
        }
    }
}

fn normalized_window(records: &[Record], ranges: &FeatureRanges) -> Array2<f64> {
    let mut input = Array2::<f64>::zeros((records.len(), ranges.inputs.len()));
    for (step, record) in records.iter().enumerate() {
        for (column, value) in ranges.normalize_input(record).into_iter().enumerate() {
            input[[step, column]] = value;
        }
    }
    input
}

/// Pairs whose input is the `input_days` records before each target.
///
/// Every record from index `input_days` on becomes one target.
pub(crate) fn window_pairs(
    records: &[Record],
    ranges: &FeatureRanges,
    input_days: usize,
) -> Vec<EvalPair> {
    if records.len() <= input_days {
        return Vec::new();
    }

    (input_days..records.len())
        .map(|target| {
            let record = &records[target];
            EvalPair {
                entity_id: record.entity_id,
                day: record.day,
                input: normalized_window(&records[target - input_days..target], ranges),
                target: record.targets.clone(),
            }
        })
        .collect()
}

/// Single-step pairs whose input is the target record itself.
pub(crate) fn single_step_pairs(records: &[Record], ranges: &FeatureRanges) -> Vec<EvalPair> {
    records
        .iter()
        .map(|record| EvalPair {
            entity_id: record.entity_id,
            day: record.day,
            input: normalized_window(std::slice::from_ref(record), ranges),
            target: record.targets.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: i64) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(2, 2017, i, vec![1.0], vec![i as f64 * 3.0]))
            .collect()
    }

    #[test]
    fn test_window_pairs() {
        let records = records(6);
        let ranges = FeatureRanges::from_records(&records);
        let pairs = window_pairs(&records, &ranges, 2);

        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0].day, 2);
        assert_eq!(pairs[0].steps(), 2);
        assert_eq!(pairs[0].target, vec![6.0]);
        assert_eq!(pairs[3].target, vec![15.0]);
        // Input step 1 of the first pair is day 1
        assert_eq!(pairs[0].input[[1, 2]], 0.2);
    }

    #[test]
    fn test_window_pairs_too_short() {
        let records = records(2);
        let ranges = FeatureRanges::from_records(&records);
        assert!(window_pairs(&records, &ranges, 2).is_empty());
    }

    #[test]
    fn test_single_step_pairs_and_summary() {
        let records = records(3);
        let ranges = FeatureRanges::from_records(&records);
        let set = EvaluationSet {
            pairs: single_step_pairs(&records, &ranges),
            input_days: 1,
            target_ranges: ranges.targets.clone(),
        };

        assert_eq!(set.len(), 3);
        assert_eq!(set.actuals(0), vec![0.0, 3.0, 6.0]);
        assert_eq!(set.denormalize(0, 0.5), Some(3.0));
        assert_eq!(set.denormalize(1, 0.5), None);

        let summary = set.summary();
        assert_eq!(summary.pairs, 3);
        assert_eq!(summary.entities, vec![2]);
    }

    #[test]
    fn test_contiguity() {
        let records = records(5);
        let ranges = FeatureRanges::from_records(&records);
        let mut set = EvaluationSet {
            pairs: single_step_pairs(&records, &ranges),
            input_days: 1,
            target_ranges: ranges.targets.clone(),
        };
        assert!(set.is_contiguous());

        set.pairs.remove(2);
        assert!(!set.is_contiguous());

        let mut other_entity = single_step_pairs(&records[..2], &ranges);
        other_entity[1].entity_id = 3;
        set.pairs = other_entity;
        assert!(!set.is_contiguous());
    }
}
