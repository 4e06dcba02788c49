//! Min-max normalization of record columns.
//!
//! Every model input column and every target column has a [`FeatureRange`]
//! computed during ingestion. Values are scaled into `[0, 1]` with:
//!
//! ```text
//! normalized = (value - min) / (max - min)
//! ```
//!
//! and converted back with the exact inverse:
//!
//! ```text
//! value = normalized * (max - min) + min
//! ```
//!
//! # Degenerate Ranges
//!
//! A column whose values are all equal (`min == max`) would divide by zero.
//! Such a range is kept as observed and scaled with one fixed rule:
//!
//! - `normalize(v)` returns `0.0` for every `v`
//! - `denormalize(v)` returns `min` for every `v`
//!
//! # Architecture
//!
//! ```text
//! Normalizer (trait)
//!     └── MinMaxScaler (built from a FeatureRange)
//!
//! FeatureRanges
//!     ├── inputs:  [entity, year, day, features...]
//!     └── targets: [sales...]
//! ```

use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Trait for reversible value scaling.
pub trait Normalizer: Send + Sync {
    /// Normalize a single value.
    fn normalize(&self, value: f64) -> f64;

    /// Convert a normalized value back to the original units.
    fn denormalize(&self, value: f64) -> f64;

    /// Normalize a batch of values.
    fn normalize_batch(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.normalize(v)).collect()
    }

    /// Denormalize a batch of values.
    fn denormalize_batch(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.denormalize(v)).collect()
    }
}

/// Observed `(min, max)` extent of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    /// Smallest observed value
    pub min: f64,

    /// Largest observed value
    pub max: f64,
}

impl FeatureRange {
    /// Create a range from explicit bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// An empty range that any observed value will replace.
    pub fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Widen the range to include `value`.
    #[inline]
    pub fn observe(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// True when no value has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// True when scaling would divide by zero.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// `max - min`.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `value` lies inside the range (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Min-max scale `value` into this range.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }

    /// Exact inverse of [`FeatureRange::normalize`].
    #[inline]
    pub fn denormalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return self.min;
        }
        value * (self.max - self.min) + self.min
    }
}

impl Default for FeatureRange {
    fn default() -> Self {
        Self::empty()
    }
}

/// Min-max scaler bound to one column's range.
///
/// # Example
///
/// ```
/// use rebate_dataset::preprocessing::{FeatureRange, MinMaxScaler, Normalizer};
///
/// let scaler = MinMaxScaler::new(FeatureRange::new(0.0, 100.0));
///
/// assert_eq!(scaler.normalize(0.0), 0.0);
/// assert_eq!(scaler.normalize(50.0), 0.5);
/// assert_eq!(scaler.denormalize(1.0), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    range: FeatureRange,
}

impl MinMaxScaler {
    /// Create a scaler for a range.
    pub fn new(range: FeatureRange) -> Self {
        Self { range }
    }

    /// The underlying range.
    pub fn range(&self) -> FeatureRange {
        self.range
    }
}

impl Normalizer for MinMaxScaler {
    fn normalize(&self, value: f64) -> f64 {
        self.range.normalize(value)
    }

    fn denormalize(&self, value: f64) -> f64 {
        self.range.denormalize(value)
    }
}

/// Ranges of every model input column and every target column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureRanges {
    /// Ranges of `[entity, year, day, features...]`
    pub inputs: Vec<FeatureRange>,

    /// Ranges of the target columns
    pub targets: Vec<FeatureRange>,
}

impl FeatureRanges {
    /// Empty ranges for the given column counts.
    pub fn with_widths(input_width: usize, target_width: usize) -> Self {
        Self {
            inputs: vec![FeatureRange::empty(); input_width],
            targets: vec![FeatureRange::empty(); target_width],
        }
    }

    /// Compute ranges over a set of records.
    ///
    /// Ingestion computes ranges over every cleaned record. Use this to
    /// recompute them over a training partition only.
    pub fn from_records(records: &[Record]) -> Self {
        let (input_width, target_width) = records
            .first()
            .map(|r| (r.input_width(), r.targets.len()))
            .unwrap_or((0, 0));

        let mut ranges = Self::with_widths(input_width, target_width);
        for record in records {
            ranges.observe(record);
        }
        ranges
    }

    /// Widen every column range with one record's values.
    pub fn observe(&mut self, record: &Record) {
        for (column, range) in self.inputs.iter_mut().enumerate() {
            range.observe(record.input_value(column));
        }
        for (range, &value) in self.targets.iter_mut().zip(&record.targets) {
            range.observe(value);
        }
    }

    /// Normalized model input vector of a record.
    pub fn normalize_input(&self, record: &Record) -> Vec<f64> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(column, range)| range.normalize(record.input_value(column)))
            .collect()
    }

    /// Normalized target vector of a record.
    pub fn normalize_targets(&self, record: &Record) -> Vec<f64> {
        self.targets
            .iter()
            .zip(&record.targets)
            .map(|(range, &value)| range.normalize(value))
            .collect()
    }

    /// Convert one model output back into target units.
    ///
    /// Returns `None` when `target` is not a target column.
    pub fn denormalize_target(&self, target: usize, value: f64) -> Option<f64> {
        self.targets.get(target).map(|range| range.denormalize(value))
    }

    /// Scaler for one target column.
    pub fn target_scaler(&self, target: usize) -> MinMaxScaler {
        MinMaxScaler::new(self.targets[target])
    }

    /// Indices of input columns whose range is degenerate.
    pub fn degenerate_inputs(&self) -> Vec<usize> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_degenerate())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_basic() {
        let scaler = MinMaxScaler::new(FeatureRange::new(0.0, 100.0));

        assert_eq!(scaler.normalize(0.0), 0.0);
        assert_eq!(scaler.normalize(50.0), 0.5);
        assert_eq!(scaler.normalize(100.0), 1.0);

        // No clamping: values outside the range extrapolate
        assert_eq!(scaler.normalize(150.0), 1.5);
    }

    #[test]
    fn test_denormalize_inverts_normalize() {
        let range = FeatureRange::new(-3.5, 812.25);
        for &x in &[-3.5, 0.0, 1.0, 17.125, 812.25, 1000.0] {
            let back = range.normalize(range.denormalize(x));
            assert!((back - x).abs() < 1e-9, "x={x} back={back}");
            let back = range.denormalize(range.normalize(x));
            assert!((back - x).abs() < 1e-9, "x={x} back={back}");
        }
    }

    #[test]
    fn test_degenerate_range() {
        let range = FeatureRange::new(7.0, 7.0);
        assert!(range.is_degenerate());
        assert_eq!(range.normalize(7.0), 0.0);
        assert_eq!(range.normalize(100.0), 0.0);
        assert_eq!(range.denormalize(0.0), 7.0);
        assert_eq!(range.denormalize(0.9), 7.0);
        assert!(range.normalize(7.0).is_finite());
    }

    #[test]
    fn test_range_observe() {
        let mut range = FeatureRange::empty();
        assert!(range.is_empty());

        range.observe(5.0);
        assert!(range.is_degenerate());

        range.observe(-2.0);
        range.observe(9.0);
        assert_eq!(range, FeatureRange::new(-2.0, 9.0));
        assert!(range.contains(0.0));
        assert!(!range.contains(9.5));
        assert_eq!(range.span(), 11.0);
    }

    #[test]
    fn test_feature_ranges_from_records() {
        let records = vec![
            Record::new(2, 2017, 100, vec![10.0], vec![5.0]),
            Record::new(2, 2017, 101, vec![30.0], vec![15.0]),
            Record::new(3, 2018, 102, vec![20.0], vec![10.0]),
        ];
        let ranges = FeatureRanges::from_records(&records);

        assert_eq!(ranges.inputs.len(), 4);
        assert_eq!(ranges.targets.len(), 1);
        assert_eq!(ranges.inputs[0], FeatureRange::new(2.0, 3.0));
        assert_eq!(ranges.inputs[2], FeatureRange::new(100.0, 102.0));
        assert_eq!(ranges.inputs[3], FeatureRange::new(10.0, 30.0));
        assert_eq!(ranges.targets[0], FeatureRange::new(5.0, 15.0));

        let normalized = ranges.normalize_input(&records[1]);
        assert_eq!(normalized, vec![0.0, 0.0, 0.5, 1.0]);
        assert_eq!(ranges.normalize_targets(&records[2]), vec![0.5]);
        assert_eq!(ranges.denormalize_target(0, 0.5), Some(10.0));
        assert_eq!(ranges.denormalize_target(ranges.targets.len(), 0.5), None);
    }

    #[test]
    fn test_degenerate_inputs_reported() {
        let records = vec![
            Record::new(2, 2017, 100, vec![10.0], vec![5.0]),
            Record::new(2, 2017, 101, vec![10.0], vec![6.0]),
        ];
        let ranges = FeatureRanges::from_records(&records);
        assert_eq!(ranges.degenerate_inputs(), vec![0, 1, 3]);
        assert_eq!(ranges.normalize_input(&records[0]), vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scaler_batch() {
        let scaler = MinMaxScaler::new(FeatureRange::new(0.0, 10.0));
        assert_eq!(scaler.normalize_batch(&[0.0, 5.0, 10.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaler.denormalize_batch(&[0.0, 0.5]), vec![0.0, 5.0]);
    }
}
