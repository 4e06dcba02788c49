//! Windowing strategies for recurrent sequence models.
//!
//! Cleaned records are turned into training batches and held-out evaluation
//! pairs by one of three strategies, all behind the [`BatchIterator`]
//! contract:
//!
//! - **Sequential**: chronological windows over one entity, chronological split
//! - **RandomSplit**: seeded Bernoulli split over all records, windows over
//!   the training partition
//! - **PerEntity**: single-step batches entity by entity, with a reset
//!   signal between entities
//!
//! # Architecture
//!
//! ```text
//! WindowIterator (tagged, selected by IteratorKind)
//!     ├── SequentialWindowIterator
//!     ├── RandomSplitIterator ──► SequentialWindowIterator (train partition)
//!     └── PerEntityBatchIterator
//!
//! every iterator owns one IteratorState (Ready → InProgress → EpochExhausted)
//! ```
//!
//! # Example
//!
//! ```
//! use rebate_dataset::preprocessing::FeatureRanges;
//! use rebate_dataset::sequence_builder::{BatchIterator, IteratorKind, WindowConfig, WindowIterator};
//! use rebate_dataset::Record;
//!
//! let records: Vec<Record> = (0..10)
//!     .map(|d| Record::new(2, 2017, d, vec![1.0], vec![d as f64]))
//!     .collect();
//! let ranges = FeatureRanges::from_records(&records);
//!
//! let config = WindowConfig::new(IteratorKind::Sequential, 3);
//! let mut iterator = WindowIterator::new(records.into(), ranges, &config, None).unwrap();
//!
//! while iterator.has_next() {
//!     if iterator.needs_reset() {
//!         // clear recurrent state
//!     }
//!     let batch = iterator.next_default().unwrap();
//!     assert_eq!(batch.steps(), 3);
//! }
//! ```

mod batch;
mod evaluation;
mod per_entity;
mod random_split;
mod sequential;
mod state;

pub use batch::Batch;
pub use evaluation::{EvalPair, EvaluationSet, EvaluationSummary};
pub use per_entity::PerEntityBatchIterator;
pub use random_split::{RandomSplitIterator, TEST_PROBABILITY};
pub use sequential::SequentialWindowIterator;
pub use state::{BatchIterator, IteratorPhase, IteratorState};

use crate::error::Result;
use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default batch size of every strategy.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default generator seed of the random split.
pub const DEFAULT_SEED: u64 = 1234;

/// Windowing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IteratorKind {
    /// Chronological windows over one entity
    #[default]
    Sequential,

    /// Seeded Bernoulli split over all records
    RandomSplit,

    /// Single-step batches entity by entity
    PerEntity,
}

impl IteratorKind {
    /// Short name used in logs and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            IteratorKind::Sequential => "sequential",
            IteratorKind::RandomSplit => "random_split",
            IteratorKind::PerEntity => "per_entity",
        }
    }

    /// Time steps per example.
    ///
    /// Per-entity batches always use a single step.
    pub fn steps(&self, input_days: usize) -> usize {
        match self {
            IteratorKind::PerEntity => 1,
            _ => input_days,
        }
    }
}

/// Windowing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Strategy
    pub kind: IteratorKind,

    /// Days per input window
    ///
    /// Ignored by [`IteratorKind::PerEntity`], which always uses one step.
    pub input_days: usize,

    /// Fraction of records used for training (chronological strategies)
    pub split_ratio: f64,

    /// Examples per batch when the caller does not request a size
    pub batch_size: usize,

    /// Seed of the random split generator
    pub seed: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            kind: IteratorKind::Sequential,
            input_days: 22,
            split_ratio: 0.9,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl WindowConfig {
    /// Create a configuration for a strategy and window length.
    pub fn new(kind: IteratorKind, input_days: usize) -> Self {
        Self {
            kind,
            input_days,
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_days == 0 {
            return Err("input_days must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.split_ratio) {
            return Err(format!(
                "split_ratio must be in [0, 1], got {}",
                self.split_ratio
            ));
        }
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        Ok(())
    }

    /// Time steps per example for the configured strategy.
    pub fn steps(&self) -> usize {
        self.kind.steps(self.input_days)
    }
}

/// Any of the three strategies, selected at construction.
#[derive(Debug, Clone)]
pub enum WindowIterator {
    /// Chronological windows
    Sequential(SequentialWindowIterator),

    /// Random split windows
    RandomSplit(RandomSplitIterator),

    /// Per-entity single-step batches
    PerEntity(PerEntityBatchIterator),
}

impl WindowIterator {
    /// Build the iterator selected by `config.kind`.
    ///
    /// `filter_id` only affects the per-entity evaluation set.
    pub fn new(
        records: Arc<[Record]>,
        ranges: FeatureRanges,
        config: &WindowConfig,
        filter_id: Option<u32>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(crate::error::DatasetError::InvalidConfig)?;

        Ok(match config.kind {
            IteratorKind::Sequential => {
                Self::Sequential(SequentialWindowIterator::new(records, ranges, config)?)
            }
            IteratorKind::RandomSplit => {
                Self::RandomSplit(RandomSplitIterator::new(&records, ranges, config)?)
            }
            IteratorKind::PerEntity => Self::PerEntity(PerEntityBatchIterator::new(
                records, ranges, config, filter_id,
            )?),
        })
    }

    /// Strategy of this iterator.
    pub fn kind(&self) -> IteratorKind {
        match self {
            Self::Sequential(_) => IteratorKind::Sequential,
            Self::RandomSplit(_) => IteratorKind::RandomSplit,
            Self::PerEntity(_) => IteratorKind::PerEntity,
        }
    }

    /// Held-out evaluation pairs.
    pub fn evaluation_set(&self) -> EvaluationSet {
        match self {
            Self::Sequential(it) => it.evaluation_set(),
            Self::RandomSplit(it) => it.evaluation_set(),
            Self::PerEntity(it) => it.evaluation_set(),
        }
    }

    /// Example offsets within one epoch at which recurrent state must be
    /// cleared.
    pub fn reset_points(&self) -> Vec<usize> {
        match self {
            Self::PerEntity(it) => it.reset_points(),
            _ => vec![0],
        }
    }

    fn inner(&self) -> &dyn BatchIterator {
        match self {
            Self::Sequential(it) => it,
            Self::RandomSplit(it) => it,
            Self::PerEntity(it) => it,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn BatchIterator {
        match self {
            Self::Sequential(it) => it,
            Self::RandomSplit(it) => it,
            Self::PerEntity(it) => it,
        }
    }
}

impl BatchIterator for WindowIterator {
    fn has_next(&self) -> bool {
        self.inner().has_next()
    }

    fn next_batch(&mut self, requested: usize) -> Result<Batch> {
        self.inner_mut().next_batch(requested)
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn needs_reset(&self) -> bool {
        self.inner().needs_reset()
    }

    fn total_examples(&self) -> usize {
        self.inner().total_examples()
    }

    fn input_width(&self) -> usize {
        self.inner().input_width()
    }

    fn target_width(&self) -> usize {
        self.inner().target_width()
    }

    fn preferred_batch_size(&self) -> usize {
        self.inner().preferred_batch_size()
    }

    fn state(&self) -> &IteratorState {
        self.inner().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;

    fn records(n: i64) -> Arc<[Record]> {
        (0..n)
            .map(|d| Record::new(2, 2017, d, vec![1.0], vec![d as f64]))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_dispatch_by_kind() {
        let records = records(40);
        let ranges = FeatureRanges::from_records(&records);

        for kind in [
            IteratorKind::Sequential,
            IteratorKind::RandomSplit,
            IteratorKind::PerEntity,
        ] {
            let config = WindowConfig::new(kind, 3);
            let it = WindowIterator::new(records.clone(), ranges.clone(), &config, None).unwrap();
            assert_eq!(it.kind(), kind);
            assert_eq!(it.input_width(), 4);
            assert_eq!(it.target_width(), 1);
            assert_eq!(it.preferred_batch_size(), DEFAULT_BATCH_SIZE);
        }
    }

    #[test]
    fn test_epoch_sum_matches_total_for_every_kind() {
        let records = records(40);
        let ranges = FeatureRanges::from_records(&records);

        for kind in [
            IteratorKind::Sequential,
            IteratorKind::RandomSplit,
            IteratorKind::PerEntity,
        ] {
            let mut config = WindowConfig::new(kind, 3);
            config.batch_size = 5;
            let mut it = WindowIterator::new(records.clone(), ranges.clone(), &config, None).unwrap();
            let mut sum = 0;
            while it.has_next() {
                let batch = it.next_default().unwrap();
                assert_eq!(batch.steps(), config.steps());
                sum += batch.size();
            }
            assert_eq!(sum, it.total_examples(), "{}", kind.name());
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let records = records(10);
        let ranges = FeatureRanges::from_records(&records);
        let config = WindowConfig {
            split_ratio: 1.5,
            ..WindowConfig::default()
        };
        assert!(matches!(
            WindowIterator::new(records, ranges, &config, None),
            Err(DatasetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&IteratorKind::RandomSplit).unwrap();
        assert_eq!(json, "\"random_split\"");
        assert_eq!(IteratorKind::PerEntity.steps(22), 1);
        assert_eq!(IteratorKind::Sequential.steps(22), 22);
    }
}
