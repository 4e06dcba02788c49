//! Bernoulli train/test split across the whole record set.
//!
//! Every record is independently assigned to the test partition with
//! probability 0.5, in record order, using a seeded generator. Training then
//! walks chronological windows over the training partition exactly like
//! [`SequentialWindowIterator`]; evaluation pairs are windows over the test
//! partition.
//!
//! The generator is injectable so tests can fix partition membership.

use super::batch::Batch;
use super::evaluation::{window_pairs, EvaluationSet};
use super::sequential::SequentialWindowIterator;
use super::state::{BatchIterator, IteratorState};
use super::WindowConfig;
use crate::error::{DatasetError, Result};
use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Probability of a record landing in the test partition.
pub const TEST_PROBABILITY: f64 = 0.5;

/// Iterator over windows of a randomly selected training partition.
#[derive(Debug, Clone)]
pub struct RandomSplitIterator {
    inner: SequentialWindowIterator,
    test: Vec<Record>,
    ranges: FeatureRanges,
    input_days: usize,
}

impl RandomSplitIterator {
    /// Split with a `ChaCha8Rng` seeded from `config.seed`.
    pub fn new(records: &[Record], ranges: FeatureRanges, config: &WindowConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(records, ranges, config, &mut rng)
    }

    /// Split with a caller-provided generator.
    ///
    /// # Errors
    ///
    /// [`DatasetError::InsufficientData`] when there are fewer than
    /// `2 * input_days` records, or when the training partition cannot hold
    /// a single window.
    pub fn with_rng<R: Rng + ?Sized>(
        records: &[Record],
        ranges: FeatureRanges,
        config: &WindowConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let required = 2 * config.input_days;
        if records.len() < required {
            return Err(DatasetError::InsufficientData {
                strategy: "random_split",
                available: records.len(),
                required,
            });
        }

        let (test, train): (Vec<Record>, Vec<Record>) = records
            .iter()
            .cloned()
            .partition(|_| rng.gen::<f64>() < TEST_PROBABILITY);

        log::info!(
            "Random split: {} training records, {} test records",
            train.len(),
            test.len()
        );

        let train_len = train.len();
        let inner = SequentialWindowIterator::with_train_len(
            Arc::from(train),
            ranges.clone(),
            config,
            train_len,
            "random_split",
        )?;

        Ok(Self {
            inner,
            test,
            ranges,
            input_days: config.input_days,
        })
    }

    /// Records of the training partition.
    pub fn train_len(&self) -> usize {
        self.inner.train_len()
    }

    /// Records of the test partition, in original order.
    pub fn test_records(&self) -> &[Record] {
        &self.test
    }

    /// Evaluation pairs over the test partition.
    pub fn evaluation_set(&self) -> EvaluationSet {
        EvaluationSet {
            pairs: window_pairs(&self.test, &self.ranges, self.input_days),
            input_days: self.input_days,
            target_ranges: self.ranges.targets.clone(),
        }
    }
}

impl BatchIterator for RandomSplitIterator {
    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn next_batch(&mut self, requested: usize) -> Result<Batch> {
        self.inner.next_batch(requested)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn needs_reset(&self) -> bool {
        false
    }

    fn total_examples(&self) -> usize {
        self.inner.total_examples()
    }

    fn input_width(&self) -> usize {
        self.inner.input_width()
    }

    fn target_width(&self) -> usize {
        self.inner.target_width()
    }

    fn preferred_batch_size(&self) -> usize {
        self.inner.preferred_batch_size()
    }

    fn state(&self) -> &IteratorState {
        self.inner.state()
    }
}
