//! Chronological windows over one entity's sequence.
//!
//! The first `round(n * split_ratio)` records form the training partition.
//! Training windows start at every offset in
//! `0 .. train_len - (input_days + 1)` and are served in order:
//!
//! ```text
//! records:  r0 r1 r2 r3 r4 r5 | r6 r7      (input_days = 3)
//! window 0: [r0 r1 r2] → [r1 r2 r3]
//! window 1: [r1 r2 r3] → [r2 r3 r4]
//! ```
//!
//! The remaining records are held out; each one becomes an evaluation target
//! preceded by the `input_days` records before it.

use super::batch::{window_batch, Batch};
use super::evaluation::{window_pairs, EvaluationSet};
use super::state::{BatchIterator, IteratorState};
use super::WindowConfig;
use crate::error::{DatasetError, Result};
use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use std::collections::VecDeque;
use std::sync::Arc;

/// Index of the first held-out record.
pub(crate) fn chronological_split(len: usize, split_ratio: f64) -> usize {
    ((len as f64 * split_ratio).round() as usize).min(len)
}

/// Number of training windows for a partition.
pub(crate) fn window_count(train_len: usize, input_days: usize) -> usize {
    train_len.saturating_sub(input_days + 1)
}

/// Iterator over chronological next-day windows.
#[derive(Debug, Clone)]
pub struct SequentialWindowIterator {
    records: Arc<[Record]>,
    ranges: FeatureRanges,
    input_days: usize,
    batch_size: usize,
    train_len: usize,
    offsets: VecDeque<usize>,
    state: IteratorState,
}

impl SequentialWindowIterator {
    /// Create an iterator over one entity's chronologically sorted records.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::InvalidConfig`] when the records span more than one
    ///   entity
    /// - [`DatasetError::InsufficientData`] when the training partition holds
    ///   fewer than `input_days + 2` records
    pub fn new(records: Arc<[Record]>, ranges: FeatureRanges, config: &WindowConfig) -> Result<Self> {
        if let Some(first) = records.first() {
            if let Some(other) = records.iter().find(|r| r.entity_id != first.entity_id) {
                return Err(DatasetError::InvalidConfig(format!(
                    "sequential windows need one entity, found {} and {}",
                    first.entity_id, other.entity_id
                )));
            }
        }
        let train_len = chronological_split(records.len(), config.split_ratio);
        Self::with_train_len(records, ranges, config, train_len, "sequential")
    }

    /// Iterate the first `train_len` records; the rest is held out.
    pub(crate) fn with_train_len(
        records: Arc<[Record]>,
        ranges: FeatureRanges,
        config: &WindowConfig,
        train_len: usize,
        strategy: &'static str,
    ) -> Result<Self> {
        let required = config.input_days + 2;
        if train_len < required {
            return Err(DatasetError::InsufficientData {
                strategy,
                available: train_len,
                required,
            });
        }

        let offsets = Self::build_offsets(train_len, config.input_days);
        log::debug!(
            "{} iterator: {} training records, {} windows, {} held out",
            strategy,
            train_len,
            offsets.len(),
            records.len() - train_len
        );

        Ok(Self {
            records,
            ranges,
            input_days: config.input_days,
            batch_size: config.batch_size,
            train_len,
            state: IteratorState::new(offsets.is_empty()),
            offsets,
        })
    }

    fn build_offsets(train_len: usize, input_days: usize) -> VecDeque<usize> {
        (0..window_count(train_len, input_days)).collect()
    }

    /// Number of records in the training partition.
    pub fn train_len(&self) -> usize {
        self.train_len
    }

    /// Held-out records.
    pub fn test_records(&self) -> &[Record] {
        &self.records[self.train_len..]
    }

    /// Window start offsets not yet served in this epoch.
    pub fn remaining_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().copied()
    }

    /// Evaluation pairs for every held-out record.
    ///
    /// Inputs reach back into the training partition so the first held-out
    /// day also gets a full window.
    pub fn evaluation_set(&self) -> EvaluationSet {
        let start = self.train_len.saturating_sub(self.input_days);
        EvaluationSet {
            pairs: window_pairs(&self.records[start..], &self.ranges, self.input_days),
            input_days: self.input_days,
            target_ranges: self.ranges.targets.clone(),
        }
    }
}

impl BatchIterator for SequentialWindowIterator {
    fn has_next(&self) -> bool {
        !self.offsets.is_empty()
    }

    fn next_batch(&mut self, requested: usize) -> Result<Batch> {
        if requested == 0 {
            return Err(DatasetError::InvalidConfig(
                "requested batch size must be > 0".to_string(),
            ));
        }
        if self.offsets.is_empty() {
            return Err(DatasetError::IteratorExhausted);
        }

        self.state.begin_batch();
        let take = requested.min(self.offsets.len());
        let starts: Vec<usize> = self.offsets.drain(..take).collect();
        self.state.cursor += take;

        if self.offsets.is_empty() {
            self.state.exhaust();
        }

        Ok(window_batch(
            &self.records[..self.train_len],
            &self.ranges,
            &starts,
            self.input_days,
        ))
    }

    fn reset(&mut self) {
        self.offsets = Self::build_offsets(self.train_len, self.input_days);
        self.state.rewind(self.offsets.is_empty());
    }

    fn needs_reset(&self) -> bool {
        false
    }

    fn total_examples(&self) -> usize {
        window_count(self.train_len, self.input_days)
    }

    fn input_width(&self) -> usize {
        self.ranges.inputs.len()
    }

    fn target_width(&self) -> usize {
        self.ranges.targets.len()
    }

    fn preferred_batch_size(&self) -> usize {
        self.batch_size
    }

    fn state(&self) -> &IteratorState {
        &self.state
    }
}
