//! Entity-by-entity single-step batches.
//!
//! Records are grouped per entity and every entity's sequence is split
//! chronologically. The training prefix of one entity is served in batches
//! of `batch_size` records plus one remainder batch before moving on to the
//! next entity:
//!
//! ```text
//! entity A (150 train): [64] [64] [22] ── needs_reset
//! entity B ( 70 train): [64] [6]       ── needs_reset, finished
//! ```
//!
//! Consecutive entities are not temporally related, so the consumer must
//! clear its recurrent state whenever [`BatchIterator::needs_reset`] is true.

use super::batch::{single_step_batch, Batch};
use super::evaluation::{single_step_pairs, EvaluationSet};
use super::sequential::chronological_split;
use super::state::{BatchIterator, IteratorState};
use super::WindowConfig;
use crate::error::{DatasetError, Result};
use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use std::ops::Range;
use std::sync::Arc;

/// One entity's slice of the shared record list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntitySlice {
    entity_id: u32,
    train: Range<usize>,
    test: Range<usize>,
}

/// Iterator serving each entity's training records in single-step batches.
#[derive(Debug, Clone)]
pub struct PerEntityBatchIterator {
    records: Arc<[Record]>,
    ranges: FeatureRanges,
    entities: Vec<EntitySlice>,
    /// Indices into `entities` with a non-empty training prefix
    training: Vec<usize>,
    batch_size: usize,
    filter_id: Option<u32>,
    state: IteratorState,
}

impl PerEntityBatchIterator {
    /// Create an iterator over records sorted by `(entity_id, day)`.
    ///
    /// `filter_id` selects the entity whose held-out tail forms the
    /// evaluation set; with `None` every entity's tail is used.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::InvalidConfig`] if `batch_size` is 0
    /// - [`DatasetError::InsufficientData`] if no entity has a training record
    pub fn new(
        records: Arc<[Record]>,
        ranges: FeatureRanges,
        config: &WindowConfig,
        filter_id: Option<u32>,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(DatasetError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }

        let entities = Self::group(&records, config.split_ratio);
        let training: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.train.is_empty())
            .map(|(i, _)| i)
            .collect();

        let train_records: usize = training.iter().map(|&i| entities[i].train.len()).sum();
        if train_records == 0 {
            return Err(DatasetError::InsufficientData {
                strategy: "per_entity",
                available: 0,
                required: 1,
            });
        }

        log::debug!(
            "per_entity iterator: {} entities, {} with training data, {} training records",
            entities.len(),
            training.len(),
            train_records
        );

        Ok(Self {
            records,
            ranges,
            entities,
            training,
            batch_size: config.batch_size,
            filter_id,
            state: IteratorState::new(false),
        })
    }

    fn group(records: &[Record], split_ratio: f64) -> Vec<EntitySlice> {
        let mut entities = Vec::new();
        let mut start = 0;
        while start < records.len() {
            let entity_id = records[start].entity_id;
            let len = records[start..].partition_point(|r| r.entity_id == entity_id);
            let split = start + chronological_split(len, split_ratio);
            entities.push(EntitySlice {
                entity_id,
                train: start..split,
                test: split..start + len,
            });
            start += len;
        }
        entities
    }

    fn current(&self) -> Option<&EntitySlice> {
        self.training
            .get(self.state.entity_index)
            .map(|&i| &self.entities[i])
    }

    /// Number of distinct entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entity whose records the next batch will hold.
    pub fn current_entity(&self) -> Option<u32> {
        self.current().map(|e| e.entity_id)
    }

    /// Remaining batch sizes of the current entity.
    pub fn schedule(&self) -> Vec<usize> {
        let Some(entity) = self.current() else {
            return Vec::new();
        };
        let remaining = entity.train.len() - self.state.cursor;
        let full = remaining / self.batch_size;
        let rest = remaining % self.batch_size;

        let mut sizes = vec![self.batch_size; full];
        if rest > 0 {
            sizes.push(rest);
        }
        sizes
    }

    /// Example offsets within one epoch at which a new entity begins.
    pub fn reset_points(&self) -> Vec<usize> {
        self.training
            .iter()
            .scan(0, |offset, &i| {
                let start = *offset;
                *offset += self.entities[i].train.len();
                Some(start)
            })
            .collect()
    }

    /// Evaluation pairs from the held-out tail of the filter entity, or of
    /// every entity when no filter is set.
    pub fn evaluation_set(&self) -> EvaluationSet {
        let pairs = self
            .entities
            .iter()
            .filter(|e| self.filter_id.map_or(true, |id| e.entity_id == id))
            .flat_map(|e| single_step_pairs(&self.records[e.test.clone()], &self.ranges))
            .collect();

        EvaluationSet {
            pairs,
            input_days: 1,
            target_ranges: self.ranges.targets.clone(),
        }
    }
}

impl BatchIterator for PerEntityBatchIterator {
    fn has_next(&self) -> bool {
        !self.state.finished
    }

    fn next_batch(&mut self, requested: usize) -> Result<Batch> {
        if requested == 0 {
            return Err(DatasetError::InvalidConfig(
                "requested batch size must be > 0".to_string(),
            ));
        }
        let train = match self.current() {
            Some(entity) if !self.state.finished => entity.train.clone(),
            _ => return Err(DatasetError::IteratorExhausted),
        };

        self.state.begin_batch();
        let start = train.start + self.state.cursor;
        let take = requested.min(train.end - start);
        let batch = single_step_batch(&self.records[start..start + take], &self.ranges);
        self.state.cursor += take;

        if start + take == train.end {
            self.state.needs_reset = true;
            self.state.cursor = 0;
            self.state.entity_index += 1;
            if self.state.entity_index == self.training.len() {
                self.state.exhaust();
            }
        }

        Ok(batch)
    }

    fn reset(&mut self) {
        self.state.rewind(false);
    }

    fn needs_reset(&self) -> bool {
        self.state.needs_reset
    }

    fn total_examples(&self) -> usize {
        self.training
            .iter()
            .map(|&i| self.entities[i].train.len())
            .sum()
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
