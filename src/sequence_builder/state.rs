//! Iterator state machine and the common batch iterator contract.
//!
//! ```text
//!            next_batch()             next_batch() (more left)
//!   Ready ───────────────► InProgress ◄──────────────┐
//!     ▲                        │ └────────────────────┘
//!     │ reset()                │ next_batch() (last batch)
//!     │                        ▼
//!     └──────────────── EpochExhausted
//! ```
//!
//! `reset()` returns to `Ready` from any phase. An iterator with an empty
//! epoch starts in `EpochExhausted`.

use super::batch::Batch;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a batch iterator within one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IteratorPhase {
    /// Constructed or just reset; no batch produced yet
    Ready,

    /// At least one batch produced and more remain
    InProgress,

    /// Every batch of the epoch has been produced
    EpochExhausted,
}

/// Mutable cursor state owned by exactly one iterator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IteratorState {
    /// Position within the current entity or offset queue
    pub cursor: usize,

    /// Index of the current entity (per-entity iteration only)
    pub entity_index: usize,

    /// True once the epoch is exhausted
    pub finished: bool,

    /// True when the next batch does not continue the previous one in time
    pub needs_reset: bool,

    /// Current phase
    pub phase: IteratorPhase,
}

impl IteratorState {
    /// Fresh state; `empty` marks an epoch without batches.
    pub fn new(empty: bool) -> Self {
        let mut state = Self {
            cursor: 0,
            entity_index: 0,
            finished: false,
            needs_reset: false,
            phase: IteratorPhase::Ready,
        };
        if empty {
            state.exhaust();
        }
        state
    }

    /// Record that a batch is being produced.
    pub fn begin_batch(&mut self) {
        self.needs_reset = false;
        self.phase = IteratorPhase::InProgress;
    }

    /// Record that the epoch has no batches left.
    pub fn exhaust(&mut self) {
        self.finished = true;
        self.phase = IteratorPhase::EpochExhausted;
    }

    /// Return to the start of an epoch.
    pub fn rewind(&mut self, empty: bool) {
        *self = Self::new(empty);
    }
}

/// Common contract of every windowing strategy.
///
/// The consumer must check [`BatchIterator::needs_reset`] before every call
/// to [`BatchIterator::next_batch`] and clear its recurrent state when true.
pub trait BatchIterator: Send {
    /// Whether another batch is available in this epoch.
    fn has_next(&self) -> bool;

    /// Produce the next batch with at most `requested` examples.
    ///
    /// # Errors
    ///
    /// - [`crate::DatasetError::IteratorExhausted`] if the epoch is exhausted
    /// - [`crate::DatasetError::InvalidConfig`] if `requested` is 0
    fn next_batch(&mut self, requested: usize) -> Result<Batch>;

    /// Produce the next batch using [`BatchIterator::preferred_batch_size`].
    fn next_default(&mut self) -> Result<Batch> {
        let size = self.preferred_batch_size();
        self.next_batch(size)
    }

    /// Rewind to the start of the epoch.
    fn reset(&mut self);

    /// True when the next batch starts a new, unrelated sequence.
    fn needs_reset(&self) -> bool;

    /// Number of examples produced by one full epoch.
    fn total_examples(&self) -> usize;

    /// Width of one input time step.
    fn input_width(&self) -> usize;

    /// Width of one target time step.
    fn target_width(&self) -> usize;

    /// Batch size used by [`BatchIterator::next_default`].
    fn preferred_batch_size(&self) -> usize;

    /// Current state.
    fn state(&self) -> &IteratorState;
}
