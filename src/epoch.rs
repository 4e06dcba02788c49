//! Epoch driver for external sequence models.
//!
//! The crate does not fit models. [`EpochRunner`] implements the trainer side
//! of the iterator contract so any recurrent model behind [`SequenceModel`]
//! is fed correctly:
//!
//! - recurrent state is cleared whenever the iterator reports `needs_reset`
//!   and after every epoch
//! - the iterator is reset after every epoch
//! - progress is reported once per epoch with a remaining-time estimate
//! - cancellation is cooperative and observed only between epochs
//!
//! # Example
//!
//! ```
//! use rebate_dataset::epoch::{EpochRunner, SequenceModel};
//! use rebate_dataset::preprocessing::FeatureRanges;
//! use rebate_dataset::sequence_builder::{Batch, IteratorKind, WindowConfig, WindowIterator};
//! use rebate_dataset::Record;
//!
//! #[derive(Default)]
//! struct CountingModel {
//!     examples: usize,
//! }
//!
//! impl SequenceModel for CountingModel {
//!     fn fit(&mut self, batch: &Batch) {
//!         self.examples += batch.size();
//!     }
//!
//!     fn clear_state(&mut self) {}
//! }
//!
//! let records: Vec<Record> = (0..12)
//!     .map(|d| Record::new(2, 2017, d, vec![1.0], vec![d as f64]))
//!     .collect();
//! let ranges = FeatureRanges::from_records(&records);
//! let config = WindowConfig::new(IteratorKind::Sequential, 3);
//! let mut iterator = WindowIterator::new(records.into(), ranges, &config, None).unwrap();
//!
//! let mut model = CountingModel::default();
//! let summary = EpochRunner::new(2).run(&mut iterator, &mut model).unwrap();
//!
//! assert_eq!(summary.epochs_completed, 2);
//! assert_eq!(model.examples, summary.examples);
//! ```
//!
//! # Cancellation Support
//!
//! A [`CancellationToken`] can be cloned into another thread; the runner
//! stops after the epoch during which it was cancelled:
//!
//! ```ignore
//! let token = CancellationToken::new();
//! let runner = EpochRunner::new(100).with_cancellation_token(token.clone());
//!
//! let handle = thread::spawn(move || runner.run(&mut iterator, &mut model));
//! token.cancel();
//! assert!(handle.join().unwrap()?.was_cancelled);
//! ```

use crate::error::Result;
use crate::sequence_builder::{Batch, BatchIterator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of recent epoch durations averaged for the remaining-time estimate.
pub const ETA_WINDOW: usize = 10;

// ============================================================================
// Model Contract
// ============================================================================

/// A recurrent model trained outside of this crate.
pub trait SequenceModel {
    /// Fit one batch.
    fn fit(&mut self, batch: &Batch);

    /// Clear recurrent state carried between batches.
    fn clear_state(&mut self);
}

// ============================================================================
// Cancellation
// ============================================================================

/// Thread-safe cancellation flag.
///
/// Cloning shares the flag. The token is also a [`ProgressCallback`] that
/// requests cancellation once [`CancellationToken::cancel`] was called.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Safe to call from any thread at any time.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag for reuse.
    ///
    /// Only call this when no run is active.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Progress Reporting
// ============================================================================

/// Per-epoch progress receiver.
pub trait ProgressCallback: Send + Sync {
    /// Called once after every epoch.
    ///
    /// `percent` is the share of completed epochs (0 to 100) and
    /// `remaining_ms` the estimated time left. Return `true` to cancel.
    fn report_progress(&self, percent: u32, remaining_ms: u64) -> bool;
}

impl ProgressCallback for CancellationToken {
    fn report_progress(&self, _percent: u32, _remaining_ms: u64) -> bool {
        self.is_cancelled()
    }
}

/// Progress reporter writing to the log.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    /// Create a new console progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressCallback for ConsoleProgress {
    fn report_progress(&self, percent: u32, remaining_ms: u64) -> bool {
        log::info!(
            "Training {:3}% complete, ~{:.1}s remaining",
            percent,
            remaining_ms as f64 / 1000.0
        );
        false
    }
}

// ============================================================================
// Epoch Runner
// ============================================================================

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Epochs run to completion
    pub epochs_completed: usize,

    /// Batches fitted
    pub batches: usize,

    /// Examples fitted
    pub examples: usize,

    /// `clear_state` calls triggered by `needs_reset`
    pub state_resets: usize,

    /// True when the run stopped early on request
    pub was_cancelled: bool,

    /// Wall time of every completed epoch
    pub epoch_durations: Vec<Duration>,

    /// Total wall time
    pub elapsed: Duration,
}

/// Drives a [`SequenceModel`] through epochs of a [`BatchIterator`].
pub struct EpochRunner {
    epochs: usize,
    callback: Option<Box<dyn ProgressCallback>>,
    cancellation: CancellationToken,
}

impl EpochRunner {
    /// Create a runner for a number of epochs.
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            callback: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Report progress to a callback after every epoch.
    pub fn with_progress_callback(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Use an external cancellation token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token observed between epochs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Configured epoch count.
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Percent of completed epochs.
    pub fn percent_complete(completed: usize, epochs: usize) -> u32 {
        if epochs == 0 {
            100
        } else {
            (completed * 100 / epochs) as u32
        }
    }

    /// Remaining time from the mean of the recent epoch durations.
    pub fn estimate_remaining(recent: &VecDeque<Duration>, remaining_epochs: usize) -> Duration {
        if recent.is_empty() {
            return Duration::ZERO;
        }
        let mean = recent.iter().sum::<Duration>() / recent.len() as u32;
        mean * remaining_epochs as u32
    }

    /// Train `model` for the configured number of epochs.
    ///
    /// The iterator is left reset, ready for another epoch.
    pub fn run<I, M>(&self, iterator: &mut I, model: &mut M) -> Result<TrainingSummary>
    where
        I: BatchIterator + ?Sized,
        M: SequenceModel + ?Sized,
    {
        let start = Instant::now();
        let mut recent: VecDeque<Duration> = VecDeque::with_capacity(ETA_WINDOW);
        let mut summary = TrainingSummary {
            epochs_completed: 0,
            batches: 0,
            examples: 0,
            state_resets: 0,
            was_cancelled: false,
            epoch_durations: Vec::with_capacity(self.epochs),
            elapsed: Duration::ZERO,
        };

        log::info!(
            "Training {} epochs, {} examples per epoch",
            self.epochs,
            iterator.total_examples()
        );

        for epoch in 0..self.epochs {
            let epoch_start = Instant::now();

            while iterator.has_next() {
                if iterator.needs_reset() {
                    model.clear_state();
                    summary.state_resets += 1;
                }
                let batch = iterator.next_default()?;
                model.fit(&batch);
                summary.batches += 1;
                summary.examples += batch.size();
            }

            iterator.reset();
            model.clear_state();

            let duration = epoch_start.elapsed();
            summary.epoch_durations.push(duration);
            summary.epochs_completed = epoch + 1;

            if recent.len() == ETA_WINDOW {
                recent.pop_front();
            }
            recent.push_back(duration);

            let percent = Self::percent_complete(epoch + 1, self.epochs);
            let remaining = Self::estimate_remaining(&recent, self.epochs - epoch - 1);
            log::debug!("Epoch {} finished in {:?}", epoch + 1, duration);

            let callback_cancel = self
                .callback
                .as_ref()
                .is_some_and(|cb| cb.report_progress(percent, remaining.as_millis() as u64));

            if callback_cancel || self.cancellation.is_cancelled() {
                log::info!("Training cancelled after epoch {}", epoch + 1);
                summary.was_cancelled = true;
                break;
            }
        }

        summary.elapsed = start.elapsed();
        Ok(summary)
    }
}
