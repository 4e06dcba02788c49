//! Sliding-window averaging of staggered predictions.
//!
//! A model fed overlapping windows of `input_days` days emits, for every
//! window, one next-day prediction per time step. The same calendar day is
//! therefore predicted by up to `input_days` consecutive windows. The
//! [`SlidingWindowAverager`] collects those predictions per relative day slot
//! and releases the mean of the oldest slot before sliding forward.
//!
//! ```text
//! window i   : slot 0  slot 1  slot 2
//! window i+1 :         slot 0  slot 1  slot 2
//! window i+2 :                 slot 0  slot 1  slot 2
//!                              ^ complete after window i+2
//! ```

use std::collections::VecDeque;

/// Fixed-depth FIFO of per-day prediction buckets.
#[derive(Debug, Clone)]
pub struct SlidingWindowAverager {
    depth: usize,
    slots: VecDeque<Vec<f64>>,
}

impl SlidingWindowAverager {
    /// Create an averager holding `depth` day slots.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is 0.
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0, "averager depth must be > 0");
        Self {
            depth,
            slots: (0..depth).map(|_| Vec::new()).collect(),
        }
    }

    /// Number of day slots.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record a prediction for the day `day_offset` slots ahead.
    ///
    /// Offsets at or beyond the depth are dropped.
    pub fn add_day(&mut self, day_offset: usize, value: f64) {
        if let Some(slot) = self.slots.get_mut(day_offset) {
            slot.push(value);
        }
    }

    /// Mean of the values recorded for slot 0, or `None` if it is empty.
    pub fn average(&self) -> Option<f64> {
        let front = self.slots.front()?;
        if front.is_empty() {
            return None;
        }
        Some(front.iter().sum::<f64>() / front.len() as f64)
    }

    /// Number of values recorded in a slot.
    pub fn count(&self, day_offset: usize) -> usize {
        self.slots.get(day_offset).map_or(0, Vec::len)
    }

    /// Evict slot 0 and shift every other slot down by one.
    pub fn advance(&mut self) {
        self.slots.pop_front();
        self.slots.push_back(Vec::new());
    }

    /// Drop every recorded value.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}

/// Collapse staggered per-window predictions into one value per window.
///
/// `predictions[i][j]` is the prediction of window `i` at time step `j`,
/// i.e. for the day `i + j + 1` relative to the first input day. Window `i`'s
/// own target day is its last step. The result has one averaged value per
/// window target day, in order; trailing days average over fewer windows.
///
/// With `input_days == 1` the result equals the raw predictions.
pub fn smooth_predictions(predictions: &[Vec<f64>], input_days: usize) -> Vec<f64> {
    if predictions.is_empty() || input_days == 0 {
        return Vec::new();
    }

    let mut averager = SlidingWindowAverager::new(input_days);
    let mut smoothed = Vec::with_capacity(predictions.len());
    let lag = input_days - 1;

    for step in 0..predictions.len() + lag {
        if let Some(window) = predictions.get(step) {
            for (offset, &value) in window.iter().take(input_days).enumerate() {
                averager.add_day(offset, value);
            }
        }
        if step >= lag {
            smoothed.push(averager.average().unwrap_or(0.0));
        }
        averager.advance();
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_front_slot() {
        let mut avg = SlidingWindowAverager::new(3);
        assert_eq!(avg.average(), None);

        avg.add_day(0, 4.0);
        avg.add_day(0, 6.0);
        avg.add_day(1, 100.0);
        assert_eq!(avg.average(), Some(5.0));
        assert_eq!(avg.count(1), 1);
    }

    #[test]
    fn test_advance_shifts_slots() {
        let mut avg = SlidingWindowAverager::new(3);
        avg.add_day(0, 1.0);
        avg.add_day(1, 2.0);
        avg.add_day(2, 3.0);

        avg.advance();
        assert_eq!(avg.average(), Some(2.0));
        avg.advance();
        assert_eq!(avg.average(), Some(3.0));
        avg.advance();
        assert_eq!(avg.average(), None);
        assert_eq!(avg.depth(), 3);
    }

    #[test]
    fn test_offset_beyond_depth_dropped() {
        let mut avg = SlidingWindowAverager::new(2);
        avg.add_day(2, 9.0);
        avg.advance();
        avg.advance();
        assert_eq!(avg.average(), None);
    }

    #[test]
    fn test_clear() {
        let mut avg = SlidingWindowAverager::new(2);
        avg.add_day(0, 1.0);
        avg.add_day(1, 1.0);
        avg.clear();
        assert_eq!(avg.count(0), 0);
        assert_eq!(avg.count(1), 0);
    }

    #[test]
    fn test_smooth_single_day_is_identity() {
        let preds = vec![vec![1.0], vec![2.0], vec![3.5]];
        assert_eq!(smooth_predictions(&preds, 1), vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn test_smooth_overlapping_windows() {
        // Window i predicts days i+1 and i+2; its target day is i+2.
        let preds = vec![vec![10.0, 20.0], vec![30.0, 40.0], vec![50.0, 60.0]];
        let smoothed = smooth_predictions(&preds, 2);

        // Day 2: window 0 step 1 (20) and window 1 step 0 (30)
        // Day 3: window 1 step 1 (40) and window 2 step 0 (50)
        // Day 4: window 2 step 1 (60) only
        assert_eq!(smoothed, vec![25.0, 45.0, 60.0]);
    }

    #[test]
    fn test_smooth_empty() {
        assert!(smooth_predictions(&[], 3).is_empty());
    }
}
