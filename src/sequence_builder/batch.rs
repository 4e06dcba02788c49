//! Training batch tensors.

use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use ndarray::Array3;

/// One training batch.
///
/// Layout follows the recurrent-network convention of
/// `[batch, columns, time steps]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Normalized inputs, shape `[batch, input_width, steps]`
    pub inputs: Array3<f64>,

    /// Normalized targets, shape `[batch, target_width, steps]`
    pub targets: Array3<f64>,

    /// Entity of every example, when the batch holds a single entity
    pub entity_id: Option<u32>,
}

impl Batch {
    /// Number of examples.
    pub fn size(&self) -> usize {
        self.inputs.shape()[0]
    }

    /// Number of time steps per example.
    pub fn steps(&self) -> usize {
        self.inputs.shape()[2]
    }

    /// Width of one input step.
    pub fn input_width(&self) -> usize {
        self.inputs.shape()[1]
    }

    /// Width of one target step.
    pub fn target_width(&self) -> usize {
        self.targets.shape()[1]
    }
}

/// Build a batch of next-day windows.
///
/// For the window starting at `start`, input step `c` is record `start + c`
/// and target step `c` is record `start + c + 1`.
pub(crate) fn window_batch(
    records: &[Record],
    ranges: &FeatureRanges,
    starts: &[usize],
    input_days: usize,
) -> Batch {
    let input_width = ranges.inputs.len();
    let target_width = ranges.targets.len();
    let mut inputs = Array3::<f64>::zeros((starts.len(), input_width, input_days));
    let mut targets = Array3::<f64>::zeros((starts.len(), target_width, input_days));

    for (example, &start) in starts.iter().enumerate() {
        for step in 0..input_days {
            let input = &records[start + step];
            for (column, value) in ranges.normalize_input(input).into_iter().enumerate() {
                inputs[[example, column, step]] = value;
            }

            let next = &records[start + step + 1];
            for (column, value) in ranges.normalize_targets(next).into_iter().enumerate() {
                targets[[example, column, step]] = value;
            }
        }
    }

    Batch {
        inputs,
        targets,
        entity_id: single_entity(starts.iter().map(|&s| &records[s])),
    }
}

/// Build a batch of single-step examples whose target is the record itself.
pub(crate) fn single_step_batch(records: &[Record], ranges: &FeatureRanges) -> Batch {
    let input_width = ranges.inputs.len();
    let target_width = ranges.targets.len();
    let mut inputs = Array3::<f64>::zeros((records.len(), input_width, 1));
    let mut targets = Array3::<f64>::zeros((records.len(), target_width, 1));

    for (example, record) in records.iter().enumerate() {
        for (column, value) in ranges.normalize_input(record).into_iter().enumerate() {
            inputs[[example, column, 0]] = value;
        }
        for (column, value) in ranges.normalize_targets(record).into_iter().enumerate() {
            targets[[example, column, 0]] = value;
        }
    }

    Batch {
        inputs,
        targets,
        entity_id: single_entity(records.iter()),
    }
}

fn single_entity<'a>(mut records: impl Iterator<Item = &'a Record>) -> Option<u32> {
    let first = records.next()?.entity_id;
    records.all(|r| r.entity_id == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        (0..5)
            .map(|i| Record::new(2, 2017, i, vec![i as f64], vec![10.0 * i as f64]))
            .collect()
    }

    #[test]
    fn test_window_batch_shapes_and_targets() {
        let records = records();
        let ranges = FeatureRanges::from_records(&records);
        let batch = window_batch(&records, &ranges, &[0, 1], 3);

        assert_eq!(batch.size(), 2);
        assert_eq!(batch.steps(), 3);
        assert_eq!(batch.input_width(), 4);
        assert_eq!(batch.target_width(), 1);
        assert_eq!(batch.entity_id, Some(2));

        // Window 1: input days 1..4, targets days 2..5
        assert_eq!(batch.inputs[[1, 2, 0]], 0.25);
        assert_eq!(batch.targets[[1, 0, 0]], 0.5);
        assert_eq!(batch.targets[[1, 0, 2]], 1.0);
    }

    #[test]
    fn test_single_step_batch() {
        let records = records();
        let ranges = FeatureRanges::from_records(&records);
        let batch = single_step_batch(&records[1..3], &ranges);

        assert_eq!(batch.size(), 2);
        assert_eq!(batch.steps(), 1);
        assert_eq!(batch.targets[[0, 0, 0]], 0.25);
        assert_eq!(batch.inputs[[1, 3, 0]], 0.5);
    }

    #[test]
    fn test_mixed_entities_have_no_entity_id() {
        let mut records = records();
        records[4].entity_id = 3;
        let ranges = FeatureRanges::from_records(&records);
        let batch = single_step_batch(&records, &ranges);
        assert_eq!(batch.entity_id, None);
    }
}
