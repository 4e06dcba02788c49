//! Batch Iterator Integration Tests
//!
//! These tests drive the three windowing strategies through the public
//! `BatchIterator` contract the way a trainer does: check `needs_reset`,
//! request batches until the epoch is exhausted, reset, repeat.

use rand::rngs::mock::StepRng;
use rebate_dataset::sequence_builder::DEFAULT_BATCH_SIZE;
use rebate_dataset::{
    Batch, BatchIterator, DatasetError, FeatureRanges, IteratorKind, IteratorPhase,
    RandomSplitIterator, Record, WindowConfig, WindowIterator,
};
use std::sync::Arc;

fn entity(entity_id: u32, days: i64) -> Vec<Record> {
    (0..days)
        .map(|d| {
            Record::new(
                entity_id,
                2017,
                d,
                vec![(d % 5) as f64],
                vec![(d * 10) as f64],
            )
        })
        .collect()
}

fn build(records: Vec<Record>, config: &WindowConfig) -> WindowIterator {
    let ranges = FeatureRanges::from_records(&records);
    let records: Arc<[Record]> = records.into();
    WindowIterator::new(records, ranges, config, None).unwrap()
}

/// Drain one epoch, returning every batch and the `needs_reset` value seen
/// before each request.
fn drain(iterator: &mut WindowIterator, requested: usize) -> (Vec<Batch>, Vec<bool>) {
    let mut batches = Vec::new();
    let mut resets = Vec::new();
    while iterator.has_next() {
        resets.push(iterator.needs_reset());
        batches.push(iterator.next_batch(requested).unwrap());
    }
    (batches, resets)
}

#[test]
fn test_six_records_three_input_days_give_two_windows() {
    let mut config = WindowConfig::new(IteratorKind::Sequential, 3);
    config.split_ratio = 1.0;
    let mut iterator = build(entity(2, 6), &config);

    assert_eq!(iterator.total_examples(), 2);
    let (batches, _) = drain(&mut iterator, 64);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].size(), 2);
    assert_eq!(batches[0].inputs.shape(), &[2, 4, 3]);
    assert_eq!(batches[0].targets.shape(), &[2, 1, 3]);
}

#[test]
fn test_window_targets_are_next_day_sales() {
    let mut config = WindowConfig::new(IteratorKind::Sequential, 3);
    config.split_ratio = 1.0;
    let mut iterator = build(entity(2, 6), &config);

    let batch = iterator.next_batch(1).unwrap();
    // Days 0..5 and sales 0..50 both normalize to d / 5
    for c in 0..3 {
        let input_sales_day = batch.inputs[[0, 2, c]] * 5.0;
        let target = batch.targets[[0, 0, c]] * 5.0;
        assert!((input_sales_day - c as f64).abs() < 1e-12);
        assert!((target - (c + 1) as f64).abs() < 1e-12);
    }
    assert_eq!(batch.entity_id, Some(2));
}

#[test]
fn test_sequential_epoch_sum_and_reset_determinism() {
    let mut config = WindowConfig::new(IteratorKind::Sequential, 5);
    config.batch_size = 7;
    let mut iterator = build(entity(2, 100), &config);

    // train_len = 90, windows = 90 - 6
    assert_eq!(iterator.total_examples(), 84);

    let (first, _) = drain(&mut iterator, 7);
    assert_eq!(first.iter().map(Batch::size).sum::<usize>(), 84);
    assert_eq!(iterator.state().phase, IteratorPhase::EpochExhausted);
    assert!(matches!(
        iterator.next_batch(7),
        Err(DatasetError::IteratorExhausted)
    ));

    iterator.reset();
    assert_eq!(iterator.state().phase, IteratorPhase::Ready);
    let (second, resets) = drain(&mut iterator, 7);
    assert_eq!(first, second);
    assert!(resets.iter().all(|r| !r));
}

#[test]
fn test_per_entity_needs_reset_only_after_entity_end() {
    let mut records = entity(2, 150);
    records.extend(entity(3, 70));
    let mut config = WindowConfig::new(IteratorKind::PerEntity, 22);
    config.split_ratio = 1.0;
    let mut iterator = build(records, &config);

    assert_eq!(iterator.total_examples(), 220);
    assert_eq!(iterator.reset_points(), vec![0, 150]);

    let (batches, resets) = drain(&mut iterator, DEFAULT_BATCH_SIZE);
    let sizes: Vec<usize> = batches.iter().map(Batch::size).collect();
    assert_eq!(sizes, vec![64, 64, 22, 64, 6]);
    assert_eq!(resets, vec![false, false, false, true, false]);
    assert!(iterator.needs_reset());

    let entities: Vec<Option<u32>> = batches.iter().map(|b| b.entity_id).collect();
    assert_eq!(
        entities,
        vec![Some(2), Some(2), Some(2), Some(3), Some(3)]
    );
    assert!(batches.iter().all(|b| b.steps() == 1));
}

#[test]
fn test_per_entity_requested_size_smaller_than_default() {
    let mut records = entity(2, 10);
    records.extend(entity(3, 5));
    let mut config = WindowConfig::new(IteratorKind::PerEntity, 22);
    config.split_ratio = 1.0;
    let mut iterator = build(records, &config);

    let (batches, resets) = drain(&mut iterator, 4);
    let sizes: Vec<usize> = batches.iter().map(Batch::size).collect();
    assert_eq!(sizes, vec![4, 4, 2, 4, 1]);
    assert_eq!(resets, vec![false, false, false, true, false]);

    iterator.reset();
    assert!(!iterator.needs_reset());
    assert!(iterator.has_next());
}

#[test]
fn test_random_split_is_reproducible_for_a_seed() {
    let config = WindowConfig::new(IteratorKind::RandomSplit, 4);

    let mut a = build(entity(2, 200), &config);
    let mut b = build(entity(2, 200), &config);
    assert_eq!(a.total_examples(), b.total_examples());
    assert_eq!(drain(&mut a, 32).0, drain(&mut b, 32).0);
    assert_eq!(a.evaluation_set(), b.evaluation_set());

    let mut other_seed = config.clone();
    other_seed.seed = 99;
    let c = build(entity(2, 200), &other_seed);
    assert_ne!(a.evaluation_set(), c.evaluation_set());
}

#[test]
fn test_random_split_with_injected_generator() {
    let records = entity(2, 40);
    let ranges = FeatureRanges::from_records(&records);
    let config = WindowConfig::new(IteratorKind::RandomSplit, 4);

    // A generator stuck at its maximum draws 1.0 - epsilon: everything trains
    let mut rng = StepRng::new(u64::MAX, 0);
    let iterator = RandomSplitIterator::with_rng(&records, ranges, &config, &mut rng).unwrap();

    assert_eq!(iterator.test_records().len(), 0);
    assert_eq!(iterator.total_examples(), 40 - 5);
    assert!(iterator.evaluation_set().is_empty());
}

#[test]
fn test_random_split_too_few_records() {
    let records = entity(2, 7);
    let ranges = FeatureRanges::from_records(&records);
    let config = WindowConfig::new(IteratorKind::RandomSplit, 4);

    assert!(matches!(
        WindowIterator::new(records.into(), ranges, &config, None),
        Err(DatasetError::InsufficientData { .. })
    ));
}

#[test]
fn test_sequential_evaluation_pairs() {
    let config = WindowConfig::new(IteratorKind::Sequential, 3);
    let iterator = build(entity(2, 30), &config);

    // train_len = 27, one pair per held-out record
    let set = iterator.evaluation_set();
    assert_eq!(set.len(), 3);
    assert_eq!(set.input_days, 3);

    for (i, pair) in set.pairs.iter().enumerate() {
        assert_eq!(pair.day, 27 + i as i64);
        assert_eq!(pair.steps(), 3);
        assert_eq!(pair.input.shape(), &[3, 4]);
        assert_eq!(pair.target, vec![((27 + i) * 10) as f64]);
    }
}

#[test]
fn test_zero_request_is_rejected() {
    let config = WindowConfig::new(IteratorKind::PerEntity, 1);
    let mut iterator = build(entity(2, 10), &config);

    assert!(matches!(
        iterator.next_batch(0),
        Err(DatasetError::InvalidConfig(_))
    ));
    assert_eq!(iterator.state().phase, IteratorPhase::Ready);
}
