//! Cleaned per-entity, per-day records.
//!
//! A [`Record`] is created once during ingestion (parsed, merged or
//! synthesized) and never mutated afterwards. Iterators share records
//! read-only through `Arc<[Record]>`.

use serde::{Deserialize, Serialize};

/// Fixed input columns preceding the measurement features: entity, year, day.
pub const KEY_COLUMNS: usize = 3;

/// One entity's data for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Encoded entity name
    pub entity_id: u32,

    /// Entity year (model year)
    pub entity_year: i32,

    /// Days since 1970-01-01
    pub day: i64,

    /// Measurement features (rebate)
    pub features: Vec<f64>,

    /// Target values (sales)
    pub targets: Vec<f64>,

    /// True for zero-valued records created by missing-day interpolation
    pub synthesized: bool,
}

impl Record {
    /// Create a record parsed from input data.
    pub fn new(
        entity_id: u32,
        entity_year: i32,
        day: i64,
        features: Vec<f64>,
        targets: Vec<f64>,
    ) -> Self {
        Self {
            entity_id,
            entity_year,
            day,
            features,
            targets,
            synthesized: false,
        }
    }

    /// Create a zero-valued placeholder for a day without data.
    pub fn missing_day(
        entity_id: u32,
        entity_year: i32,
        day: i64,
        feature_count: usize,
        target_count: usize,
    ) -> Self {
        Self {
            entity_id,
            entity_year,
            day,
            features: vec![0.0; feature_count],
            targets: vec![0.0; target_count],
            synthesized: true,
        }
    }

    /// Width of [`Record::input_vector`].
    #[inline]
    pub fn input_width(&self) -> usize {
        KEY_COLUMNS + self.features.len()
    }

    /// Value of one model input column without allocating.
    ///
    /// Column order: entity id, entity year, day, features...
    #[inline]
    pub fn input_value(&self, column: usize) -> f64 {
        match column {
            0 => self.entity_id as f64,
            1 => self.entity_year as f64,
            2 => self.day as f64,
            c => self.features[c - KEY_COLUMNS],
        }
    }

    /// Model input vector: `[entity_id, entity_year, day, features...]`.
    pub fn input_vector(&self) -> Vec<f64> {
        (0..self.input_width()).map(|c| self.input_value(c)).collect()
    }

    /// Fold another row of the same entity and day into this record.
    ///
    /// `rows_so_far` is the number of rows already folded into `self`
    /// (1 for a freshly parsed record). Features become the arithmetic mean
    /// of all folded rows; targets are summed.
    pub fn merge_same_day(&mut self, other: &Record, rows_so_far: usize) {
        debug_assert_eq!(self.entity_id, other.entity_id);
        debug_assert_eq!(self.day, other.day);

        let n = rows_so_far as f64;
        for (mine, theirs) in self.features.iter_mut().zip(&other.features) {
            *mine = (*mine * n + theirs) / (n + 1.0);
        }
        for (mine, theirs) in self.targets.iter_mut().zip(&other.targets) {
            *mine += theirs;
        }
    }
}
