//! Record Validation Module
//!
//! Checks the output of ingestion before it is windowed, so ordering or
//! scaling problems surface as a readable report instead of silently skewed
//! batches.
//!
//! # Validation Categories
//!
//! 1. **Chronology**: entities sorted, days strictly increasing per entity
//! 2. **Gaps**: one record per calendar day, every entity covering the same span
//! 3. **Ranges**: finite values inside the recorded feature ranges
//!
//! # Usage
//!
//! ```
//! use rebate_dataset::preprocessing::FeatureRanges;
//! use rebate_dataset::validation::{validate_chronology, validate_ranges};
//! use rebate_dataset::Record;
//!
//! let records = vec![
//!     Record::new(2, 2017, 0, vec![1.0], vec![10.0]),
//!     Record::new(2, 2017, 1, vec![2.0], vec![20.0]),
//! ];
//! let ranges = FeatureRanges::from_records(&records);
//!
//! assert!(validate_chronology(&records).is_valid());
//! assert!(!validate_ranges(&records, &ranges).has_errors());
//! ```

use crate::ingest::IngestOutput;
use crate::preprocessing::FeatureRanges;
use crate::record::Record;
use std::fmt;

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Check passed
    Valid,
    /// Suspicious but usable data
    Warning(String),
    /// Data the iterators must not consume
    Error(String),
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Named checks run over one set of records, in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    checks: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    /// Empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `check`.
    pub fn add(&mut self, check: &str, level: ValidationLevel) {
        self.checks.push((check.to_string(), level));
    }

    /// Append every check of another result.
    pub fn merge(&mut self, other: ValidationResult) {
        self.checks.extend(other.checks);
    }

    /// True when every check passed without warnings.
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(|(_, l)| *l == ValidationLevel::Valid)
    }

    /// True when at least one check failed.
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// True when at least one check warned.
    pub fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }

    /// Warnings as `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.messages(|l| match l {
            ValidationLevel::Warning(msg) => Some(msg),
            _ => None,
        })
    }

    /// Errors as `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.messages(|l| match l {
            ValidationLevel::Error(msg) => Some(msg),
            _ => None,
        })
    }

    fn messages(&self, pick: impl Fn(&ValidationLevel) -> Option<&String>) -> Vec<String> {
        self.checks
            .iter()
            .filter_map(|(check, level)| pick(level).map(|msg| format!("{check}: {msg}")))
            .collect()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failing: Vec<_> = self
            .checks
            .iter()
            .filter(|(_, l)| *l != ValidationLevel::Valid)
            .collect();
        writeln!(
            f,
            "Validation: {}/{} checks passed",
            self.checks.len() - failing.len(),
            self.checks.len()
        )?;
        for (check, level) in failing {
            writeln!(f, "  - {check}: {level}")?;
        }
        Ok(())
    }
}

/// Entities must appear in ascending order, days strictly increasing within
/// each entity.
pub fn validate_chronology(records: &[Record]) -> ValidationResult {
    let mut result = ValidationResult::new();

    if records.is_empty() {
        result.add(
            "chronology",
            ValidationLevel::Warning("No records to validate".to_string()),
        );
        return result;
    }

    for (i, pair) in records.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.entity_id < prev.entity_id {
            result.add(
                "entity_order",
                ValidationLevel::Error(format!(
                    "Entity {} after entity {} at index {}",
                    next.entity_id,
                    prev.entity_id,
                    i + 1
                )),
            );
            return result;
        }
        if next.entity_id == prev.entity_id && next.day <= prev.day {
            let problem = if next.day == prev.day {
                "Duplicate"
            } else {
                "Out-of-order"
            };
            result.add(
                "chronology",
                ValidationLevel::Error(format!(
                    "{} day {} for entity {} at index {}",
                    problem,
                    next.day,
                    next.entity_id,
                    i + 1
                )),
            );
            return result;
        }
    }

    result.add("entity_order", ValidationLevel::Valid);
    result.add("chronology", ValidationLevel::Valid);
    result
}

/// Every entity must hold one record per day over the global day span.
///
/// Gaps are warnings: they are legal input, only missing-day filling removes
/// them.
pub fn validate_no_gaps(records: &[Record]) -> ValidationResult {
    let mut result = ValidationResult::new();

    let (Some(first_day), Some(last_day)) = (
        records.iter().map(|r| r.day).min(),
        records.iter().map(|r| r.day).max(),
    ) else {
        result.add(
            "day_gaps",
            ValidationLevel::Warning("No records to validate".to_string()),
        );
        return result;
    };

    let mut gaps = 0usize;
    let mut largest_gap = 0i64;
    let mut short_entities = Vec::new();

    for entity in records.chunk_by(|a, b| a.entity_id == b.entity_id) {
        for pair in entity.windows(2) {
            let step = pair[1].day - pair[0].day;
            if step > 1 {
                gaps += 1;
                largest_gap = largest_gap.max(step - 1);
            }
        }
        let starts = entity.first().map(|r| r.day);
        let ends = entity.last().map(|r| r.day);
        if starts != Some(first_day) || ends != Some(last_day) {
            short_entities.push(entity[0].entity_id);
        }
    }

    if gaps == 0 {
        result.add("day_gaps", ValidationLevel::Valid);
    } else {
        result.add(
            "day_gaps",
            ValidationLevel::Warning(format!(
                "{gaps} gaps, largest spans {largest_gap} missing days"
            )),
        );
    }

    if short_entities.is_empty() {
        result.add("day_coverage", ValidationLevel::Valid);
    } else {
        result.add(
            "day_coverage",
            ValidationLevel::Warning(format!(
                "Entities {short_entities:?} do not span days {first_day}..={last_day}"
            )),
        );
    }

    result
}

/// Every value must be finite and lie inside its recorded range.
///
/// Degenerate columns are reported as warnings; they normalize to zero.
pub fn validate_ranges(records: &[Record], ranges: &FeatureRanges) -> ValidationResult {
    let mut result = ValidationResult::new();

    let non_finite = records
        .iter()
        .position(|r| {
            r.features
                .iter()
                .chain(&r.targets)
                .any(|v| !v.is_finite())
        });
    match non_finite {
        Some(i) => result.add(
            "finite_values",
            ValidationLevel::Error(format!("NaN or Inf in record {i}")),
        ),
        None => result.add("finite_values", ValidationLevel::Valid),
    }

    let mut outside = None;
    'records: for (i, record) in records.iter().enumerate() {
        if record.input_width() != ranges.inputs.len()
            || record.targets.len() != ranges.targets.len()
        {
            result.add(
                "range_width",
                ValidationLevel::Error(format!(
                    "Record {} has {} inputs / {} targets, ranges cover {} / {}",
                    i,
                    record.input_width(),
                    record.targets.len(),
                    ranges.inputs.len(),
                    ranges.targets.len()
                )),
            );
            return result;
        }
        for (column, range) in ranges.inputs.iter().enumerate() {
            let value = record.input_value(column);
            if value.is_finite() && !range.contains(value) {
                outside = Some(format!("input column {column} of record {i} = {value}"));
                break 'records;
            }
        }
        for (column, (range, &value)) in ranges.targets.iter().zip(&record.targets).enumerate() {
            if value.is_finite() && !range.contains(value) {
                outside = Some(format!("target column {column} of record {i} = {value}"));
                break 'records;
            }
        }
    }
    match outside {
        Some(msg) => result.add(
            "range_bounds",
            ValidationLevel::Error(format!("Outside recorded range: {msg}")),
        ),
        None => result.add("range_bounds", ValidationLevel::Valid),
    }

    let degenerate = ranges.degenerate_inputs();
    if degenerate.is_empty() {
        result.add("degenerate_ranges", ValidationLevel::Valid);
    } else {
        result.add(
            "degenerate_ranges",
            ValidationLevel::Warning(format!(
                "Input columns {degenerate:?} are constant and normalize to 0"
            )),
        );
    }

    result
}

/// Run every check over an ingestion result.
pub fn validate_ingest(output: &IngestOutput) -> ValidationResult {
    let mut result = validate_chronology(&output.records);
    result.merge(validate_no_gaps(&output.records));
    result.merge(validate_ranges(&output.records, &output.ranges));

    if output.stats.skipped.is_empty() {
        result.add("skipped_rows", ValidationLevel::Valid);
    } else {
        result.add(
            "skipped_rows",
            ValidationLevel::Warning(format!(
                "{} rows skipped for a wrong field count",
                output.stats.skipped.len()
            )),
        );
    }

    result
}
