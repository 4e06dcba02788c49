//! Ingestion of delimited sales/rebate files into cleaned records.
//!
//! # Processing Steps
//!
//! ```text
//! lines → split → encode_row → entity filter → merge same day → ranges
//!                                                                  ↓
//!                                     sorted records ← missing-day fill
//! ```
//!
//! 1. Header lines are skipped by count. Every other line is split on the
//!    delimiter, keeping empty fields. Rows with the wrong field count are
//!    logged and skipped.
//! 2. Entity names become dense codes, empty numbers become 0, dates become
//!    days since 1970-01-01.
//! 3. Rows of the same entity and day are merged: features are averaged,
//!    targets are summed.
//! 4. Feature ranges are computed over the merged records.
//! 5. Optionally every entity is completed with zero-valued records for each
//!    day between the global first and last day.
//!
//! The output is sorted by `(entity_id, day)` and never contains two records
//! for the same entity and day.

use crate::error::{DatasetError, Result};
use crate::preprocessing::{CategoricalEncoder, FeatureRanges};
use crate::record::Record;
use crate::schema::{RowSchema, SchemaVariant, DEFAULT_DATE_FORMAT};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Options controlling how a source is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Field separator
    pub delimiter: String,

    /// Number of leading lines to ignore
    pub skip_header_lines: usize,

    /// Row layout
    pub schema: SchemaVariant,

    /// `chrono` format of the date column
    pub date_format: String,

    /// Entity name whose code is reported as `filter_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_filter: Option<String>,

    /// Drop rows of every entity other than `entity_filter`
    pub restrict_to_filter: bool,

    /// Complete every entity with zero-valued records for days without data
    pub add_missing_days: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            skip_header_lines: 1,
            schema: SchemaVariant::Combined,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            entity_filter: None,
            restrict_to_filter: false,
            add_missing_days: false,
        }
    }
}

impl IngestOptions {
    /// Select the entity reported as `filter_id`.
    pub fn with_entity_filter(mut self, entity: impl Into<String>) -> Self {
        self.entity_filter = Some(entity.into());
        self
    }

    /// Keep only rows of the filter entity.
    pub fn restrict_to_filter(mut self, restrict: bool) -> Self {
        self.restrict_to_filter = restrict;
        self
    }

    /// Enable or disable missing-day interpolation.
    pub fn with_missing_days(mut self, enabled: bool) -> Self {
        self.add_missing_days = enabled;
        self
    }

    /// Set the row layout.
    pub fn with_schema(mut self, schema: SchemaVariant) -> Self {
        self.schema = schema;
        self
    }

    /// Validate options.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.delimiter.is_empty() {
            return Err("delimiter must not be empty".to_string());
        }
        if self.date_format.is_empty() {
            return Err("date_format must not be empty".to_string());
        }
        if self.restrict_to_filter && self.entity_filter.is_none() {
            return Err("restrict_to_filter requires entity_filter".to_string());
        }
        Ok(())
    }
}

/// A row dropped because its field count did not match the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number
    pub line: usize,

    /// Fields found
    pub fields: usize,

    /// Fields required
    pub expected: usize,
}

/// Counters collected while ingesting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Data lines read (header lines excluded)
    pub lines_read: usize,

    /// Rows that passed structure checks and the entity filter
    pub rows_accepted: usize,

    /// Rows dropped by the entity filter
    pub rows_filtered: usize,

    /// Rows folded into an earlier row of the same entity and day
    pub rows_merged: usize,

    /// Zero-valued records added for missing days
    pub days_synthesized: usize,

    /// Rows skipped for structural problems
    pub skipped: Vec<SkippedRow>,
}

/// Result of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    /// Cleaned records sorted by `(entity_id, day)`
    pub records: Vec<Record>,

    /// Ranges of every input and target column
    pub ranges: FeatureRanges,

    /// String tables built while reading
    pub encoder: CategoricalEncoder,

    /// Code of the filter entity, if it was seen
    pub filter_id: Option<u32>,

    /// Row layout used
    pub schema: RowSchema,

    /// Counters
    pub stats: IngestStats,
}

impl IngestOutput {
    /// Name of an encoded entity.
    pub fn entity_name(&self, entity_id: u32) -> Option<&str> {
        self.encoder
            .decode(self.schema.entity_index(), entity_id)
            .ok()
    }

    /// Distinct entity codes in record order.
    pub fn entity_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.records.iter().map(|r| r.entity_id).collect();
        ids.dedup();
        ids
    }

    /// Records of one entity.
    pub fn records_for(&self, entity_id: u32) -> &[Record] {
        let start = self.records.partition_point(|r| r.entity_id < entity_id);
        let end = self.records.partition_point(|r| r.entity_id <= entity_id);
        &self.records[start..end]
    }
}

/// Read and clean a file.
pub fn ingest_file<P: AsRef<Path>>(path: P, options: &IngestOptions) -> Result<IngestOutput> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    log::info!("Ingesting {}", path.display());
    ingest_lines(BufReader::new(file), options, path)
}

/// Read and clean any buffered source.
pub fn ingest_reader<R: BufRead>(reader: R, options: &IngestOptions) -> Result<IngestOutput> {
    ingest_lines(reader, options, Path::new("<reader>"))
}

/// Per-day accumulator: the merged record and the number of rows folded in.
type DayRows = BTreeMap<i64, (Record, usize)>;

fn ingest_lines<R: BufRead>(
    reader: R,
    options: &IngestOptions,
    source: &Path,
) -> Result<IngestOutput> {
    options.validate().map_err(DatasetError::InvalidConfig)?;

    let schema = options.schema.build_schema();
    let mut encoder = CategoricalEncoder::new(&schema, options.date_format.as_str());

    let expected = schema.column_count();
    let entity_index = schema.entity_index();
    let year_index = schema.year_index();
    let date_index = schema.date_index();
    let feature_indices = schema.feature_indices();
    let target_indices = schema.target_indices();
    let filter = options.entity_filter.as_deref().map(str::trim);

    let mut stats = IngestStats::default();
    let mut filter_id = None;
    let mut entities: AHashMap<u32, DayRows> = AHashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DatasetError::io(source, e))?;
        let line_no = index + 1;
        if index < options.skip_header_lines {
            continue;
        }

        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        stats.lines_read += 1;

        let fields: Vec<&str> = line.split(options.delimiter.as_str()).collect();
        if fields.len() != expected {
            log::warn!(
                "Skipping line {}: expected {} fields, found {}",
                line_no,
                expected,
                fields.len()
            );
            stats.skipped.push(SkippedRow {
                line: line_no,
                fields: fields.len(),
                expected,
            });
            continue;
        }

        let values = encoder.encode_row(&fields[..], line_no)?;
        let entity_id = values[entity_index] as u32;

        if let Some(name) = filter {
            let matches = fields[entity_index].trim() == name;
            if matches && filter_id.is_none() {
                filter_id = Some(entity_id);
            }
            if options.restrict_to_filter && !matches {
                stats.rows_filtered += 1;
                continue;
            }
        }

        let record = Record::new(
            entity_id,
            values[year_index] as i32,
            values[date_index] as i64,
            feature_indices.iter().map(|&i| values[i]).collect(),
            target_indices.iter().map(|&i| values[i]).collect(),
        );
        stats.rows_accepted += 1;

        match entities.entry(entity_id).or_default().entry(record.day) {
            Entry::Vacant(slot) => {
                slot.insert((record, 1));
            }
            Entry::Occupied(mut slot) => {
                let (merged, rows) = slot.get_mut();
                merged.merge_same_day(&record, *rows);
                *rows += 1;
                stats.rows_merged += 1;
            }
        }
    }

    if stats.rows_accepted == 0 {
        return Err(DatasetError::InsufficientData {
            strategy: "ingestion",
            available: 0,
            required: 1,
        });
    }

    let mut entity_ids: Vec<u32> = entities.keys().copied().collect();
    entity_ids.sort_unstable();

    let mut records = Vec::with_capacity(stats.rows_accepted - stats.rows_merged);
    for id in &entity_ids {
        if let Some(days) = entities.remove(id) {
            records.extend(days.into_values().map(|(record, _)| record));
        }
    }

    let mut ranges = FeatureRanges::with_widths(schema.input_width(), schema.target_width());
    for record in &records {
        ranges.observe(record);
    }

    if options.add_missing_days {
        let (filled, added) = fill_missing_days(records);
        records = filled;
        stats.days_synthesized = added;

        // Synthesized records carry zeros in every feature and target column.
        for record in records.iter().filter(|r| r.synthesized) {
            ranges.observe(record);
        }
    }

    if let Some(name) = filter {
        if filter_id.is_none() {
            log::warn!("Filter entity '{}' not found in input", name);
        }
    }

    log::info!(
        "Ingested {} records for {} entities ({} rows, {} merged, {} filtered, {} skipped, {} days added)",
        records.len(),
        entity_ids.len(),
        stats.rows_accepted,
        stats.rows_merged,
        stats.rows_filtered,
        stats.skipped.len(),
        stats.days_synthesized
    );

    Ok(IngestOutput {
        records,
        ranges,
        encoder,
        filter_id,
        schema,
        stats,
    })
}

/// Complete every entity with zero-valued records between the global first
/// and last day. Input and output are sorted by `(entity_id, day)`.
fn fill_missing_days(records: Vec<Record>) -> (Vec<Record>, usize) {
    let (first_day, last_day) = match (
        records.iter().map(|r| r.day).min(),
        records.iter().map(|r| r.day).max(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return (records, 0),
    };

    let span = (last_day - first_day + 1) as usize;
    let mut filled = Vec::with_capacity(span);
    let mut added = 0;

    let mut start = 0;
    while start < records.len() {
        let entity_id = records[start].entity_id;
        let end = start + records[start..].partition_point(|r| r.entity_id == entity_id);
        let group = &records[start..end];

        let feature_count = group[0].features.len();
        let target_count = group[0].targets.len();
        let mut year = group[0].entity_year;
        let mut next = group.iter().peekable();

        for day in first_day..=last_day {
            match next.next_if(|r| r.day == day) {
                Some(record) => {
                    year = record.entity_year;
                    filled.push(record.clone());
                }
                None => {
                    filled.push(Record::missing_day(
                        entity_id,
                        year,
                        day,
                        feature_count,
                        target_count,
                    ));
                    added += 1;
                }
            }
        }

        start = end;
    }

    (filled, added)
}
