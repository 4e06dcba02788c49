//! Fluent builder for pipeline configuration.
//!
//! This module provides a builder pattern for constructing a
//! [`DatasetConfig`] in a clean, readable manner and validating it before a
//! [`Pipeline`] is created.
//!
//! # Quick Start
//!
//! ```ignore
//! use rebate_dataset::PipelineBuilder;
//!
//! // Simple usage with defaults
//! let pipeline = PipelineBuilder::new()
//!     .input("data/sales.csv")
//!     .build()?;
//!
//! let output = pipeline.prepare()?;
//! ```
//!
//! # Strategy Reference
//!
//! | Strategy | Steps | Split | Reset signal |
//! |----------|-------|-------|--------------|
//! | `Sequential` | `input_days` | chronological, `split_ratio` | never |
//! | `RandomSplit` | `input_days` | Bernoulli(0.5), seeded | never |
//! | `PerEntity` | 1 | chronological per entity | after every entity |
//!
//! # Common Configurations
//!
//! ## One model, one year of one entity
//!
//! ```ignore
//! let pipeline = PipelineBuilder::new()
//!     .input("data/sales.csv")
//!     .entity_filter("Golf")
//!     .restrict_to_filter(true)
//!     .add_missing_days(true)
//!     .input_days(22)
//!     .build()?;
//! ```
//!
//! ## Entity-by-entity training on the six-column layout
//!
//! ```ignore
//! let pipeline = PipelineBuilder::new()
//!     .input("data/sales_split.csv")
//!     .schema(SchemaVariant::Split)
//!     .strategy(IteratorKind::PerEntity)
//!     .batch_size(32)
//!     .build()?;
//! ```

use crate::config::{DatasetConfig, ExperimentMetadata};
use crate::error::{DatasetError, Result};
use crate::evaluation::PredictionMode;
use crate::pipeline::Pipeline;
use crate::schema::SchemaVariant;
use crate::sequence_builder::IteratorKind;
use std::path::PathBuf;

/// Fluent builder for creating pipeline configurations.
///
/// Every setter overrides one field of the default [`DatasetConfig`];
/// [`build_config`](Self::build_config) validates the result.
///
/// # Example
///
/// ```
/// use rebate_dataset::builder::PipelineBuilder;
/// use rebate_dataset::sequence_builder::IteratorKind;
///
/// let config = PipelineBuilder::new()
///     .input("data/sales.csv")
///     .strategy(IteratorKind::RandomSplit)
///     .input_days(7)
///     .seed(42)
///     .build_config()
///     .unwrap();
///
/// assert_eq!(config.windowing.input_days, 7);
/// assert_eq!(config.windowing.seed, 42);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    config: DatasetConfig,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Create a new pipeline builder with default settings.
    ///
    /// Default configuration:
    /// - `;`-delimited, one header line, five-column layout
    /// - Sequential windows of 22 days, 90% training split
    /// - Batches of 64, 100 epochs
    pub fn new() -> Self {
        Self {
            config: DatasetConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: DatasetConfig) -> Self {
        Self { config }
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Set the input file.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    /// Set the field delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.ingest.delimiter = delimiter.into();
        self
    }

    /// Set the number of header lines to skip.
    pub fn skip_header_lines(mut self, lines: usize) -> Self {
        self.config.ingest.skip_header_lines = lines;
        self
    }

    /// Set the row layout.
    pub fn schema(mut self, schema: SchemaVariant) -> Self {
        self.config.ingest.schema = schema;
        self
    }

    /// Set the chrono format of the date column.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.ingest.date_format = format.into();
        self
    }

    /// Set the entity whose code is reported as the filter id.
    pub fn entity_filter(mut self, entity: impl Into<String>) -> Self {
        self.config.ingest.entity_filter = Some(entity.into());
        self
    }

    /// Drop rows of every entity except the filter entity.
    pub fn restrict_to_filter(mut self, restrict: bool) -> Self {
        self.config.ingest.restrict_to_filter = restrict;
        self
    }

    /// Fill every missing day with zero-valued records.
    pub fn add_missing_days(mut self, enabled: bool) -> Self {
        self.config.ingest.add_missing_days = enabled;
        self
    }

    // ========================================================================
    // Windowing
    // ========================================================================

    /// Set the windowing strategy.
    pub fn strategy(mut self, kind: IteratorKind) -> Self {
        self.config.windowing.kind = kind;
        self
    }

    /// Set the window length in days.
    pub fn input_days(mut self, days: usize) -> Self {
        self.config.windowing.input_days = days;
        self
    }

    /// Set the fraction of records used for training.
    pub fn split_ratio(mut self, ratio: f64) -> Self {
        self.config.windowing.split_ratio = ratio;
        self
    }

    /// Set the default batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.windowing.batch_size = size;
        self
    }

    /// Set the random split seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.windowing.seed = seed;
        self
    }

    // ========================================================================
    // Training, evaluation and export
    // ========================================================================

    /// Set the number of epochs.
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.config.training.epochs = epochs;
        self
    }

    /// Set how evaluation predictions are reduced.
    pub fn prediction_mode(mut self, mode: PredictionMode) -> Self {
        self.config.training.prediction_mode = mode;
        self
    }

    /// Set the export directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export.output_dir = dir.into();
        self
    }

    /// Attach experiment metadata.
    pub fn metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.config.metadata = Some(metadata);
        self
    }

    /// Build and validate the configuration.
    pub fn build_config(self) -> std::result::Result<DatasetConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.build_config().map_err(DatasetError::InvalidConfig)?;
        Pipeline::from_config(config)
    }

    /// Human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let ingest = &self.config.ingest;
        let windowing = &self.config.windowing;

        let filter_desc = match (&ingest.entity_filter, ingest.restrict_to_filter) {
            (None, _) => "none".to_string(),
            (Some(entity), false) => format!("{entity} (evaluation only)"),
            (Some(entity), true) => format!("{entity} (restricted)"),
        };

        format!(
            "PipelineBuilder Summary:\n\
             - Input: {}\n\
             - Layout: {} ('{}'-delimited, {} header lines)\n\
             - Entity filter: {}\n\
             - Missing days: {}\n\
             - Strategy: {} ({} steps, split {}, batch {})\n\
             - Epochs: {}",
            self.config.input_path.display(),
            ingest.schema.name(),
            ingest.delimiter,
            ingest.skip_header_lines,
            filter_desc,
            if ingest.add_missing_days {
                "filled"
            } else {
                "kept"
            },
            windowing.kind.name(),
            windowing.steps(),
            windowing.split_ratio,
            windowing.batch_size,
            self.config.training.epochs,
        )
    }
}
