//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for
//! ergonomic usage of the library.
//!
//! # Usage
//!
//! ```ignore
//! use rebate_dataset::prelude::*;
//!
//! let pipeline = PipelineBuilder::new().input("data/sales.csv").build()?;
//! let mut output = pipeline.prepare()?;
//! let summary = pipeline.train(&mut output, &mut model)?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`Pipeline`] - Main preparation pipeline
//! - [`PipelineBuilder`] - Fluent configuration builder
//! - [`DatasetConfig`] - Serializable run configuration
//! - [`PipelineOutput`] - Ingestion result, iterator and evaluation set
//!
//! ## Windowing
//! - [`BatchIterator`] - Iterator contract (must be in scope to call `next_batch`)
//! - [`WindowIterator`] - Strategy selected by [`IteratorKind`]
//! - [`Batch`] - Training batch tensors
//! - [`EvaluationSet`] - Held-out pairs
//!
//! ## Training
//! - [`SequenceModel`] - Implemented by the external model
//! - [`EpochRunner`] - Epoch driver with progress and cancellation
//! - [`CancellationToken`] - Cooperative cancellation flag
//!
//! ## Normalization
//! - [`Normalizer`] - Normalization trait
//! - [`FeatureRanges`] - Per-column min/max

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::builder::PipelineBuilder;
pub use crate::config::{DatasetConfig, ExperimentMetadata};
pub use crate::pipeline::{Pipeline, PipelineOutput};

// ============================================================================
// Ingestion
// ============================================================================

pub use crate::ingest::{IngestOptions, IngestOutput};
pub use crate::record::Record;
pub use crate::schema::SchemaVariant;

// ============================================================================
// Windowing
// ============================================================================

pub use crate::sequence_builder::{
    Batch, BatchIterator, EvaluationSet, IteratorKind, WindowConfig, WindowIterator,
};

// ============================================================================
// Training and Evaluation
// ============================================================================

pub use crate::epoch::{CancellationToken, EpochRunner, ProgressCallback, SequenceModel};
pub use crate::evaluation::{EvaluationReport, PredictionMode};

// ============================================================================
// Normalization
// ============================================================================

pub use crate::preprocessing::{FeatureRange, FeatureRanges, Normalizer};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{DatasetError, Result};
