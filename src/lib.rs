//! Rebate Dataset
//!
//! Windowed training batches for recurrent models of daily sales under rebates.
//!
//! # Overview
//!
//! This library turns delimited, per-entity sales/rebate records into
//! normalized tensors for a recurrent sequence model trained elsewhere:
//!
//! - **Ingestion**: categorical encoding, same-day merging, missing-day filling
//! - **Normalization**: per-column min-max ranges, shared by training and evaluation
//! - **Windowing**: three batch iteration strategies behind one state machine
//! - **Evaluation**: held-out pairs, denormalization and averaged predictions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Rebate Dataset                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  schema/           - Row layouts and column roles               │
//! │  ingest            - Reading, encoding, merging, filling        │
//! │  preprocessing/    - Encoding, min-max scaling, averaging       │
//! │  sequence_builder/ - Windowing strategies and iterator state    │
//! │  epoch             - Epoch driver, progress and cancellation    │
//! │  evaluation        - Prediction post-processing                 │
//! │  export/           - NumPy export for Python/PyTorch            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rebate_dataset::prelude::*;
//! use std::io::Cursor;
//!
//! let mut csv = String::from("model;year;date;rebate;sales\n");
//! for day in 1..=28 {
//!     csv.push_str(&format!("Golf;2017;2017-02-{day:02};{};{}\n", day % 3, day * 5));
//! }
//!
//! let pipeline = PipelineBuilder::new().input_days(5).build().unwrap();
//! let mut output = pipeline.prepare_reader(Cursor::new(csv)).unwrap();
//!
//! while output.iterator.has_next() {
//!     let batch = output.iterator.next_default().unwrap();
//!     assert_eq!(batch.steps(), 5);
//! }
//! assert_eq!(output.evaluation.len(), 3);
//! ```

pub mod builder;
pub mod config;
pub mod epoch;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod record;
pub mod schema;
pub mod sequence_builder;
pub mod validation;

// Re-exports - Errors
pub use error::{DatasetError, Result};

// Re-exports - Schema and records
pub use record::Record;
pub use schema::{ColumnRole, ColumnType, RowSchema, SchemaVariant};

// Re-exports - Config
pub use builder::PipelineBuilder;
pub use config::{DatasetConfig, ExperimentMetadata, ExportConfig, TrainingConfig};

// Re-exports - Ingestion
pub use ingest::{ingest_file, ingest_reader, IngestOptions, IngestOutput, IngestStats};

// Re-exports - Preprocessing
pub use preprocessing::{
    smooth_predictions, CategoricalEncoder, FeatureRange, FeatureRanges, MinMaxScaler, Normalizer,
    SlidingWindowAverager,
};

// Re-exports - Sequence Building
pub use sequence_builder::{
    Batch, BatchIterator, EvalPair, EvaluationSet, IteratorKind, IteratorPhase, IteratorState,
    PerEntityBatchIterator, RandomSplitIterator, SequentialWindowIterator, WindowConfig,
    WindowIterator,
};

// Re-exports - Training and evaluation
pub use epoch::{
    CancellationToken, ConsoleProgress, EpochRunner, ProgressCallback, SequenceModel,
    TrainingSummary,
};
pub use evaluation::{evaluate, EvaluationReport, PredictionMode};

// Re-exports - Export
pub use export::{export_to_numpy, ExportMetadata, NumpyExporter};

// Re-exports - Validation
pub use validation::{
    validate_chronology, validate_ingest, validate_no_gaps, validate_ranges, ValidationLevel,
    ValidationResult,
};

// Re-exports - Pipeline
pub use pipeline::{Pipeline, PipelineOutput};
