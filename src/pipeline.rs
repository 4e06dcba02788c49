//! Unified Pipeline for rebate dataset preparation
//!
//! Connects every stage behind one configuration:
//! - Ingestion (encoding, filtering, same-day merging, missing-day filling)
//! - Validation of the cleaned records
//! - Record selection and iterator construction for the chosen strategy
//! - Evaluation set construction
//! - Optional epoch driving, evaluation and NumPy export
//!
//! # Architecture
//!
//! ```text
//! input file → ingest_file → IngestOutput ──► validate_ingest → ValidationResult
//!                                 │
//!                         select_records (strategy)
//!                                 ↓
//!                 WindowIterator ──► EpochRunner ──► SequenceModel
//!                        │
//!                        └──► EvaluationSet ──► evaluate → EvaluationReport
//! ```
//!
//! # Record Selection
//!
//! | Strategy | Records handed to the iterator |
//! |----------|--------------------------------|
//! | `Sequential` | the filter entity, or the only entity |
//! | `RandomSplit` | every ingested record |
//! | `PerEntity` | every ingested record, entity by entity |
//!
//! # Example
//!
//! ```ignore
//! use rebate_dataset::prelude::*;
//!
//! let pipeline = PipelineBuilder::new()
//!     .input("data/sales.csv")
//!     .entity_filter("Golf")
//!     .input_days(22)
//!     .build()?;
//!
//! let mut output = pipeline.prepare()?;
//! let summary = pipeline.train(&mut output, &mut model)?;
//! ```
//!
//! Feature ranges are computed over every ingested record, so the evaluation
//! tail contributes to the normalization of the training windows. Callers that
//! need strictly train-only scaling can recompute ranges with
//! [`FeatureRanges::from_records`](crate::preprocessing::FeatureRanges::from_records).

use crate::config::DatasetConfig;
use crate::epoch::{ConsoleProgress, EpochRunner, SequenceModel, TrainingSummary};
use crate::error::{DatasetError, Result};
use crate::evaluation::{evaluate, EvaluationReport};
use crate::export::{ExportMetadata, NumpyExporter};
use crate::ingest::{ingest_file, ingest_reader, IngestOutput};
use crate::record::Record;
use crate::sequence_builder::{BatchIterator, EvaluationSet, IteratorKind, WindowIterator};
use crate::validation::{validate_ingest, ValidationResult};
use std::io::BufRead;
use std::sync::Arc;

/// Output from pipeline preparation
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Cleaned records, ranges, encoder and ingestion counters
    pub ingest: IngestOutput,

    /// Training iterator for the configured strategy
    pub iterator: WindowIterator,

    /// Held-out evaluation pairs
    pub evaluation: EvaluationSet,

    /// Checks run over the cleaned records
    pub validation: ValidationResult,
}

impl PipelineOutput {
    /// Records handed to the iterator.
    pub fn record_count(&self) -> usize {
        self.ingest.records.len()
    }
}

/// Dataset preparation pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DatasetConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn from_config(config: DatasetConfig) -> Result<Self> {
        config.validate().map_err(DatasetError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Ingest the configured input file and build the iterator.
    pub fn prepare(&self) -> Result<PipelineOutput> {
        let ingest = ingest_file(&self.config.input_path, &self.config.ingest)?;
        self.assemble(ingest)
    }

    /// Same as [`prepare`](Self::prepare), reading from any buffered source.
    pub fn prepare_reader<R: BufRead>(&self, reader: R) -> Result<PipelineOutput> {
        let ingest = ingest_reader(reader, &self.config.ingest)?;
        self.assemble(ingest)
    }

    fn assemble(&self, ingest: IngestOutput) -> Result<PipelineOutput> {
        let validation = validate_ingest(&ingest);
        if validation.has_errors() {
            return Err(DatasetError::InvalidConfig(format!(
                "ingested records failed validation: {}",
                validation.errors().join("; ")
            )));
        }
        for warning in validation.warnings() {
            log::warn!("{}", warning);
        }
        if let (Some(name), None) = (&self.config.ingest.entity_filter, ingest.filter_id) {
            return Err(DatasetError::InvalidConfig(format!(
                "entity filter '{}' matches no row of the input",
                name
            )));
        }

        let windowing = &self.config.windowing;
        let records = select_records(&ingest, windowing.kind)?;
        log::debug!(
            "Ranges span all {} ingested records; evaluation records contribute to scaling",
            ingest.records.len()
        );

        let iterator = WindowIterator::new(
            records,
            ingest.ranges.clone(),
            windowing,
            ingest.filter_id,
        )?;
        let evaluation = iterator.evaluation_set();

        log::info!(
            "Prepared {} iterator: {} training examples per epoch, {} evaluation pairs",
            windowing.kind.name(),
            iterator.total_examples(),
            evaluation.len()
        );

        Ok(PipelineOutput {
            ingest,
            iterator,
            evaluation,
            validation,
        })
    }

    /// Epoch runner configured from the training section, logging progress.
    pub fn epoch_runner(&self) -> EpochRunner {
        EpochRunner::new(self.config.training.epochs)
            .with_progress_callback(Box::new(ConsoleProgress::new()))
    }

    /// Drive the configured number of epochs over the prepared iterator.
    pub fn train<M: SequenceModel + ?Sized>(
        &self,
        output: &mut PipelineOutput,
        model: &mut M,
    ) -> Result<TrainingSummary> {
        self.epoch_runner().run(&mut output.iterator, model)
    }

    /// Evaluate model output on the prepared evaluation set.
    pub fn evaluate(
        &self,
        output: &PipelineOutput,
        predictions: &[Vec<f64>],
        target: usize,
    ) -> Result<EvaluationReport> {
        evaluate(
            &output.evaluation,
            predictions,
            target,
            self.config.training.prediction_mode,
        )
    }

    /// Export one epoch and the evaluation set to the configured directory.
    pub fn export(&self, output: &mut PipelineOutput) -> Result<ExportMetadata> {
        NumpyExporter::from_config(&self.config.export).export(output)
    }
}

/// Records handed to the iterator of a strategy.
///
/// Sequential windows never cross entities, so that strategy needs a filter
/// entity unless the input holds a single one.
pub fn select_records(ingest: &IngestOutput, kind: IteratorKind) -> Result<Arc<[Record]>> {
    match kind {
        IteratorKind::Sequential => {
            let entity = match ingest.filter_id {
                Some(id) => id,
                None => match ingest.entity_ids().as_slice() {
                    [only] => *only,
                    ids => {
                        return Err(DatasetError::InvalidConfig(format!(
                            "sequential windowing needs a single entity, found {}; set ingest.entity_filter",
                            ids.len()
                        )))
                    }
                },
            };
            Ok(ingest.records_for(entity).into())
        }
        IteratorKind::RandomSplit | IteratorKind::PerEntity => {
            Ok(ingest.records.as_slice().into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence_builder::WindowConfig;
    use std::io::Cursor;

    fn csv(entities: &[&str], days: u32) -> String {
        let mut text = String::from("entity;year;date;rebate;sales\n");
        for entity in entities {
            for d in 1..=days {
                text.push_str(&format!(
                    "{};2017;2017-01-{:02};{};{}\n",
                    entity,
                    d,
                    d % 4,
                    d * 10
                ));
            }
        }
        text
    }

    fn pipeline(kind: IteratorKind, input_days: usize) -> Pipeline {
        let config = DatasetConfig::new("unused.csv")
            .with_windowing(WindowConfig::new(kind, input_days));
        Pipeline::from_config(config).unwrap()
    }

    #[test]
    fn test_sequential_single_entity() {
        let output = pipeline(IteratorKind::Sequential, 3)
            .prepare_reader(Cursor::new(csv(&["Golf"], 20)))
            .unwrap();

        // train_len = round(20 * 0.9) = 18, windows = 18 - 4
        assert_eq!(output.iterator.total_examples(), 14);
        assert_eq!(output.evaluation.len(), 2);
        assert!(!output.validation.has_errors());
    }

    #[test]
    fn test_sequential_needs_filter_with_many_entities() {
        let err = pipeline(IteratorKind::Sequential, 3)
            .prepare_reader(Cursor::new(csv(&["Golf", "Polo"], 20)))
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidConfig(_)));
    }

    #[test]
    fn test_sequential_uses_filter_entity() {
        let mut config = DatasetConfig::new("unused.csv")
            .with_windowing(WindowConfig::new(IteratorKind::Sequential, 3));
        config.ingest.entity_filter = Some("Polo".to_string());
        let pipeline = Pipeline::from_config(config).unwrap();

        let output = pipeline
            .prepare_reader(Cursor::new(csv(&["Golf", "Polo"], 20)))
            .unwrap();
        let polo = output.ingest.filter_id.unwrap();
        assert!(output.evaluation.pairs.iter().all(|p| p.entity_id == polo));
    }

    #[test]
    fn test_unmatched_filter_aborts_every_strategy() {
        for kind in [
            IteratorKind::Sequential,
            IteratorKind::RandomSplit,
            IteratorKind::PerEntity,
        ] {
            let mut config =
                DatasetConfig::new("unused.csv").with_windowing(WindowConfig::new(kind, 3));
            config.ingest.entity_filter = Some("Polo".to_string());
            let pipeline = Pipeline::from_config(config).unwrap();

            let err = pipeline
                .prepare_reader(Cursor::new(csv(&["Golf"], 20)))
                .unwrap_err();
            assert!(
                matches!(&err, DatasetError::InvalidConfig(msg) if msg.contains("Polo")),
                "{kind:?}: {err}"
            );
        }
    }

    #[test]
    fn test_per_entity_uses_all_records() {
        let output = pipeline(IteratorKind::PerEntity, 3)
            .prepare_reader(Cursor::new(csv(&["Golf", "Polo"], 20)))
            .unwrap();

        assert_eq!(output.record_count(), 40);
        assert_eq!(output.iterator.total_examples(), 36);
        assert_eq!(output.iterator.reset_points(), vec![0, 18]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DatasetConfig::default();
        config.windowing.batch_size = 0;
        assert!(matches!(
            Pipeline::from_config(config),
            Err(DatasetError::InvalidConfig(_))
        ));
    }
}
