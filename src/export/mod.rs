//! Data Export Module
//!
//! Writes one training epoch and the evaluation set to NumPy files so a
//! Python trainer can consume exactly the batches the iterators produce.
//!
//! # Output Files
//!
//! | File | Shape | Content |
//! |------|-------|---------|
//! | `train_inputs.npy` | `[N, input_width, steps]` | every batch of one epoch, concatenated |
//! | `train_targets.npy` | `[N, target_width, steps]` | matching targets |
//! | `eval_inputs.npy` | `[M, steps, input_width]` | normalized evaluation windows |
//! | `eval_targets.npy` | `[M, target_width]` | raw evaluation targets |
//! | `metadata.json` | | [`ExportMetadata`] |
//!
//! # Example
//!
//! ```ignore
//! use rebate_dataset::export::NumpyExporter;
//!
//! let mut output = pipeline.prepare()?;
//! let metadata = NumpyExporter::new("output").export(&mut output)?;
//! println!("{} training examples", metadata.train_examples);
//! ```

use crate::config::ExportConfig;
use crate::error::{DatasetError, Result};
use crate::pipeline::PipelineOutput;
use crate::preprocessing::FeatureRanges;
use crate::sequence_builder::{BatchIterator, EvaluationSet, IteratorKind};
use ndarray::{Array2, Array3, Axis};
use ndarray_npy::WriteNpyExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Metadata about an exported dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Windowing strategy
    pub strategy: IteratorKind,

    /// Configured window length
    pub input_days: usize,

    /// Time steps per exported example
    pub steps: usize,

    /// Columns per input step
    pub input_width: usize,

    /// Columns per target step
    pub target_width: usize,

    /// Input column names, in tensor order
    pub input_names: Vec<String>,

    /// Target column names, in tensor order
    pub target_names: Vec<String>,

    /// Training examples in one epoch
    pub train_examples: usize,

    /// Batches in one epoch
    pub train_batches: usize,

    /// Example offsets at which recurrent state must be cleared
    pub reset_points: Vec<usize>,

    /// Evaluation pairs
    pub eval_pairs: usize,

    /// Records after ingestion
    pub records: usize,

    /// Records synthesized by missing-day filling
    pub days_synthesized: usize,

    /// Entity the evaluation set was restricted to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_entity: Option<String>,

    /// Min/max of every input and target column
    pub ranges: FeatureRanges,

    /// Export timestamp
    pub export_timestamp: String,
}

/// NumPy exporter - exports to .npy files for Python
#[derive(Debug, Clone)]
pub struct NumpyExporter {
    output_dir: PathBuf,
    include_evaluation: bool,
}

impl NumpyExporter {
    /// Create new NumPy exporter
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            include_evaluation: true,
        }
    }

    /// Create an exporter from the export section of a configuration.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(&config.output_dir).with_evaluation(config.include_evaluation)
    }

    /// Whether the evaluation files are written.
    pub fn with_evaluation(mut self, include: bool) -> Self {
        self.include_evaluation = include;
        self
    }

    /// Target directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export one epoch and the evaluation set.
    ///
    /// The iterator is reset before and after the epoch is drained, so it is
    /// ready for training afterwards.
    pub fn export(&self, output: &mut PipelineOutput) -> Result<ExportMetadata> {
        fs::create_dir_all(&self.output_dir).map_err(|e| DatasetError::io(&self.output_dir, e))?;

        let (train_inputs, train_targets, train_batches) = drain_epoch(&mut output.iterator)?;
        self.write_array("train_inputs.npy", &train_inputs)?;
        self.write_array("train_targets.npy", &train_targets)?;

        let kind = output.iterator.kind();
        let steps = train_inputs.shape()[2];
        if self.include_evaluation {
            let (eval_inputs, eval_targets) = evaluation_arrays(
                &output.evaluation,
                steps,
                output.iterator.input_width(),
                output.iterator.target_width(),
            )?;
            self.write_array("eval_inputs.npy", &eval_inputs)?;
            self.write_array("eval_targets.npy", &eval_targets)?;
        }

        let ingest = &output.ingest;
        let metadata = ExportMetadata {
            strategy: kind,
            input_days: output.evaluation.input_days,
            steps,
            input_width: output.iterator.input_width(),
            target_width: output.iterator.target_width(),
            input_names: ingest.schema.input_names().into_iter().map(String::from).collect(),
            target_names: ingest.schema.target_names().into_iter().map(String::from).collect(),
            train_examples: train_inputs.shape()[0],
            train_batches,
            reset_points: output.iterator.reset_points(),
            eval_pairs: output.evaluation.len(),
            records: ingest.records.len(),
            days_synthesized: ingest.stats.days_synthesized,
            filter_entity: ingest
                .filter_id
                .and_then(|id| ingest.entity_name(id))
                .map(String::from),
            ranges: ingest.ranges.clone(),
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.export_metadata(&metadata)?;

        log::info!(
            "Exported {} training examples ({} batches) and {} evaluation pairs to {}",
            metadata.train_examples,
            metadata.train_batches,
            metadata.eval_pairs,
            self.output_dir.display()
        );

        Ok(metadata)
    }

    fn write_array<A: WriteNpyExt>(&self, name: &str, array: &A) -> Result<()> {
        let path = self.output_dir.join(name);
        let mut file = File::create(&path).map_err(|e| DatasetError::io(&path, e))?;
        array
            .write_npy(&mut file)
            .map_err(|e| DatasetError::Serialization(format!("Failed to write {name}: {e}")))?;

        log::debug!("Exported {}", path.display());
        Ok(())
    }

    fn export_metadata(&self, metadata: &ExportMetadata) -> Result<()> {
        let path = self.output_dir.join("metadata.json");
        let file = File::create(&path).map_err(|e| DatasetError::io(&path, e))?;
        serde_json::to_writer_pretty(file, metadata)
            .map_err(|e| DatasetError::Serialization(format!("Failed to write metadata: {e}")))
    }
}

/// Convenience function for direct export
pub fn export_to_numpy<P: AsRef<Path>>(
    output: &mut PipelineOutput,
    output_dir: P,
) -> Result<ExportMetadata> {
    NumpyExporter::new(output_dir).export(output)
}

/// Concatenate every batch of one epoch along the example axis.
fn drain_epoch<I: BatchIterator + ?Sized>(
    iterator: &mut I,
) -> Result<(Array3<f64>, Array3<f64>, usize)> {
    iterator.reset();
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    while iterator.has_next() {
        let batch = iterator.next_default()?;
        inputs.push(batch.inputs);
        targets.push(batch.targets);
    }
    iterator.reset();

    if inputs.is_empty() {
        return Err(DatasetError::InsufficientData {
            strategy: "export",
            available: 0,
            required: 1,
        });
    }

    let batches = inputs.len();
    let input_views: Vec<_> = inputs.iter().map(|a| a.view()).collect();
    let target_views: Vec<_> = targets.iter().map(|a| a.view()).collect();
    let inputs = ndarray::concatenate(Axis(0), &input_views)
        .map_err(|e| DatasetError::Serialization(e.to_string()))?;
    let targets = ndarray::concatenate(Axis(0), &target_views)
        .map_err(|e| DatasetError::Serialization(e.to_string()))?;

    Ok((inputs, targets, batches))
}

fn evaluation_arrays(
    set: &EvaluationSet,
    steps: usize,
    input_width: usize,
    target_width: usize,
) -> Result<(Array3<f64>, Array2<f64>)> {
    let inputs = if set.is_empty() {
        Array3::zeros((0, steps, input_width))
    } else {
        let views: Vec<_> = set.pairs.iter().map(|p| p.input.view()).collect();
        ndarray::stack(Axis(0), &views).map_err(|e| DatasetError::Serialization(e.to_string()))?
    };

    let flat: Vec<f64> = set
        .pairs
        .iter()
        .flat_map(|p| p.target.iter().copied())
        .collect();
    let targets = Array2::from_shape_vec((set.len(), target_width), flat)
        .map_err(|e| DatasetError::Serialization(e.to_string()))?;

    Ok((inputs, targets))
}
