//! Dataset preparation configuration.
//!
//! One serializable struct describes a complete run: which file to read and
//! how, which windowing strategy to use, how long to train and where to
//! export.
//!
//! # Features
//!
//! - **Unified Configuration**: Single struct combining all pipeline stages
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Ensure configurations are valid before use
//! - **Reproducibility**: Version control friendly configuration files
//!
//! # Example
//!
//! ```toml
//! input_path = "data/sales.csv"
//!
//! [ingest]
//! delimiter = ";"
//! skip_header_lines = 1
//! schema = "Combined"
//! date_format = "%Y-%m-%d"
//! entity_filter = "Golf"
//! restrict_to_filter = true
//! add_missing_days = true
//!
//! [windowing]
//! kind = "sequential"
//! input_days = 22
//! split_ratio = 0.9
//! batch_size = 64
//! seed = 1234
//!
//! [training]
//! epochs = 100
//! prediction_mode = "averaged"
//!
//! [export]
//! output_dir = "output"
//! ```

use crate::error::{DatasetError, Result};
use crate::evaluation::PredictionMode;
use crate::ingest::IngestOptions;
use crate::sequence_builder::{IteratorKind, WindowConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of one dataset preparation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Delimited input file
    pub input_path: PathBuf,

    /// How the input is read and cleaned
    #[serde(default)]
    pub ingest: IngestOptions,

    /// Windowing strategy
    #[serde(default)]
    pub windowing: WindowConfig,

    /// Epoch driver settings
    #[serde(default)]
    pub training: TrainingConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Experiment metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

/// Epoch driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of epochs
    pub epochs: usize,

    /// How per-step predictions are reduced during evaluation
    pub prediction_mode: PredictionMode,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            prediction_mode: PredictionMode::LastStep,
        }
    }
}

impl TrainingConfig {
    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output directory
    pub output_dir: PathBuf,

    /// Write the held-out evaluation pairs
    pub include_evaluation: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            include_evaluation: true,
        }
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Version or git commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Custom tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ExperimentMetadata {
    /// Metadata stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/sales.csv"),
            ingest: IngestOptions::default(),
            windowing: WindowConfig::default(),
            training: TrainingConfig::default(),
            export: ExportConfig::default(),
            metadata: None,
        }
    }
}

impl DatasetConfig {
    /// Default configuration reading `input_path`.
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }

    /// Attach experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Replace the ingestion options.
    pub fn with_ingest(mut self, ingest: IngestOptions) -> Self {
        self.ingest = ingest;
        self
    }

    /// Replace the windowing configuration.
    pub fn with_windowing(mut self, windowing: WindowConfig) -> Self {
        self.windowing = windowing;
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_path.as_os_str().is_empty() {
            return Err("input_path must not be empty".to_string());
        }
        self.ingest.validate()?;
        self.windowing.validate()?;
        self.training.validate()?;
        if self.windowing.kind == IteratorKind::RandomSplit
            && self.training.prediction_mode == PredictionMode::Averaged
        {
            return Err(
                "averaged predictions need consecutive evaluation days; random_split has none"
                    .to_string(),
            );
        }
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).map_err(|e| DatasetError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), toml_string).map_err(|e| DatasetError::io(path.as_ref(), e))
    }

    /// Load and validate configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| DatasetError::io(path.as_ref(), e))?;
        let config: DatasetConfig =
            toml::from_str(&contents).map_err(|e| DatasetError::Serialization(e.to_string()))?;
        config.validate().map_err(DatasetError::InvalidConfig)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| DatasetError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), json_string).map_err(|e| DatasetError::io(path.as_ref(), e))
    }

    /// Load and validate configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| DatasetError::io(path.as_ref(), e))?;
        let config: DatasetConfig = serde_json::from_str(&contents)
            .map_err(|e| DatasetError::Serialization(e.to_string()))?;
        config.validate().map_err(DatasetError::InvalidConfig)?;
        Ok(config)
    }
}
