//! Dataset Preparation Tool
//!
//! Configuration-driven tool that ingests a sales/rebate file, validates the
//! cleaned records and exports one training epoch plus the evaluation set as
//! NumPy arrays.
//!
//! # Output Format
//!
//! - **Training**: `train_inputs.npy` / `train_targets.npy` - Shape `[N, width, steps]`
//! - **Evaluation**: `eval_inputs.npy` - Shape `[M, steps, width]`, `eval_targets.npy` - Shape `[M, targets]`
//! - **Metadata**: `metadata.json` - strategy, ranges, reset points
//!
//! # Usage
//!
//! ```bash
//! # From TOML config
//! cargo run --release --bin prepare_dataset -- --config configs/golf.toml
//!
//! # Override the output directory
//! cargo run --release --bin prepare_dataset -- --config configs/golf.toml --output out/golf
//!
//! # Generate sample config
//! cargo run --release --bin prepare_dataset -- --generate-config golf.toml
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to see ingestion and export progress.

use rebate_dataset::config::{DatasetConfig, ExperimentMetadata};
use rebate_dataset::sequence_builder::BatchIterator;
use rebate_dataset::{Pipeline, PredictionMode, SchemaVariant};
use std::path::PathBuf;

/// Main entry point for the preparation tool
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a path argument");
                std::process::exit(1);
            }
            let output = match args.get(3).map(String::as_str) {
                Some("--output") => match args.get(4) {
                    Some(dir) => Some(PathBuf::from(dir)),
                    None => {
                        eprintln!("Error: --output requires a directory argument");
                        std::process::exit(1);
                    }
                },
                Some(other) => {
                    eprintln!("Unknown argument: {}", other);
                    std::process::exit(1);
                }
                None => None,
            };
            run_from_config(&args[2], output);
        }
        "--generate-config" => {
            if args.len() < 3 {
                eprintln!("Error: --generate-config requires a path argument");
                std::process::exit(1);
            }
            generate_sample_config(&args[2]);
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown argument: {}", args[1]);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  \
         {program} --config <file.toml> [--output <dir>]\n  \
         {program} --generate-config <file.toml>\n  \
         {program} --help"
    );
}

fn generate_sample_config(path: &str) {
    let mut config = DatasetConfig::new("data/sales.csv")
        .with_metadata(ExperimentMetadata::new("golf_rebates"));
    config.ingest.schema = SchemaVariant::Combined;
    config.ingest.entity_filter = Some("Golf".to_string());
    config.ingest.add_missing_days = true;
    config.training.prediction_mode = PredictionMode::Averaged;

    match config.save_toml(path) {
        Ok(()) => {
            println!("Generated sample config: {}", path);
            println!("\nEdit the following fields before running:");
            println!("  - input_path: delimited sales/rebate file");
            println!("  - ingest.entity_filter: entity to train and evaluate on");
            println!("  - windowing.kind: sequential, random_split or per_entity");
            println!("  - export.output_dir: where the .npy files are written");
        }
        Err(e) => {
            eprintln!("Error generating config: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_from_config(config_path: &str, output: Option<PathBuf>) {
    let mut config = match DatasetConfig::load_toml(config_path) {
        Ok(config) => {
            println!("Loaded configuration: {}", config_path);
            config
        }
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(dir) = output {
        config.export.output_dir = dir;
    }

    print_config_summary(&config);

    let pipeline = match Pipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut prepared = match pipeline.prepare() {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Preparation failed: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", prepared.validation);
    let stats = &prepared.ingest.stats;
    println!(
        "Ingested {} rows ({} merged, {} filtered, {} skipped, {} days synthesized)",
        stats.rows_accepted,
        stats.rows_merged,
        stats.rows_filtered,
        stats.skipped.len(),
        stats.days_synthesized
    );
    println!(
        "Training examples per epoch: {}, evaluation pairs: {}",
        prepared.iterator.total_examples(),
        prepared.evaluation.len()
    );

    match pipeline.export(&mut prepared) {
        Ok(metadata) => println!(
            "Exported {} batches to {}",
            metadata.train_batches,
            pipeline.config().export.output_dir.display()
        ),
        Err(e) => {
            eprintln!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_config_summary(config: &DatasetConfig) {
    let windowing = &config.windowing;
    println!("Configuration Summary");
    if let Some(metadata) = &config.metadata {
        println!("  Experiment: {}", metadata.name);
    }
    println!("  Input:      {}", config.input_path.display());
    println!("  Layout:     {}", config.ingest.schema.name());
    println!(
        "  Filter:     {}",
        config.ingest.entity_filter.as_deref().unwrap_or("none")
    );
    println!(
        "  Strategy:   {} ({} steps, split {}, batch {})",
        windowing.kind.name(),
        windowing.steps(),
        windowing.split_ratio,
        windowing.batch_size
    );
    println!("  Output:     {}", config.export.output_dir.display());
    println!();
}
