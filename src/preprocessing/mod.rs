//! Record preprocessing.
//!
//! This module contains the conversions applied to raw rows and model
//! outputs around the windowing stage:
//!
//! - **Encoding**: Turn raw fields into numbers
//!   - Categorical string ↔ code tables (codes start at 2)
//!   - Empty numeric fields read as 0
//!   - Dates as days since 1970-01-01
//!
//! - **Normalization**: Min-max scale every input and target column
//!   - Per-column ranges computed during ingestion
//!   - Degenerate ranges scale to 0 and back to `min`
//!
//! - **Averaging**: Smooth staggered predictions
//!   - Sliding FIFO of per-day buckets
//!
//! # Example
//!
//! ```
//! use rebate_dataset::preprocessing::{FeatureRange, MinMaxScaler, Normalizer};
//!
//! let sales = MinMaxScaler::new(FeatureRange::new(0.0, 200.0));
//! let scaled = sales.normalize(50.0);
//! assert_eq!(scaled, 0.25);
//! assert_eq!(sales.denormalize(scaled), 50.0);
//! ```

pub mod averaging;
pub mod encoding;
pub mod normalization;

pub use averaging::{smooth_predictions, SlidingWindowAverager};
pub use encoding::{
    format_epoch_day, parse_epoch_day, parse_number, CategoricalEncoder, ColumnEncoder,
};
pub use normalization::{FeatureRange, FeatureRanges, MinMaxScaler, Normalizer};
