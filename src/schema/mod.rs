//! Row Schema Module
//!
//! Typed column definitions for the delimited sales/rebate input files.
//!
//! # Design
//!
//! - **Typed**: every column declares how it is converted (number, category, date)
//! - **Role-based**: every column declares what it means for a record
//!   (entity, year, date, feature, target)
//! - **Presets**: the two deployment layouts are available as [`SchemaVariant`]s
//!
//! # Example
//!
//! ```
//! use rebate_dataset::schema::{RowSchema, SchemaVariant};
//!
//! let schema = RowSchema::from_variant(SchemaVariant::Combined);
//! assert_eq!(schema.column_count(), 5);
//! assert_eq!(schema.input_width(), 4);
//! ```

mod column_def;
mod presets;

pub use column_def::{ColumnDef, ColumnRole, ColumnType, RowSchema, RowSchemaBuilder};
pub use presets::SchemaVariant;

/// Current schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default date format of the date column
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version() {
        assert!(!SCHEMA_VERSION.is_empty());
        let schema = RowSchema::from_variant(SchemaVariant::default());
        assert_eq!(schema.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_column_lookup() {
        let schema = RowSchema::from_variant(SchemaVariant::Combined);
        let rebate = schema.get_column("rebate").unwrap();
        assert_eq!(rebate.index, 3);
        assert_eq!(rebate.role, ColumnRole::Feature);
        assert!(schema.get_column("volume").is_none());
    }

    #[test]
    fn test_input_names() {
        let schema = RowSchema::from_variant(SchemaVariant::Combined);
        assert_eq!(
            schema.input_names(),
            vec!["model", "model_year", "invoice_date", "rebate"]
        );
    }
}
