//! Deployment schema presets.
//!
//! Two input layouts exist in the field: one where sales are reported as a
//! single column, and one where sales with and without the rebate are
//! reported separately.

use super::column_def::{ColumnRole, ColumnType, RowSchema, RowSchemaBuilder};
use serde::{Deserialize, Serialize};

/// Known input row layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SchemaVariant {
    /// `entity;year;date;rebate;sales`
    ///
    /// - Targets: 1 (total sales)
    #[default]
    Combined,

    /// `entity;year;date;rebate;sales_with_rebate;sales_without_rebate`
    ///
    /// - Targets: 2
    Split,
}

impl SchemaVariant {
    /// Number of columns in a row of this variant.
    pub fn column_count(&self) -> usize {
        match self {
            SchemaVariant::Combined => 5,
            SchemaVariant::Split => 6,
        }
    }

    /// Short name used in logs and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaVariant::Combined => "combined",
            SchemaVariant::Split => "split",
        }
    }

    /// Build the row schema for this variant.
    pub fn build_schema(&self) -> RowSchema {
        let builder = RowSchemaBuilder::new()
            .column(
                "model",
                ColumnType::String,
                ColumnRole::Entity,
                "Entity (product model) name",
            )
            .column(
                "model_year",
                ColumnType::Number,
                ColumnRole::Year,
                "Model year",
            )
            .column(
                "invoice_date",
                ColumnType::Date,
                ColumnRole::Date,
                "Invoice date",
            )
            .column(
                "rebate",
                ColumnType::Number,
                ColumnRole::Feature,
                "Rebate of the day in percent",
            );

        let builder = match self {
            SchemaVariant::Combined => {
                builder.column("sales", ColumnType::Number, ColumnRole::Target, "Sales")
            }
            SchemaVariant::Split => builder
                .column(
                    "sales_with_rebate",
                    ColumnType::Number,
                    ColumnRole::Target,
                    "Sales with rebate",
                )
                .column(
                    "sales_without_rebate",
                    ColumnType::Number,
                    ColumnRole::Target,
                    "Sales without rebate",
                ),
        };

        // Both layouts satisfy every builder rule.
        match builder.build() {
            Ok(schema) => schema,
            Err(msg) => unreachable!("preset schema is invalid: {msg}"),
        }
    }
}
