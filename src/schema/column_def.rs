//! Column definitions and row schema types.
//!
//! This module defines the core types for input row metadata:
//! - `ColumnType`: How a raw field is turned into a number
//! - `ColumnRole`: What the column means for a `Record`
//! - `ColumnDef`: Metadata for a single column
//! - `RowSchema`: Ordered collection of column definitions

use super::presets::SchemaVariant;
use serde::{Deserialize, Serialize};

/// How a raw field is converted into a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Parsed as a floating point number; empty fields become 0
    Number,

    /// Categorical value, replaced by a dense integer code
    String,

    /// Calendar date, converted to days since 1970-01-01
    Date,

    /// Not used; always 0
    Ignore,
}

/// Meaning of a column when building a [`crate::Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Entity name (e.g. product model)
    Entity,

    /// Entity year (e.g. model year)
    Year,

    /// Transaction date
    Date,

    /// Measurement feature fed to the model (e.g. rebate)
    Feature,

    /// Value the model predicts (e.g. sales)
    Target,

    /// Parsed but dropped
    Ignored,
}

/// Definition of a single input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (e.g. "model", "rebate")
    pub name: String,

    /// Position in the delimited row
    pub index: usize,

    /// Conversion applied to the raw field
    pub column_type: ColumnType,

    /// Meaning for record construction
    pub role: ColumnRole,

    /// Human-readable description
    pub description: String,
}

impl ColumnDef {
    /// Create a new column definition.
    pub fn new(
        name: impl Into<String>,
        index: usize,
        column_type: ColumnType,
        role: ColumnRole,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            column_type,
            role,
            description: description.into(),
        }
    }
}

/// Ordered schema of one delimited input row.
///
/// Exactly one entity, year and date column; at least one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSchema {
    /// Schema version
    pub version: String,

    /// Column definitions in row order
    columns: Vec<ColumnDef>,
}

impl RowSchema {
    /// Create a schema from a deployment variant.
    pub fn from_variant(variant: SchemaVariant) -> Self {
        variant.build_schema()
    }

    /// Number of fields every row must have.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column types in row order.
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    /// All column definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Index of the entity column.
    pub fn entity_index(&self) -> usize {
        self.first_with_role(ColumnRole::Entity)
    }

    /// Index of the year column.
    pub fn year_index(&self) -> usize {
        self.first_with_role(ColumnRole::Year)
    }

    /// Index of the date column.
    pub fn date_index(&self) -> usize {
        self.first_with_role(ColumnRole::Date)
    }

    /// Indices of measurement feature columns, in row order.
    pub fn feature_indices(&self) -> Vec<usize> {
        self.indices_with_role(ColumnRole::Feature)
    }

    /// Indices of target columns, in row order.
    pub fn target_indices(&self) -> Vec<usize> {
        self.indices_with_role(ColumnRole::Target)
    }

    /// Width of the model input vector: entity, year, day plus features.
    pub fn input_width(&self) -> usize {
        3 + self.feature_indices().len()
    }

    /// Number of target columns.
    pub fn target_width(&self) -> usize {
        self.target_indices().len()
    }

    /// Names of the model input columns, in input vector order.
    pub fn input_names(&self) -> Vec<&str> {
        let mut names = vec![
            self.columns[self.entity_index()].name.as_str(),
            self.columns[self.year_index()].name.as_str(),
            self.columns[self.date_index()].name.as_str(),
        ];
        names.extend(
            self.feature_indices()
                .into_iter()
                .map(|i| self.columns[i].name.as_str()),
        );
        names
    }

    /// Names of the target columns.
    pub fn target_names(&self) -> Vec<&str> {
        self.target_indices()
            .into_iter()
            .map(|i| self.columns[i].name.as_str())
            .collect()
    }

    fn first_with_role(&self, role: ColumnRole) -> usize {
        // Construction guarantees each key role is present exactly once.
        self.columns
            .iter()
            .position(|c| c.role == role)
            .unwrap_or(0)
    }

    fn indices_with_role(&self, role: ColumnRole) -> Vec<usize> {
        self.columns
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.index)
            .collect()
    }
}

/// Builder for custom row schemas.
#[derive(Debug, Default)]
pub struct RowSchemaBuilder {
    columns: Vec<ColumnDef>,
}

impl RowSchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; its index is its position.
    pub fn column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        role: ColumnRole,
        description: impl Into<String>,
    ) -> Self {
        let index = self.columns.len();
        self.columns
            .push(ColumnDef::new(name, index, column_type, role, description));
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> Result<RowSchema, String> {
        for role in [ColumnRole::Entity, ColumnRole::Year, ColumnRole::Date] {
            let count = self.columns.iter().filter(|c| c.role == role).count();
            if count != 1 {
                return Err(format!(
                    "schema needs exactly one {role:?} column, found {count}"
                ));
            }
        }

        if !self.columns.iter().any(|c| c.role == ColumnRole::Target) {
            return Err("schema needs at least one Target column".to_string());
        }

        for column in &self.columns {
            let expected = match column.role {
                ColumnRole::Entity => Some(ColumnType::String),
                ColumnRole::Date => Some(ColumnType::Date),
                ColumnRole::Year | ColumnRole::Feature | ColumnRole::Target => {
                    Some(ColumnType::Number)
                }
                ColumnRole::Ignored => None,
            };
            if let Some(expected) = expected {
                if column.column_type != expected {
                    return Err(format!(
                        "column '{}' with role {:?} must be {:?}, got {:?}",
                        column.name, column.role, expected, column.column_type
                    ));
                }
            }
        }

        Ok(RowSchema {
            version: super::SCHEMA_VERSION.to_string(),
            columns: self.columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_missing_roles() {
        let result = RowSchemaBuilder::new()
            .column("model", ColumnType::String, ColumnRole::Entity, "")
            .column("sales", ColumnType::Number, ColumnRole::Target, "")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_wrong_type() {
        let result = RowSchemaBuilder::new()
            .column("model", ColumnType::Number, ColumnRole::Entity, "")
            .column("year", ColumnType::Number, ColumnRole::Year, "")
            .column("date", ColumnType::Date, ColumnRole::Date, "")
            .column("sales", ColumnType::Number, ColumnRole::Target, "")
            .build();
        assert!(result.unwrap_err().contains("model"));
    }

    #[test]
    fn test_custom_schema_with_ignored_column() {
        let schema = RowSchemaBuilder::new()
            .column("model", ColumnType::String, ColumnRole::Entity, "")
            .column("dealer", ColumnType::Ignore, ColumnRole::Ignored, "")
            .column("year", ColumnType::Number, ColumnRole::Year, "")
            .column("date", ColumnType::Date, ColumnRole::Date, "")
            .column("sales", ColumnType::Number, ColumnRole::Target, "")
            .build()
            .unwrap();

        assert_eq!(schema.column_count(), 5);
        assert_eq!(schema.year_index(), 2);
        assert_eq!(schema.date_index(), 3);
        assert!(schema.feature_indices().is_empty());
        assert_eq!(schema.input_width(), 3);
        assert_eq!(schema.target_indices(), vec![4]);
    }
}
