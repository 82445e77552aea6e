//! FILENAME: core/pivot-table/src/definition.rs
//! Pivot Table Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot transform:
//! which fields group the rows, which fields nest into column headers, which
//! fields are aggregated, and how the output header objects are named.
//! Everything here deserializes from the camelCase JSON a table-rendering
//! frontend would send.

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};
use crate::logging::{log_warn, CAT_CONFIG};
use crate::value::FieldValue;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

impl From<String> for Aggregation {
    fn from(value: String) -> Self {
        Aggregation::from(value.as_str())
    }
}

impl From<&str> for Aggregation {
    /// Unknown names fall back to `Sum`.
    fn from(value: &str) -> Self {
        match value {
            "sum" => Aggregation::Sum,
            "mean" => Aggregation::Mean,
            other => {
                log_warn!(CAT_CONFIG, "unsupported aggregation '{}' treated as sum", other);
                Aggregation::Sum
            }
        }
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// A row or column dimension.
///
/// `id` decides group identity, `key` supplies the value shown for the group,
/// `display` is the static header label. `id` and `key` may name the same field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    pub key: String,
    pub display: String,
}

impl Dimension {
    pub fn new(id: impl Into<String>, key: impl Into<String>, display: impl Into<String>) -> Self {
        Dimension {
            id: id.into(),
            key: key.into(),
            display: display.into(),
        }
    }

    /// A dimension whose identity and display value come from the same field.
    pub fn single(field: impl Into<String>, display: impl Into<String>) -> Self {
        let field = field.into();
        Dimension {
            id: field.clone(),
            key: field,
            display: display.into(),
        }
    }
}

/// A numeric field aggregated into leaf cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// Name of the numeric input field.
    pub key: String,

    /// Header label.
    pub display: String,

    /// Aggregation applied when several records fold into one cell.
    #[serde(default)]
    pub calculate: Aggregation,
}

impl Measure {
    pub fn new(key: impl Into<String>, display: impl Into<String>, calculate: Aggregation) -> Self {
        Measure {
            key: key.into(),
            display: display.into(),
            calculate,
        }
    }

    pub fn sum(key: impl Into<String>, display: impl Into<String>) -> Self {
        Measure::new(key, display, Aggregation::Sum)
    }

    pub fn mean(key: impl Into<String>, display: impl Into<String>) -> Self {
        Measure::new(key, display, Aggregation::Mean)
    }
}

// ============================================================================
// HEADER FIELD NAMES
// ============================================================================

/// Property names used when the header tree is rendered, so the output plugs
/// into a table component's schema (e.g. `title` / `dataIndex`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderFieldNames {
    /// Property holding the node's path key.
    pub key: String,
    /// Property holding the node's label.
    pub display: String,
    /// Property holding a leaf's row field name.
    pub data_key: String,
    /// Property holding nested nodes.
    pub children: String,
}

impl Default for HeaderFieldNames {
    fn default() -> Self {
        HeaderFieldNames {
            key: "key".to_string(),
            display: "display".to_string(),
            data_key: "dataKey".to_string(),
            children: "children".to_string(),
        }
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

fn default_cell_value() -> FieldValue {
    FieldValue::Number(0.0)
}

/// The complete configuration of one pivot transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    /// Row grouping dimensions, outermost first. Must not be empty.
    #[serde(default)]
    pub row_dimensions: Vec<Dimension>,

    /// Nested column dimensions, outermost first.
    #[serde(default)]
    pub column_dimensions: Vec<Dimension>,

    /// Aggregated value columns. Must not be empty.
    #[serde(default)]
    pub measures: Vec<Measure>,

    #[serde(default)]
    pub header_field_names: HeaderFieldNames,

    /// Substitute for cells with no contributing record.
    #[serde(default = "default_cell_value")]
    pub default_value: FieldValue,

    /// Merge groups globally and keep rows sorted instead of grouping by adjacency.
    #[serde(default)]
    pub sort_rows: bool,
}

impl PivotConfig {
    pub fn new(row_dimensions: Vec<Dimension>, measures: Vec<Measure>) -> Self {
        PivotConfig {
            row_dimensions,
            column_dimensions: Vec::new(),
            measures,
            header_field_names: HeaderFieldNames::default(),
            default_value: default_cell_value(),
            sort_rows: false,
        }
    }

    pub fn with_column_dimensions(mut self, column_dimensions: Vec<Dimension>) -> Self {
        self.column_dimensions = column_dimensions;
        self
    }

    pub fn with_header_field_names(mut self, names: HeaderFieldNames) -> Self {
        self.header_field_names = names;
        self
    }

    pub fn with_default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_sort_rows(mut self, sort_rows: bool) -> Self {
        self.sort_rows = sort_rows;
        self
    }

    /// Parses a camelCase JSON configuration and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PivotConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_dimensions.is_empty() {
            return Err(PivotError::EmptyRowDimensions);
        }
        if self.measures.is_empty() {
            return Err(PivotError::EmptyMeasures);
        }
        Ok(())
    }
}
