//! FILENAME: core/pivot-table/src/lib.rs
//! Pivot table transform.
//!
//! Converts a flat sequence of records into a hierarchical column header and
//! one output row per unique row-dimension combination, with measure cells
//! aggregated (sum or mean) per column path and missing cells backfilled.
//! The crate does no I/O; callers supply records and configuration and hand
//! the result to a table renderer.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `value`: Field values, identity keys, coercion
//! - `header`: Header tree under construction
//! - `grouping`: Row grouping strategies
//! - `aggregate`: Cell accumulation and default template
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Calculation engine (HOW we calculate)

pub mod aggregate;
pub mod definition;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod header;
pub mod logging;
pub mod value;
pub mod view;

pub use aggregate::MeasureCell;
pub use definition::*;
pub use engine::{calculate_pivot, calculate_pivot_json, PivotCalculator};
pub use error::{PivotError, Result};
pub use grouping::{AdjacencyGrouping, GroupingStrategy, SortedInsertionGrouping};
pub use value::{records_from_json, FieldValue, Record, RecordSource};
pub use view::*;
