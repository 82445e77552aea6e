//! FILENAME: core/pivot-table/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("rowDimensions can not be empty")]
    EmptyRowDimensions,

    #[error("measures can not be empty")]
    EmptyMeasures,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PivotError>;
