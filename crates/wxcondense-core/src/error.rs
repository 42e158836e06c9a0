// crates/wxcondense-core/src/error.rs

use polars::prelude::{DataType, PolarsError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("input table is missing expected columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("column {column} has dtype {dtype} which cannot be read as a date")]
    UnsupportedDateType { column: String, dtype: DataType },
}

pub type Result<T> = std::result::Result<T, CleanError>;
