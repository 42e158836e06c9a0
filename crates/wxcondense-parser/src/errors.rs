use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("data row {line_index} invalid: {message}")]
    DataRow { line_index: usize, message: String },

    #[error("file did not contain a header row")]
    MissingHeader,

    #[error("file did not contain any data rows")]
    EmptyData,

    #[error("failed to build observation frame: {0}")]
    Polars(#[from] PolarsError),
}
