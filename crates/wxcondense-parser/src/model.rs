use polars::prelude::DataFrame;

/// A station file as read from disk: every column is nullable text.
#[derive(Debug, Clone)]
pub struct RawObservations {
    pub df: DataFrame,
    /// blake3 hex digest of the source bytes.
    pub content_hash: String,
    /// Data rows in the file before any report-type filtering.
    pub rows_read: usize,
}

impl RawObservations {
    pub fn height(&self) -> usize {
        self.df.height()
    }
}
