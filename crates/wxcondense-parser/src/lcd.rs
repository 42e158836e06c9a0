use blake3::Hasher;
use polars::prelude::*;
use tracing::debug;

use crate::errors::ParserError;
use crate::model::RawObservations;

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Keep only rows whose `REPORT_TYPE` matches after trimming, e.g. `SOD`
    /// for the daily summaries in an LCD export. Files without that column
    /// are read unfiltered.
    pub report_type: Option<String>,
}

const REPORT_TYPE_COLUMN: &str = "REPORT_TYPE";

pub fn parse_lcd_csv(content: &str) -> Result<RawObservations, ParserError> {
    parse_lcd_csv_with(content, &ReadOptions::default())
}

/// Reads a headered LCD export into a text-only frame. Empty fields become
/// nulls; any other field, including whitespace, is kept verbatim.
pub fn parse_lcd_csv_with(
    content: &str,
    options: &ReadOptions,
) -> Result<RawObservations, ParserError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|source| ParserError::Csv { source })?
        .clone();
    if header.is_empty() {
        return Err(ParserError::MissingHeader);
    }

    let report_type_idx = header
        .iter()
        .position(|name| name.trim() == REPORT_TYPE_COLUMN);
    let wanted_report = options
        .report_type
        .as_deref()
        .map(str::trim)
        .filter(|_| report_type_idx.is_some());

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
    let mut rows_read = 0usize;

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ParserError::Csv { source })?;
        rows_read += 1;

        if record.len() != header.len() {
            return Err(ParserError::DataRow {
                // header is line 1
                line_index: row_idx + 2,
                message: format!(
                    "expected {} columns but found {}",
                    header.len(),
                    record.len()
                ),
            });
        }

        if let (Some(wanted), Some(idx)) = (wanted_report, report_type_idx) {
            if record.get(idx).map(str::trim) != Some(wanted) {
                continue;
            }
        }

        for (values, field) in columns.iter_mut().zip(record.iter()) {
            values.push((!field.is_empty()).then(|| field.to_string()));
        }
    }

    if rows_read == 0 {
        return Err(ParserError::EmptyData);
    }

    let frame_columns: Vec<Column> = header
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.trim().into(), values).into())
        .collect();
    let df = DataFrame::new(frame_columns)?;

    debug!(
        rows_read,
        rows_kept = df.height(),
        columns = df.width(),
        "parsed LCD export"
    );

    Ok(RawObservations {
        df,
        content_hash: compute_hash(content.as_bytes()),
        rows_read,
    })
}

fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
