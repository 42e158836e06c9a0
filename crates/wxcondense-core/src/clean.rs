use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::encode::encode_weather;
use crate::error::{CleanError, Result};
use crate::normalize::normalize_frame;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One named step of the cleaning pipeline.
///
/// Exact-token substitutions must run before [`CleaningStage::NormalizeTokens`]
/// strips characters out of cells, otherwise sentinels such as `Ts` would no
/// longer match. [`CLEANING_STAGES`] fixes that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningStage {
    EncodeWeather,
    TraceSubstitution,
    MissingSentinels,
    NormalizeTokens,
    PruneVacuousRows,
    FillWeather,
    NormalizeDates,
    CoerceNumeric,
}

pub const CLEANING_STAGES: [CleaningStage; 8] = [
    CleaningStage::EncodeWeather,
    CleaningStage::TraceSubstitution,
    CleaningStage::MissingSentinels,
    CleaningStage::NormalizeTokens,
    CleaningStage::PruneVacuousRows,
    CleaningStage::FillWeather,
    CleaningStage::NormalizeDates,
    CleaningStage::CoerceNumeric,
];

impl CleaningStage {
    pub fn name(&self) -> &'static str {
        match self {
            CleaningStage::EncodeWeather => "encode_weather",
            CleaningStage::TraceSubstitution => "trace_substitution",
            CleaningStage::MissingSentinels => "missing_sentinels",
            CleaningStage::NormalizeTokens => "normalize_tokens",
            CleaningStage::PruneVacuousRows => "prune_vacuous_rows",
            CleaningStage::FillWeather => "fill_weather",
            CleaningStage::NormalizeDates => "normalize_dates",
            CleaningStage::CoerceNumeric => "coerce_numeric",
        }
    }

    fn apply(
        &self,
        df: &DataFrame,
        config: &PipelineConfig,
        report: &mut CleaningReport,
    ) -> Result<DataFrame> {
        let schema = &config.schema;
        let output = match self {
            CleaningStage::EncodeWeather => {
                encode_weather(df, &schema.weather_column, config.precipitation_codes.as_slice())?
            }
            CleaningStage::TraceSubstitution => replace_exact(
                df,
                &[schema.precipitation_column.as_str()],
                &config.trace_tokens,
                Some("0.0"),
            )?,
            CleaningStage::MissingSentinels => {
                let columns: Vec<&str> =
                    schema.measurement_columns.iter().map(String::as_str).collect();
                replace_exact(df, &columns, &config.missing_tokens, None)?
            }
            CleaningStage::NormalizeTokens => normalize_frame(df, &config.strip_chars)?,
            CleaningStage::PruneVacuousRows => {
                let columns: Vec<&str> = schema.prune_columns().collect();
                let (pruned, dropped) = drop_vacuous_rows(df, &columns)?;
                report.vacuous_rows_dropped = dropped;
                pruned
            }
            CleaningStage::FillWeather => fill_nulls(df, &schema.weather_column, "0")?,
            CleaningStage::NormalizeDates => {
                let (keyed, undated) = key_by_day(df, &schema.date_column)?;
                if undated > 0 {
                    warn!(
                        column = schema.date_column.as_str(),
                        rows = undated,
                        "dropping rows without a readable date"
                    );
                }
                report.undated_rows_dropped = undated;
                keyed
            }
            CleaningStage::CoerceNumeric => {
                let (coerced, failures) = coerce_numeric(df, &schema.date_column)?;
                report.coercion_failures = failures;

                // Cells such as `M` or `"s"` survive the first prune as text
                // and only become null here.
                let columns: Vec<&str> = schema.prune_columns().collect();
                let (pruned, dropped) = drop_vacuous_rows(&coerced, &columns)?;
                if dropped > 0 {
                    warn!(rows = dropped, "dropping rows with no readable measurement");
                }
                report.unreadable_rows_dropped = dropped;
                pruned
            }
        };
        Ok(output)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub vacuous_rows_dropped: usize,
    pub undated_rows_dropped: usize,
    /// Rows whose measurements were all unreadable once coerced to numbers.
    pub unreadable_rows_dropped: usize,
    /// Non-null cells per column that could not be read as numbers and were
    /// turned into nulls.
    pub coercion_failures: BTreeMap<String, usize>,
}

impl CleaningReport {
    pub fn total_coercion_failures(&self) -> usize {
        self.coercion_failures.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct CleanedFrame {
    pub dataframe: DataFrame,
    pub report: CleaningReport,
}

/// Runs every [`CLEANING_STAGES`] step over a raw station table.
///
/// The result has the day-truncated date as its first column (dtype `Date`)
/// and every other column as `Float64`. Dates are not deduplicated; several
/// stations may report the same day.
pub fn clean_observations(df: &DataFrame, config: &PipelineConfig) -> Result<CleanedFrame> {
    config
        .validate()
        .map_err(|err| CleanError::InvalidConfig(err.to_string()))?;
    config.schema.validate(df)?;

    let mut report = CleaningReport {
        input_rows: df.height(),
        ..CleaningReport::default()
    };

    let mut current = df.clone();
    for stage in CLEANING_STAGES {
        current = stage.apply(&current, config, &mut report)?;
        debug!(stage = stage.name(), rows = current.height(), "cleaning stage complete");
    }

    report.output_rows = current.height();
    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        vacuous_rows = report.vacuous_rows_dropped,
        unreadable_rows = report.unreadable_rows_dropped,
        undated_rows = report.undated_rows_dropped,
        coercion_failures = report.total_coercion_failures(),
        "cleaned station observations"
    );

    Ok(CleanedFrame {
        dataframe: current,
        report,
    })
}

/// Replaces text cells that equal one of `tokens` exactly. Columns that are not
/// text cannot hold a token and are skipped.
fn replace_exact(
    df: &DataFrame,
    columns: &[&str],
    tokens: &[String],
    replacement: Option<&str>,
) -> PolarsResult<DataFrame> {
    let mut output = df.clone();

    for name in columns {
        let column = df.column(name)?;
        if column.dtype() != &DataType::String {
            continue;
        }

        let replaced: Vec<Option<&str>> = column
            .str()?
            .into_iter()
            .map(|cell| match cell {
                Some(text) if tokens.iter().any(|token| token == text) => replacement,
                other => other,
            })
            .collect();

        output.with_column(Series::new(column.name().clone(), replaced))?;
    }

    Ok(output)
}

fn drop_vacuous_rows(df: &DataFrame, columns: &[&str]) -> PolarsResult<(DataFrame, usize)> {
    let mut keep = vec![false; df.height()];

    for name in columns {
        let nulls = df.column(name)?.as_materialized_series().is_null();
        for (idx, is_null) in nulls.into_iter().enumerate() {
            if is_null == Some(false) {
                keep[idx] = true;
            }
        }
    }

    let dropped = keep.iter().filter(|kept| !**kept).count();
    if dropped == 0 {
        return Ok((df.clone(), 0));
    }

    let mask = BooleanChunked::new("keep".into(), keep);
    Ok((df.filter(&mask)?, dropped))
}

fn fill_nulls(df: &DataFrame, column: &str, value: &str) -> PolarsResult<DataFrame> {
    let source = df.column(column)?;
    let text = if source.dtype() == &DataType::String {
        source.clone()
    } else {
        source.cast(&DataType::String)?
    };

    let filled: Vec<&str> = text
        .str()?
        .into_iter()
        .map(|cell| cell.unwrap_or(value))
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(source.name().clone(), filled))?;
    Ok(output)
}

fn key_by_day(df: &DataFrame, date_column: &str) -> Result<(DataFrame, usize)> {
    let source = df.column(date_column)?;

    let days: Vec<Option<i32>> = match source.dtype() {
        DataType::Date => source.cast(&DataType::Int32)?.i32()?.into_iter().collect(),
        DataType::Datetime(unit, None) => {
            let per_day: i64 = match unit {
                TimeUnit::Nanoseconds => 86_400_000_000_000,
                TimeUnit::Microseconds => 86_400_000_000,
                TimeUnit::Milliseconds => 86_400_000,
            };
            source
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|value| value.map(|ts| ts.div_euclid(per_day) as i32))
                .collect()
        }
        DataType::Datetime(unit, Some(zone)) => {
            let zone: Tz = zone
                .as_str()
                .parse()
                .map_err(|_| CleanError::UnsupportedDateType {
                    column: date_column.to_string(),
                    dtype: source.dtype().clone(),
                })?;
            source
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|value| value.and_then(|ts| local_day(ts, *unit, &zone)))
                .collect()
        }
        DataType::String => source
            .str()?
            .into_iter()
            .map(|cell| cell.and_then(parse_day))
            .collect(),
        other => {
            return Err(CleanError::UnsupportedDateType {
                column: date_column.to_string(),
                dtype: other.clone(),
            })
        }
    };

    let keep: Vec<bool> = days.iter().map(Option::is_some).collect();
    let undated = keep.iter().filter(|kept| !**kept).count();

    let (rows, days) = if undated == 0 {
        (df.clone(), days)
    } else {
        let mask = BooleanChunked::new("keep".into(), keep);
        let kept_days: Vec<Option<i32>> = days.into_iter().filter(Option::is_some).collect();
        (df.filter(&mask)?, kept_days)
    };

    let key = Series::new(date_column.into(), days).cast(&DataType::Date)?;

    let mut columns: Vec<Column> = Vec::with_capacity(rows.width());
    columns.push(key.into());
    for column in rows.get_columns() {
        if column.name().as_str() != date_column {
            columns.push(column.clone());
        }
    }

    Ok((DataFrame::new(columns)?, undated))
}

/// Parses a feed timestamp and returns its calendar day as days since the
/// Unix epoch. The time of day is discarded.
fn parse_day(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())?;
    Some(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Calendar day of a zoned timestamp as seen on the local clock, as days
/// since the Unix epoch.
fn local_day(ts: i64, unit: TimeUnit, zone: &Tz) -> Option<i32> {
    let utc = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(ts)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ts),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ts),
    }?;
    Some(utc.with_timezone(zone).date_naive().num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn coerce_numeric(
    df: &DataFrame,
    key_column: &str,
) -> PolarsResult<(DataFrame, BTreeMap<String, usize>)> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut failures = BTreeMap::new();

    for column in df.get_columns() {
        if column.name().as_str() == key_column {
            columns.push(column.clone());
            continue;
        }

        let (numeric, failed) = if column.dtype() == &DataType::String {
            let mut failed = 0usize;
            let values: Vec<Option<f64>> = column
                .str()?
                .into_iter()
                .map(|cell| {
                    let text = cell?;
                    let parsed = parse_number(text);
                    if parsed.is_none() {
                        failed += 1;
                    }
                    parsed
                })
                .collect();
            (Column::from(Series::new(column.name().clone(), values)), failed)
        } else {
            let before = column.null_count();
            let cast = column.cast(&DataType::Float64)?;
            let failed = cast.null_count().saturating_sub(before);
            (cast, failed)
        };

        if failed > 0 {
            warn!(
                column = column.name().as_str(),
                failures = failed,
                "values could not be read as numbers"
            );
            failures.insert(column.name().to_string(), failed);
        }
        columns.push(numeric);
    }

    Ok((DataFrame::new(columns)?, failures))
}
