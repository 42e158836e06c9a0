use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::clean::{clean_observations, CleanedFrame, CleaningReport};
use crate::config::{PipelineConfig, WeatherConsensus};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CondenseReport {
    pub input_rows: usize,
    pub distinct_dates: usize,
    /// Dates on which stations reported different weather flags.
    pub weather_disagreements: usize,
    pub filled_cells: BTreeMap<String, usize>,
    /// Cells still null after the rolling fill, usually at the start of the
    /// series.
    pub unresolved_gaps: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct CondensedFrame {
    pub dataframe: DataFrame,
    pub cleaning: CleaningReport,
    pub report: CondenseReport,
}

/// Cleans a multi-station table and condenses it to one row per date.
pub fn condense_frame(df: &DataFrame, config: &PipelineConfig) -> Result<CondensedFrame> {
    let cleaned = clean_observations(df, config)?;
    condense_cleaned(&cleaned, config)
}

/// Condenses an already cleaned table: numeric columns are averaged across
/// stations per date, the weather flag follows the configured consensus
/// policy, then remaining gaps are filled with a trailing rolling mean over
/// the ordered dates.
pub fn condense_cleaned(cleaned: &CleanedFrame, config: &PipelineConfig) -> Result<CondensedFrame> {
    let df = &cleaned.dataframe;
    let schema = &config.schema;

    let keys = df.column(&schema.date_column)?.cast(&DataType::Int32)?;
    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (idx, key) in keys.i32()?.into_iter().enumerate() {
        if let Some(day) = key {
            groups.entry(day).or_default().push(idx);
        }
    }

    let mut report = CondenseReport {
        input_rows: df.height(),
        distinct_dates: groups.len(),
        ..CondenseReport::default()
    };

    let days: Vec<i32> = groups.keys().copied().collect();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    columns.push(
        Series::new(schema.date_column.as_str().into(), days)
            .cast(&DataType::Date)?
            .into(),
    );

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == schema.date_column {
            continue;
        }

        let numeric = column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = numeric.f64()?.into_iter().collect();

        let grouped: Vec<Option<f64>> = if name == schema.weather_column {
            let mut disagreements = 0usize;
            let resolved = groups
                .values()
                .map(|rows| {
                    let flags: Vec<Option<f64>> = rows.iter().map(|&idx| values[idx]).collect();
                    if stations_disagree(&flags) {
                        disagreements += 1;
                    }
                    resolve_weather(&flags, config.weather_consensus)
                })
                .collect();
            if disagreements > 0 {
                warn!(
                    dates = disagreements,
                    policy = ?config.weather_consensus,
                    "stations disagree on the weather flag"
                );
            }
            report.weather_disagreements = disagreements;
            resolved
        } else {
            groups
                .values()
                .map(|rows| mean_present(rows.iter().map(|&idx| values[idx])))
                .collect()
        };

        let fill = rolling_fill(
            &grouped,
            config.rolling_window,
            config.rolling_min_periods,
        );
        if fill.filled > 0 {
            report.filled_cells.insert(name.to_string(), fill.filled);
        }
        if fill.unresolved > 0 {
            report.unresolved_gaps.insert(name.to_string(), fill.unresolved);
        }

        columns.push(Series::new(column.name().clone(), fill.values).into());
    }

    let dataframe = DataFrame::new(columns)?;
    info!(
        input_rows = report.input_rows,
        dates = report.distinct_dates,
        filled = report.filled_cells.values().sum::<usize>(),
        unresolved = report.unresolved_gaps.values().sum::<usize>(),
        "condensed station observations"
    );

    Ok(CondensedFrame {
        dataframe,
        cleaning: cleaned.report.clone(),
        report,
    })
}

/// Arithmetic mean of the non-null values; `None` when every value is null.
pub fn mean_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn stations_disagree(flags: &[Option<f64>]) -> bool {
    let mut present = flags.iter().flatten();
    match present.next() {
        Some(first) => present.any(|flag| flag != first),
        None => false,
    }
}

fn resolve_weather(flags: &[Option<f64>], policy: WeatherConsensus) -> Option<f64> {
    match policy {
        WeatherConsensus::First => flags.first().copied().flatten(),
        WeatherConsensus::Majority => {
            // bit pattern -> (votes, first position)
            let mut votes: HashMap<u64, (usize, usize)> = HashMap::new();
            for (position, flag) in flags.iter().enumerate() {
                if let Some(value) = flag {
                    votes
                        .entry(value.to_bits())
                        .and_modify(|(count, _)| *count += 1)
                        .or_insert((1, position));
                }
            }
            votes
                .into_iter()
                .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                    count_a.cmp(count_b).then(first_b.cmp(first_a))
                })
                .map(|(bits, _)| f64::from_bits(bits))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingFill {
    pub values: Vec<Option<f64>>,
    pub filled: usize,
    pub unresolved: usize,
}

/// Fills null entries with the mean of the non-null values in the trailing
/// window of `window` positions ending at the entry itself. Means are taken
/// over the original values only, so filled entries never feed later fills,
/// and no position after the entry is ever read.
pub fn rolling_fill(values: &[Option<f64>], window: usize, min_periods: usize) -> RollingFill {
    let window = window.max(1);
    let mut filled = 0;
    let mut unresolved = 0;

    let output = values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            if value.is_some() {
                return *value;
            }

            let start = (idx + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=idx].iter().flatten().copied().collect();
            if present.len() >= min_periods.max(1) {
                filled += 1;
                mean_present(present.into_iter().map(Some))
            } else {
                unresolved += 1;
                None
            }
        })
        .collect();

    RollingFill {
        values: output,
        filled,
        unresolved,
    }
}
