use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;
use tracing::{info, warn};
use wxcondense_core::{clean_observations, condense_cleaned};
use wxcondense_parser::{parse_lcd_csv_with, stack_observations, RawObservations, ReadOptions};

use super::resolve_config;
use crate::summary::{InputSummary, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Clean,
    Condense,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Station CSV files or glob patterns, one file per station
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Pipeline config file (TOML); defaults to $WXCONDENSE_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep only rows with this REPORT_TYPE (e.g. SOD for daily summaries)
    #[arg(long)]
    report_type: Option<String>,

    /// Write the resulting table as Parquet
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

pub fn handle_run(mode: RunMode, args: &RunArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let options = ReadOptions {
        report_type: args.report_type.clone(),
    };

    let paths = expand_inputs(&args.inputs)?;
    let mut stations: Vec<(PathBuf, RawObservations)> = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed = parse_lcd_csv_with(&content, &options)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(
            path = %path.display(),
            rows = parsed.height(),
            hash = parsed.content_hash.as_str(),
            "loaded station file"
        );
        stations.push((path, parsed));
    }

    let frames: Vec<&DataFrame> = stations.iter().map(|(_, raw)| &raw.df).collect();
    let raw = stack_observations(&frames).context("failed to stack station files")?;

    let cleaned = clean_observations(&raw, &config)?;
    let mut summary = RunSummary {
        inputs: stations
            .iter()
            .map(|(path, parsed)| InputSummary {
                path: path.display().to_string(),
                content_hash: parsed.content_hash.clone(),
                rows_read: parsed.rows_read,
                rows_kept: parsed.height(),
            })
            .collect(),
        cleaning: cleaned.report.clone(),
        condense: None,
    };

    let mut output = match mode {
        RunMode::Clean => cleaned.dataframe,
        RunMode::Condense => {
            let condensed = condense_cleaned(&cleaned, &config)?;
            summary.condense = Some(condensed.report);
            condensed.dataframe
        }
    };

    println!("{}", summary.render_table());

    if let Some(path) = args.summary_json.as_deref() {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
    }

    match args.output.as_deref() {
        Some(path) => {
            write_parquet(&mut output, path)?;
            info!(path = %path.display(), rows = output.height(), "wrote output");
        }
        None => warn!("no --output given; result was not written"),
    }

    Ok(())
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        for entry in glob::glob(pattern).with_context(|| format!("invalid pattern {pattern}"))? {
            let path = entry.map_err(|err| anyhow!("could not read {}: {}", pattern, err))?;
            if path.is_file() {
                matched = true;
                paths.push(path);
            }
        }
        if !matched {
            bail!("no input files matched {pattern}");
        }
    }
    Ok(paths)
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(df)
        .context("failed to write parquet")?;
    Ok(())
}
