use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wxcondense_core::PipelineConfig;

pub mod config;
pub mod run;

const CONFIG_ENV: &str = "WXCONDENSE_CONFIG";

/// Resolves the pipeline config from `--config`, then `WXCONDENSE_CONFIG`,
/// falling back to the LCD defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}
