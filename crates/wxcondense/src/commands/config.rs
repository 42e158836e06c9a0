use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::resolve_config;

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Pipeline config file (TOML); defaults to $WXCONDENSE_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn handle_inspect_config(args: &ConfigArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
    println!("{rendered}");
    Ok(())
}
