use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "gitstats",
    version,
    about = "Collect statistics for one or more Git repositories into a JSON report",
    override_usage = "gitstats [OPTIONS] <gitpath>... <outputpath>",
    long_about = None
)]
pub struct Cli {
  /// Override a configuration value; repeatable
  #[arg(short = 'c', long = "config", value_name = "key=value")]
  pub overrides: Vec<String>,

  /// TOML file with a [gitstats] table, applied before -c overrides (INI gitstats.conf files are not read)
  #[arg(long)]
  pub config_file: Option<PathBuf>,

  /// Also export the model next to the output directory (<outputpath>.json)
  #[arg(short = 'f', long, value_enum)]
  pub format: Option<ExtraFormat>,

  /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
  #[arg(long, default_value = "info")]
  pub log_level: String,

  /// Repositories to scan, then the output directory
  #[arg(value_name = "PATH", num_args = 2.., required_unless_present = "gen_man")]
  pub paths: Vec<PathBuf>,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFormat {
  Json,
}

impl ExtraFormat {
  pub fn extension(self) -> &'static str {
    match self {
      ExtraFormat::Json => "json",
    }
  }
}

#[derive(Debug)]
pub struct RunConfig {
  pub gitpaths: Vec<PathBuf>,
  pub out_dir: PathBuf, // absolute
  pub format: Option<ExtraFormat>,
  pub config: Config,
}

pub fn normalize(cli: Cli) -> Result<RunConfig> {
  let mut paths = cli.paths;
  let Some(out) = paths.pop() else {
    bail!("Provide at least one <gitpath> and an <outputpath>");
  };
  if paths.is_empty() {
    bail!("Provide at least one <gitpath> before <outputpath>");
  }

  let mut config = match &cli.config_file {
    Some(path) => Config::load_file(path)?,
    None => Config::default(),
  };
  for item in &cli.overrides {
    config.apply_override(item)?;
  }
  config.validate()?;

  Ok(RunConfig {
    gitpaths: paths,
    out_dir: PathBuf::from(util::canonicalize_lossy(&out)),
    format: cli.format,
    config,
  })
}
