use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Collection settings. Layered: defaults, then an optional TOML file, then `-c key=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub max_domains: usize,
  pub max_ext_length: usize,
  pub max_authors: usize,
  pub authors_top: usize,
  pub commit_begin: String,
  pub commit_end: String,
  pub linear_linestats: bool,
  pub project_name: String,
  pub processes: usize,
  pub start_date: String,
  pub end_date: String,
  /// Comma-separated author names; each becomes a `--author` filter.
  pub authors: String,
  /// Comma-separated extensions whose blobs are never line-counted.
  pub exclude_exts: String,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      max_domains: 10,
      max_ext_length: 10,
      max_authors: 20,
      authors_top: 5,
      commit_begin: String::new(),
      commit_end: "HEAD".into(),
      linear_linestats: true,
      project_name: String::new(),
      processes: 8,
      start_date: String::new(),
      end_date: String::new(),
      authors: String::new(),
      exclude_exts: String::new(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  gitstats: Option<Config>,
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    other => bail!("invalid boolean for {}: {:?}", key, other),
  }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
  value
    .trim()
    .parse::<usize>()
    .with_context(|| format!("invalid number for {}: {:?}", key, value))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
  raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl Config {
  pub fn from_toml_str(text: &str) -> Result<Self> {
    let file: ConfigFile = toml::from_str(text).context("parsing config TOML")?;
    Ok(file.gitstats.unwrap_or_default())
  }

  pub fn load_file(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    Self::from_toml_str(&text).with_context(|| format!("in config file {}", path.display()))
  }

  /// Apply a single `key=value` override.
  pub fn apply_override(&mut self, item: &str) -> Result<()> {
    let (key, value) = match item.split_once('=') {
      Some(kv) => kv,
      None => bail!("Config must be in the form key=value, got {:?}", item),
    };
    let key = key.trim();
    match key {
      "max_domains" => self.max_domains = parse_count(key, value)?,
      "max_ext_length" => self.max_ext_length = parse_count(key, value)?,
      "max_authors" => self.max_authors = parse_count(key, value)?,
      "authors_top" => self.authors_top = parse_count(key, value)?,
      "commit_begin" => self.commit_begin = value.to_string(),
      "commit_end" => self.commit_end = value.to_string(),
      "linear_linestats" => self.linear_linestats = parse_flag(key, value)?,
      "project_name" => self.project_name = value.to_string(),
      "processes" => self.processes = parse_count(key, value)?,
      "start_date" => self.start_date = value.to_string(),
      "end_date" => self.end_date = value.to_string(),
      "authors" => self.authors = value.to_string(),
      "exclude_exts" => self.exclude_exts = value.to_string(),
      _ => bail!("No such key {:?} in config", key),
    }
    Ok(())
  }

  pub fn validate(&self) -> Result<()> {
    if self.processes == 0 {
      bail!("processes must be at least 1");
    }
    Ok(())
  }

  /// Lowercased exclusion set; entries keep any leading dot the user wrote.
  pub fn excluded_extensions(&self) -> HashSet<String> {
    split_list(&self.exclude_exts).map(|s| s.to_lowercase()).collect()
  }

  pub fn author_filters(&self) -> Vec<String> {
    split_list(&self.authors).map(String::from).collect()
  }

  /// Revision range honoring `commit_begin`/`commit_end`.
  ///
  /// An all-digit `commit_begin` means "that many commits before the end".
  pub fn commit_range(&self, default_range: &str, end_only: bool) -> String {
    let end = self.commit_end.trim();
    if end.is_empty() {
      return default_range.to_string();
    }
    let begin = self.commit_begin.trim();
    if end_only || begin.is_empty() {
      return end.to_string();
    }
    if begin.chars().all(|c| c.is_ascii_digit()) {
      return format!("{end}~{begin}..{end}");
    }
    format!("{begin}..{end}")
  }

  /// Arguments selecting the commits to scan: date and author filters, then the range.
  pub fn log_range_args(&self, default_range: &str, end_only: bool) -> Vec<String> {
    let mut args = Vec::new();
    if !self.start_date.trim().is_empty() {
      args.push(format!("--since={}", self.start_date.trim()));
    }
    if !self.end_date.trim().is_empty() {
      args.push(format!("--until={}", self.end_date.trim()));
    }
    for author in self.author_filters() {
      args.push(format!("--author={}", author));
    }
    args.push(self.commit_range(default_range, end_only));
    args
  }
}
