use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::ExtraFormat;
use crate::config::Config;
use crate::model::GitStats;
use crate::util::local_time;

pub const REPORT_FILE_NAME: &str = "gitstats.json";

#[derive(Debug, Serialize)]
pub struct Summary {
  pub project_name: String,
  pub generated: String,
  pub first_commit: String,
  pub last_commit: String,
  pub age_days: f64,
  pub active_days: usize,
  pub total_commits: u64,
  pub total_authors: u64,
  pub total_files: u64,
  pub total_loc: i64,
  pub total_size: u64,
  pub top_authors: Vec<String>,
  /// detail rows for the first `authors_top` authors
  pub author_details: Vec<AuthorLine>,
  pub top_domains: Vec<String>,
  pub busiest_hour: Option<u32>,
  pub busiest_weekday: Option<u32>,
  pub total_tags: usize,
  pub latest_tag: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AuthorLine {
  pub name: String,
  pub commits: u64,
  pub commits_frac: f64,
  pub lines_added: u64,
  pub lines_removed: u64,
  pub first_commit: String,
  pub last_commit: String,
}

/// Everything a report renderer needs: the headline numbers plus the full model.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
  pub summary: Summary,
  pub config: &'a Config,
  pub stats: &'a GitStats,
}

fn top_domains(stats: &GitStats, limit: usize) -> Vec<String> {
  let mut domains: Vec<(&str, u64)> = stats
    .domains()
    .into_iter()
    .filter_map(|d| stats.domain_info(d).map(|info| (d, info.commits)))
    .collect();
  domains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
  domains.into_iter().take(limit).map(|(d, _)| d.to_string()).collect()
}

fn author_details(stats: &GitStats, limit: usize) -> Vec<AuthorLine> {
  stats
    .authors(Some(limit))
    .into_iter()
    .filter_map(|name| {
      let info = stats.author_info(&name)?;
      Some(AuthorLine {
        commits: info.commits,
        commits_frac: info.commits_frac,
        lines_added: info.lines_added,
        lines_removed: info.lines_removed,
        first_commit: info.date_first.clone(),
        last_commit: info.date_last.clone(),
        name,
      })
    })
    .collect()
}

/// Bucket with the most commits; ties go to the earliest bucket.
fn busiest(buckets: &BTreeMap<u32, u64>) -> Option<u32> {
  buckets
    .iter()
    .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    .map(|(k, _)| *k)
}

fn latest_tag(stats: &GitStats) -> Option<String> {
  stats
    .tags()
    .into_iter()
    .filter_map(|t| stats.tag_info(t).map(|info| (info.stamp, t)))
    .max()
    .map(|(_, t)| t.to_string())
}

pub fn build_report<'a>(stats: &'a GitStats, cfg: &'a Config) -> Report<'a> {
  let fmt = |d: chrono::DateTime<chrono::Local>| d.format("%Y-%m-%d %H:%M:%S").to_string();
  Report {
    summary: Summary {
      project_name: stats.project_name.clone(),
      generated: fmt(local_time(stats.stamp_created)),
      first_commit: fmt(stats.first_commit_date()),
      last_commit: fmt(stats.last_commit_date()),
      age_days: stats.commit_delta_days(),
      active_days: stats.active_days().len(),
      total_commits: stats.total_commits(),
      total_authors: stats.total_authors(),
      total_files: stats.total_files(),
      total_loc: stats.total_loc(),
      total_size: stats.total_size(),
      top_authors: stats.authors(Some(cfg.max_authors)),
      author_details: author_details(stats, cfg.authors_top),
      top_domains: top_domains(stats, cfg.max_domains),
      busiest_hour: busiest(stats.activity_by_hour_of_day()),
      busiest_weekday: busiest(stats.activity_by_day_of_week()),
      total_tags: stats.tags().len(),
      latest_tag: latest_tag(stats),
    },
    config: cfg,
    stats,
  }
}

fn write_json(path: &Path, report: &Report) -> Result<()> {
  std::fs::write(path, serde_json::to_vec_pretty(report)?)
    .with_context(|| format!("writing {}", path.display()))
}

/// Writes `<out_dir>/gitstats.json`.
pub fn write_report(stats: &GitStats, cfg: &Config, out_dir: &Path) -> Result<PathBuf> {
  let path = out_dir.join(REPORT_FILE_NAME);
  write_json(&path, &build_report(stats, cfg))?;
  Ok(path)
}

/// `<out_dir>.<ext>`, next to the output directory.
pub fn extra_output_path(out_dir: &Path, format: ExtraFormat) -> PathBuf {
  let mut name = out_dir.as_os_str().to_owned();
  name.push(".");
  name.push(format.extension());
  PathBuf::from(name)
}

pub fn write_extra(stats: &GitStats, cfg: &Config, out_dir: &Path, format: ExtraFormat) -> Result<PathBuf> {
  let path = extra_output_path(out_dir, format);
  match format {
    ExtraFormat::Json => write_json(&path, &build_report(stats, cfg))?,
  }
  Ok(path)
}
