// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Drive one collection run: load cache, scan each repository, save cache, refine
// role: orchestration
// inputs: Config, repository paths, output directory, run-scoped ExecTimer
// outputs: refined GitStats
// side_effects: runs git in each repository; reads and rewrites <out>/gitstats.cache
// invariants:
// - cached keys are never recomputed; computed keys are cached before they are merged
// - repositories accumulate into one model in the order given
// - tag segments are computed oldest first, so each commit lands in exactly one tag
// errors: missing git, corrupt cache, cache save failure and an empty history are fatal
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cache::{ContentCache, Namespace};
use crate::commit::CommitRecord;
use crate::config::Config;
use crate::extract::WorkerPool;
use crate::gitio;
use crate::linestats::{AuthorLinePass, LineStatPass};
use crate::model::{GitStats, TagInfo};
use crate::pipe::{ExecTimer, PipeRunner};
use crate::refine::refine;
use crate::util::{canonicalize_lossy, extension_of, local_date};

pub struct Collector<'a> {
  cfg: &'a Config,
  cache: ContentCache,
  pool: WorkerPool,
  timer: ExecTimer,
  stats: GitStats,
}

impl<'a> Collector<'a> {
  pub fn new(cfg: &'a Config, cache: ContentCache, timer: ExecTimer) -> Result<Self> {
    Ok(Collector {
      cfg,
      cache,
      pool: WorkerPool::new(cfg.processes)?,
      timer,
      stats: GitStats::new(Utc::now().timestamp()),
    })
  }

  pub fn into_parts(self) -> (GitStats, ContentCache) {
    (self.stats, self.cache)
  }

  /// Scan one repository into the accumulated model.
  pub fn collect(&mut self, repo: &Path) -> Result<()> {
    let runner = PipeRunner::new(repo, self.timer.clone());
    let range = self.cfg.log_range_args("HEAD", false);

    self.stats.project_name = if self.cfg.project_name.is_empty() {
      project_name_of(repo)
    } else {
      self.cfg.project_name.clone()
    };

    self.stats.total_authors += gitio::count_authors(&runner, &range).context("counting authors")?;

    self.collect_tags(&runner).context("collecting tags")?;
    self.collect_revisions(&runner, &range).context("collecting revisions")?;
    self.collect_files_by_revision(&runner, &range).context("counting files per revision")?;
    self.collect_extensions(&runner).context("collecting extensions")?;

    info!("Collecting line statistics...");
    let lines = gitio::shortstat_log(&runner, &range, self.cfg.linear_linestats)?;
    LineStatPass::run(&mut self.stats, &lines);
    let lines = gitio::shortstat_log(&runner, &range, false)?;
    AuthorLinePass::run(&mut self.stats, &lines);
    Ok(())
  }

  fn collect_tags(&mut self, runner: &PipeRunner) -> Result<()> {
    let mut found: Vec<(String, String)> = Vec::new();
    for (hash, name) in gitio::list_tags(runner)? {
      let Some(stamp) = gitio::commit_stamp(runner, &hash)? else {
        continue;
      };
      let date = local_date(stamp);
      found.push((date.clone(), name.clone()));
      self.stats.tags.insert(
        name,
        TagInfo {
          stamp,
          hash,
          date,
          ..Default::default()
        },
      );
    }

    // oldest first; ties by name
    found.sort();
    let mut prev: Option<String> = None;
    for (_, tag) in found {
      let mut args = vec![tag.clone()];
      if let Some(p) = &prev {
        args.push(format!("^{p}"));
      }
      let rows = gitio::shortlog_summary(runner, &args)?;
      if rows.is_empty() {
        continue;
      }
      prev = Some(tag.clone());
      if let Some(info) = self.stats.tags.get_mut(&tag) {
        for (commits, author) in rows {
          info.commits += commits;
          info.authors.insert(author, commits);
        }
      }
    }
    Ok(())
  }

  fn collect_revisions(&mut self, runner: &PipeRunner, range: &[String]) -> Result<()> {
    for line in gitio::revision_lines(runner, range)? {
      match CommitRecord::parse(&line) {
        Some(rec) => self.stats.record_commit(&rec),
        None => warn!("unexpected revision line {:?}", line),
      }
    }
    Ok(())
  }

  fn collect_files_by_revision(&mut self, runner: &PipeRunner, range: &[String]) -> Result<()> {
    let revs = gitio::revision_trees(runner, range)?;
    self.stats.total_commits += revs.len() as u64;

    let mut to_read: Vec<(i64, String)> = Vec::new();
    for (stamp, tree) in revs {
      match self.cache.get(Namespace::FilesInTree, &tree) {
        Some(files) => {
          self.stats.files_by_stamp.insert(stamp, files);
        }
        None => to_read.push((stamp, tree)),
      }
    }

    for r in self.pool.files_at_revisions(runner, &to_read) {
      self.cache.put(Namespace::FilesInTree, r.rev.clone(), r.files);
      self.stats.files_by_stamp.insert(r.stamp, r.files);
    }
    Ok(())
  }

  fn collect_extensions(&mut self, runner: &PipeRunner) -> Result<()> {
    let end = self.cfg.commit_range("HEAD", true);
    // (ext, blob) for every file whose blob is not cached yet
    let mut pending: Vec<(String, String)> = Vec::new();
    for entry in gitio::tree_entries(runner, &end)? {
      if entry.is_submodule() {
        continue;
      }
      self.stats.total_size += entry.size.unwrap_or(0);
      self.stats.total_files += 1;

      let ext = extension_of(&entry.path, self.cfg.max_ext_length);
      self.stats.add_extension_file(&ext);
      match self.cache.get(Namespace::LinesInBlob, &entry.id) {
        Some(lines) => self.stats.add_extension_lines(&ext, lines),
        None => pending.push((ext, entry.id)),
      }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let to_read: Vec<(String, String)> = pending
      .iter()
      .filter(|pair| seen.insert(pair.1.clone()))
      .cloned()
      .collect();
    let excluded = self.cfg.excluded_extensions();
    for r in self.pool.lines_in_blobs(runner, &excluded, &to_read) {
      self.cache.put(Namespace::LinesInBlob, r.blob, r.lines);
    }
    for (ext, blob) in &pending {
      if let Some(lines) = self.cache.get(Namespace::LinesInBlob, blob) {
        self.stats.add_extension_lines(ext, lines);
      }
    }
    Ok(())
  }
}

fn project_name_of(repo: &Path) -> String {
  let abs = PathBuf::from(canonicalize_lossy(repo));
  abs
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default()
}

/// Full run over `repos`, using and refreshing the cache in `out_dir`.
pub fn collect_all(cfg: &Config, repos: &[PathBuf], out_dir: &Path, timer: &ExecTimer) -> Result<GitStats> {
  let version = gitio::git_version(&PipeRunner::new(out_dir, timer.clone())).context("git is not available")?;
  info!("{}", version);

  let cache_path = ContentCache::path_in(out_dir);
  let cache = ContentCache::load(&cache_path)?;

  let mut collector = Collector::new(cfg, cache, timer.clone())?;
  for repo in repos {
    info!("Collecting data from {}", repo.display());
    collector
      .collect(repo)
      .with_context(|| format!("collecting {}", repo.display()))?;
  }

  let (mut stats, cache) = collector.into_parts();
  cache.save(&cache_path)?;
  info!("Refining data...");
  refine(&mut stats)?;
  Ok(stats)
}
