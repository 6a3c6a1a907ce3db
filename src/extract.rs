// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Per-revision file counts and per-blob line counts, fanned out over a fixed-size worker pool
// role: extraction workers
// inputs: (stamp, tree id) pairs; (extension, blob id) pairs; excluded extension set
// outputs: (stamp, tree id, files) and (extension, blob id, lines) triples for the items that succeeded
// side_effects: spawns git processes from pool threads; each batch adds its wall-clock time to the run's ExecTimer once
// invariants:
// - excluded extensions return 0 without running git
// - a NUL byte in the first 8 KiB marks a blob binary (0 lines)
// - line count is the number of '\n' bytes, same as `wc -l`
// - a failing item is logged and dropped; other items are unaffected
// errors: pool construction errors propagate; per-item errors never do
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::warn;

use crate::gitio;
use crate::pipe::PipeRunner;

const BINARY_SNIFF_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFiles {
  pub stamp: i64,
  pub rev: String,
  pub files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLines {
  pub ext: String,
  pub blob: String,
  pub lines: u64,
}

pub fn is_binary(content: &[u8]) -> bool {
  let head = &content[..content.len().min(BINARY_SNIFF_LEN)];
  head.contains(&0)
}

/// Lines in a blob's content; binary content has none.
pub fn lines_in_content(content: &[u8]) -> u64 {
  if is_binary(content) {
    return 0;
  }
  content.iter().filter(|&&b| b == b'\n').count() as u64
}

pub fn count_files_at_revision(runner: &PipeRunner, stamp: i64, rev: &str) -> Result<RevisionFiles> {
  let files = gitio::count_tree_files(runner, rev)?;
  Ok(RevisionFiles {
    stamp,
    rev: rev.to_string(),
    files,
  })
}

pub fn count_lines_in_blob(
  runner: &PipeRunner,
  excluded: &HashSet<String>,
  ext: &str,
  blob: &str,
) -> Result<BlobLines> {
  let lines = if excluded.contains(ext) {
    0
  } else {
    let content = gitio::read_blob(runner, blob).with_context(|| format!("reading blob {}", blob))?;
    lines_in_content(&content)
  };
  Ok(BlobLines {
    ext: ext.to_string(),
    blob: blob.to_string(),
    lines,
  })
}

pub struct WorkerPool {
  pool: rayon::ThreadPool,
}

impl WorkerPool {
  pub fn new(processes: usize) -> Result<Self> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(processes.max(1))
      .thread_name(|i| format!("gitstats-worker-{i}"))
      .build()
      .context("building worker pool")?;
    Ok(WorkerPool { pool })
  }

  pub fn files_at_revisions(&self, runner: &PipeRunner, revs: &[(i64, String)]) -> Vec<RevisionFiles> {
    runner.batch(|worker| {
      self.pool.install(|| {
        revs
          .par_iter()
          .filter_map(|(stamp, rev)| match count_files_at_revision(worker, *stamp, rev) {
            Ok(r) => Some(r),
            Err(e) => {
              warn!("skipping file count for {}: {:#}", rev, e);
              None
            }
          })
          .collect()
      })
    })
  }

  /// Unreadable blobs are dropped, which counts them as 0 lines without caching that 0.
  pub fn lines_in_blobs(
    &self,
    runner: &PipeRunner,
    excluded: &HashSet<String>,
    blobs: &[(String, String)],
  ) -> Vec<BlobLines> {
    runner.batch(|worker| {
      self.pool.install(|| {
        blobs
          .par_iter()
          .filter_map(|(ext, blob)| match count_lines_in_blob(worker, excluded, ext, blob) {
            Ok(r) => Some(r),
            Err(e) => {
              warn!("counting 0 lines for unreadable blob {}: {:#}", blob, e);
              None
            }
          })
          .collect()
      })
    })
  }
}
