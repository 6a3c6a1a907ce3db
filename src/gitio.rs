use anyhow::{Context, Result};
use tracing::warn;

use crate::pipe::{PipeRunner, Stage};

fn git_log_stage<I, S>(args: I) -> Stage
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let mut all: Vec<String> = vec!["-c".into(), "log.showSignature=false".into()];
  all.extend(args.into_iter().map(Into::into));
  Stage::git(all)
}

fn non_empty_lines(out: &str) -> Vec<String> {
  out.lines().filter(|l| !l.is_empty()).map(|l| l.to_string()).collect()
}

pub fn git_version(runner: &PipeRunner) -> Result<String> {
  let out = runner.run(&[Stage::git(["--version"])])?;
  Ok(out.lines().next().unwrap_or("").to_string())
}

/// `(commit id, tag name)` for every tag ref.
pub fn list_tags(runner: &PipeRunner) -> Result<Vec<(String, String)>> {
  // show-ref exits 1 when there are no tags at all
  let out = match runner.run(&[Stage::git(["show-ref", "--tags"])]) {
    Ok(out) => out,
    Err(crate::pipe::PipeError::Failed { .. }) => return Ok(Vec::new()),
    Err(e) => return Err(e.into()),
  };
  Ok(parse_show_ref(&out))
}

pub fn parse_show_ref(out: &str) -> Vec<(String, String)> {
  let mut tags = Vec::new();
  for line in out.lines() {
    if line.is_empty() {
      continue;
    }
    match line.split_once(' ') {
      Some((hash, refname)) => {
        let name = refname.strip_prefix("refs/tags/").unwrap_or(refname);
        tags.push((hash.to_string(), name.to_string()));
      }
      None => warn!("unexpected show-ref line {:?}", line),
    }
  }
  tags
}

/// Author timestamp of the commit a revision points at; 0 when unparsable.
pub fn commit_stamp(runner: &PipeRunner, rev: &str) -> Result<Option<i64>> {
  let out = runner.run(&[git_log_stage(["log", rev, "--pretty=format:%at %aN", "-n", "1"])])?;
  if out.is_empty() {
    return Ok(None);
  }
  let first = out.split(' ').next().unwrap_or("");
  Ok(Some(first.parse::<i64>().unwrap_or(0)))
}

/// `git shortlog -s` over the given revision arguments, as `(commits, author)`.
pub fn shortlog_summary(runner: &PipeRunner, rev_args: &[String]) -> Result<Vec<(u64, String)>> {
  let mut args: Vec<String> = vec!["shortlog".into(), "-s".into()];
  args.extend(rev_args.iter().cloned());
  let out = runner.run(&[git_log_stage(args)])?;
  Ok(parse_shortlog(&out))
}

pub fn parse_shortlog(out: &str) -> Vec<(u64, String)> {
  let mut rows = Vec::new();
  for line in out.lines() {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
      continue;
    }
    let parsed = trimmed
      .split_once(char::is_whitespace)
      .and_then(|(n, author)| n.parse::<u64>().ok().map(|n| (n, author.trim_start().to_string())));
    match parsed {
      Some(row) => rows.push(row),
      None => warn!("unexpected shortlog line {:?}", line),
    }
  }
  rows
}

/// Number of distinct authors, `git shortlog -s <range> | wc -l`.
pub fn count_authors(runner: &PipeRunner, rev_args: &[String]) -> Result<u64> {
  let mut args: Vec<String> = vec!["shortlog".into(), "-s".into()];
  args.extend(rev_args.iter().cloned());
  let out = runner.run(&[git_log_stage(args), Stage::line_count()])?;
  out
    .trim()
    .parse::<u64>()
    .with_context(|| format!("parsing author count {:?}", out))
}

fn rev_list_pretty(runner: &PipeRunner, format: &str, rev_args: &[String]) -> Result<Vec<String>> {
  let mut args: Vec<String> = vec!["rev-list".into(), format!("--pretty=format:{}", format)];
  args.extend(rev_args.iter().cloned());
  let out = runner.run(&[git_log_stage(args)])?;
  Ok(
    out
      .lines()
      .filter(|l| !l.is_empty() && !l.starts_with("commit "))
      .map(|l| l.to_string())
      .collect(),
  )
}

/// One `"<stamp> <date> <time> <tz> <author> <<email>>"` line per commit.
pub fn revision_lines(runner: &PipeRunner, rev_args: &[String]) -> Result<Vec<String>> {
  rev_list_pretty(runner, "%at %ai %aN <%aE>", rev_args)
}

/// One `(stamp, tree id)` pair per commit.
pub fn revision_trees(runner: &PipeRunner, rev_args: &[String]) -> Result<Vec<(i64, String)>> {
  let lines = rev_list_pretty(runner, "%at %T", rev_args)?;
  let mut out = Vec::with_capacity(lines.len());
  for line in lines {
    let parsed = line
      .split_once(' ')
      .and_then(|(stamp, tree)| stamp.parse::<i64>().ok().map(|s| (s, tree.trim().to_string())));
    match parsed {
      Some(pair) => out.push(pair),
      None => warn!("failed to parse revision line {:?}", line),
    }
  }
  Ok(out)
}

/// `git log --shortstat` with `"<stamp> <author>"` headers, newest first as git prints it.
pub fn shortstat_log(runner: &PipeRunner, rev_args: &[String], linear: bool) -> Result<Vec<String>> {
  let mut args: Vec<String> = vec!["log".into(), "--shortstat".into()];
  if linear {
    args.push("--first-parent".into());
    args.push("-m".into());
  } else {
    args.push("--date-order".into());
  }
  args.push("--pretty=format:%at %aN".into());
  args.extend(rev_args.iter().cloned());
  let out = runner.run(&[git_log_stage(args)])?;
  Ok(non_empty_lines(&out))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
  pub mode: String,
  pub kind: String,
  pub id: String,
  /// None for submodules (`-` in ls-tree output)
  pub size: Option<u64>,
  pub path: String,
}

impl TreeEntry {
  pub fn is_submodule(&self) -> bool {
    self.mode == "160000" && self.size.is_none()
  }
}

/// Every entry of the tree at `rev`, recursively, with sizes.
pub fn tree_entries(runner: &PipeRunner, rev: &str) -> Result<Vec<TreeEntry>> {
  let out = runner.run(&[Stage::git(["ls-tree", "-r", "-l", "-z", rev])])?;
  Ok(parse_tree_entries(&out))
}

/// Parse NUL-delimited `<mode> <type> <id> <size>\t<path>` records.
pub fn parse_tree_entries(out: &str) -> Vec<TreeEntry> {
  let mut entries = Vec::new();
  for record in out.split('\0') {
    if record.is_empty() {
      continue;
    }
    let Some((meta, path)) = record.split_once('\t') else {
      warn!("unexpected ls-tree record {:?}", record);
      continue;
    };
    let parts: Vec<&str> = meta.split_whitespace().collect();
    if parts.len() != 4 {
      warn!("unexpected ls-tree record {:?}", record);
      continue;
    }
    entries.push(TreeEntry {
      mode: parts[0].to_string(),
      kind: parts[1].to_string(),
      id: parts[2].to_string(),
      size: parts[3].parse::<u64>().ok(),
      path: path.to_string(),
    });
  }
  entries
}

/// Number of files tracked at `rev`, `git ls-tree -r --name-only <rev> | wc -l`.
pub fn count_tree_files(runner: &PipeRunner, rev: &str) -> Result<u64> {
  let out = runner.run(&[Stage::git(["ls-tree", "-r", "--name-only", rev]), Stage::line_count()])?;
  let first = out.lines().next().unwrap_or("").trim();
  first
    .parse::<u64>()
    .with_context(|| format!("parsing file count for {}: {:?}", rev, out))
}

pub fn read_blob(runner: &PipeRunner, blob_id: &str) -> Result<Vec<u8>> {
  Ok(runner.run_bytes(&[Stage::git(["cat-file", "blob", blob_id])])?)
}
