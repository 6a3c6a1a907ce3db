// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fold `git log --shortstat` output into the line-churn series (project-wide and per author)
// role: stream parsing
// inputs: shortstat log lines exactly as git prints them (newest commit first)
// outputs: ChangeByDate series, month/year added/removed sums, per-author commits/lines and snapshots
// side_effects: mutates the GitStats passed in
// invariants:
// - input is reversed before folding, so a commit's stat line is seen before its header
// - the running line total equals the sum of insertions minus deletions seen so far
// - pending counts are reset after every header, well-formed or not
// errors: malformed headers and stat lines are logged and skipped, never fatal
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::model::{AuthorSnapshot, ChangeByDate, GitStats};
use crate::util::local_time;

static STAT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"files? changed").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

pub fn is_stat_line(line: &str) -> bool {
  STAT_LINE.is_match(line)
}

/// `(files, insertions, deletions)` from a summary line such as
/// ` 3 files changed, 10 insertions(+), 2 deletions(-)`.
///
/// git leaves out zero counts, so one number means only files changed and
/// two numbers are disambiguated by the `(+)` / `(-)` marker.
pub fn parse_shortstat_counts(line: &str) -> Option<(u64, u64, u64)> {
  let numbers: Vec<u64> = NUMBER
    .find_iter(line)
    .filter_map(|m| m.as_str().parse::<u64>().ok())
    .collect();
  match numbers.as_slice() {
    [files] => Some((*files, 0, 0)),
    [files, ins] if line.contains("(+)") => Some((*files, *ins, 0)),
    [files, del] if line.contains("(-)") => Some((*files, 0, *del)),
    [files, ins, del] => Some((*files, *ins, *del)),
    _ => None,
  }
}

fn parse_header(line: &str) -> Option<(i64, &str)> {
  let (stamp, author) = line.split_once(' ')?;
  Some((stamp.parse::<i64>().ok()?, author))
}

#[derive(Debug, Default, Clone, Copy)]
struct Pending {
  files: u64,
  ins: u64,
  del: u64,
}

impl Pending {
  fn take(&mut self) -> Pending {
    std::mem::take(self)
  }
}

/// Project-wide churn over the (optionally first-parent) history.
#[derive(Debug, Default)]
pub struct LineStatPass {
  pending: Pending,
  total: i64,
}

impl LineStatPass {
  /// Folds `lines` (newest first) into `stats` and returns this repository's line total.
  pub fn run(stats: &mut GitStats, lines: &[String]) -> i64 {
    let mut pass = LineStatPass::default();
    for line in lines.iter().rev() {
      pass.feed(stats, line);
    }
    stats.total_lines += pass.total;
    pass.total
  }

  fn feed(&mut self, stats: &mut GitStats, line: &str) {
    if line.is_empty() {
      return;
    }
    if is_stat_line(line) {
      match parse_shortstat_counts(line) {
        Some((files, ins, del)) => {
          self.pending = Pending { files, ins, del };
          self.total += ins as i64 - del as i64;
          stats.total_lines_added += ins;
          stats.total_lines_removed += del;
        }
        None => warn!("failed to handle line {:?}", line),
      }
      return;
    }

    let pending = self.pending.take();
    let Some((stamp, _author)) = parse_header(line) else {
      warn!("unexpected line {:?}", line);
      return;
    };
    stats.changes_by_date.insert(
      stamp,
      ChangeByDate {
        files: pending.files,
        ins: pending.ins,
        del: pending.del,
        lines: self.total,
      },
    );

    let date = local_time(stamp);
    let yymm = date.format("%Y-%m").to_string();
    *stats.lines_added_by_month.entry(yymm.clone()).or_insert(0) += pending.ins;
    *stats.lines_removed_by_month.entry(yymm).or_insert(0) += pending.del;
    *stats.lines_added_by_year.entry(date.year()).or_insert(0) += pending.ins;
    *stats.lines_removed_by_year.entry(date.year()).or_insert(0) += pending.del;
  }
}

/// Per-author commits and churn over the full history in date order.
#[derive(Debug, Default)]
pub struct AuthorLinePass {
  pending: Pending,
  stamp: i64,
}

impl AuthorLinePass {
  pub fn run(stats: &mut GitStats, lines: &[String]) {
    let mut pass = AuthorLinePass::default();
    for line in lines.iter().rev() {
      pass.feed(stats, line);
    }
  }

  fn feed(&mut self, stats: &mut GitStats, line: &str) {
    if line.is_empty() {
      return;
    }
    if is_stat_line(line) {
      match parse_shortstat_counts(line) {
        Some((files, ins, del)) => self.pending = Pending { files, ins, del },
        None => warn!("failed to handle line {:?}", line),
      }
      return;
    }

    let pending = self.pending.take();
    let Some((stamp, author)) = parse_header(line) else {
      warn!("unexpected line {:?}", line);
      return;
    };
    // clock skew: never step backwards
    self.stamp = self.stamp.max(stamp);

    let entry = stats.authors.entry(author.to_string()).or_default();
    entry.commits += 1;
    entry.lines_added += pending.ins;
    entry.lines_removed += pending.del;
    let snapshot = AuthorSnapshot {
      lines_added: entry.lines_added,
      commits: entry.commits,
    };
    stats
      .changes_by_date_by_author
      .entry(self.stamp)
      .or_default()
      .insert(author.to_string(), snapshot);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
  }

  // newest first, as git prints it
  fn alice_then_bob() -> Vec<String> {
    lines(&[
      "1704153600 bob",
      "",
      " 1 file changed, 5 insertions(+)",
      "1704067200 alice",
      "",
      " 3 files changed, 10 insertions(+), 2 deletions(-)",
    ])
  }

  #[test]
  fn summary_counts_fill_missing_fields() {
    assert_eq!(parse_shortstat_counts(" 0 files changed"), Some((0, 0, 0)));
    assert_eq!(parse_shortstat_counts(" 1 file changed, 5 insertions(+)"), Some((1, 5, 0)));
    assert_eq!(parse_shortstat_counts(" 2 files changed, 7 deletions(-)"), Some((2, 0, 7)));
    assert_eq!(
      parse_shortstat_counts(" 3 files changed, 10 insertions(+), 2 deletions(-)"),
      Some((3, 10, 2))
    );
    assert_eq!(parse_shortstat_counts(" files changed"), None);
  }

  #[test]
  fn cumulative_lines_follow_history() {
    let mut s = GitStats::default();
    let total = LineStatPass::run(&mut s, &alice_then_bob());
    assert_eq!(total, 13);
    assert_eq!(s.total_lines, 13);
    assert_eq!(s.total_lines_added, 15);
    assert_eq!(s.total_lines_removed, 2);
    assert_eq!(s.changes_by_date[&1704067200].lines, 8);
    assert_eq!(
      s.changes_by_date[&1704153600],
      ChangeByDate { files: 1, ins: 5, del: 0, lines: 13 }
    );
    let added: u64 = s.lines_added_by_year.values().sum();
    assert_eq!(added, 15);
  }

  #[test]
  fn author_pass_counts_commits_and_lines() {
    let mut s = GitStats::default();
    AuthorLinePass::run(&mut s, &alice_then_bob());
    let alice = &s.authors["alice"];
    assert_eq!((alice.commits, alice.lines_added, alice.lines_removed), (1, 10, 2));
    let bob = &s.authors["bob"];
    assert_eq!((bob.commits, bob.lines_added, bob.lines_removed), (1, 5, 0));
    assert_eq!(
      s.changes_by_date_by_author[&1704153600]["bob"],
      AuthorSnapshot { lines_added: 5, commits: 1 }
    );
  }

  #[test]
  fn author_pass_keeps_previous_stamp_on_clock_skew() {
    let mut s = GitStats::default();
    let input = lines(&["100 bob", " 1 file changed, 1 insertion(+)", "200 alice", " 1 file changed, 2 insertions(+)"]);
    AuthorLinePass::run(&mut s, &input);
    assert_eq!(s.changes_by_date_by_author.len(), 1);
    let at_200 = &s.changes_by_date_by_author[&200];
    assert!(at_200.contains_key("alice") && at_200.contains_key("bob"));
  }

  #[test]
  fn malformed_header_resets_pending_counts() {
    let mut s = GitStats::default();
    let input = lines(&["300 carol", "garbage", " 4 files changed, 9 insertions(+)"]);
    LineStatPass::run(&mut s, &input);
    // the 9 insertions belonged to the broken header and are not attributed to carol
    assert_eq!(s.changes_by_date[&300].ins, 0);
    assert_eq!(s.total_lines, 9);
  }

  proptest! {
    #[test]
    fn total_is_insertions_minus_deletions(commits in prop::collection::vec((0u64..500, 0u64..500), 0..40)) {
      let mut raw = Vec::new();
      for (i, (ins, del)) in commits.iter().enumerate().rev() {
        raw.push(format!("{} dev", 1_700_000_000 + i as i64));
        raw.push(String::new());
        raw.push(format!(" 1 file changed, {} insertions(+), {} deletions(-)", ins, del));
      }
      let mut s = GitStats::default();
      let total = LineStatPass::run(&mut s, &raw);
      let expected: i64 = commits.iter().map(|(i, d)| *i as i64 - *d as i64).sum();
      prop_assert_eq!(total, expected);
      if let Some((_, last)) = s.changes_by_date.iter().next_back() {
        prop_assert_eq!(last.lines, expected);
      }
    }
  }
}
