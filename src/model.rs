// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the aggregate data model (authors, activity buckets, extensions, domains, tags, churn series) handed to renderers
// role: model/types
// outputs: Serializable structs with stable field names; every field has a zero/empty default
// invariants:
// - author first/last stamps are min/max over everything seen, independent of stream order
// - busiest/peak counters are the max over their bucket maps at every point in time
// - only the orchestrating collection pass mutates a GitStats; renderers read it after refinement
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::commit::CommitRecord;
use crate::util::local_time;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AuthorStat {
  pub commits: u64,
  pub first_commit_stamp: i64,
  pub last_commit_stamp: i64,
  pub active_days: BTreeSet<String>,
  pub last_active_day: Option<String>,
  pub lines_added: u64,
  pub lines_removed: u64,
  // filled in by refinement
  pub place_by_commits: usize,
  pub commits_frac: f64,
  pub date_first: String,
  pub date_last: String,
  /// seconds between first and last commit
  pub timedelta: i64,
}

impl AuthorStat {
  fn observe(&mut self, rec: &CommitRecord) {
    let first_sight = self.last_active_day.is_none();
    if first_sight || rec.stamp > self.last_commit_stamp {
      self.last_commit_stamp = rec.stamp;
    }
    if first_sight || rec.stamp < self.first_commit_stamp {
      self.first_commit_stamp = rec.stamp;
    }
    if self.last_active_day.as_deref() != Some(rec.day.as_str()) {
      self.last_active_day = Some(rec.day.clone());
      self.active_days.insert(rec.day.clone());
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ExtensionStat {
  pub files: u64,
  pub lines: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DomainStat {
  pub commits: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TagInfo {
  pub stamp: i64,
  pub hash: String,
  pub date: String,
  /// commits since the previous tag (exclusive of its history)
  pub commits: u64,
  pub authors: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ChangeByDate {
  pub files: u64,
  pub ins: u64,
  pub del: u64,
  /// running line total right after this commit
  pub lines: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AuthorSnapshot {
  pub lines_added: u64,
  pub commits: u64,
}

fn bump<K: Ord>(map: &mut BTreeMap<K, u64>, key: K) -> u64 {
  let n = map.entry(key).or_insert(0);
  *n += 1;
  *n
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ActivityCounters {
  pub by_hour_of_day: BTreeMap<u32, u64>,
  pub hour_of_day_busiest: u64,
  pub by_day_of_week: BTreeMap<u32, u64>,
  /// weekday -> hour -> commits
  pub by_hour_of_week: BTreeMap<u32, BTreeMap<u32, u64>>,
  pub hour_of_week_busiest: u64,
  pub by_month_of_year: BTreeMap<u32, u64>,
  pub by_year_week: BTreeMap<String, u64>,
  pub year_week_peak: u64,
  pub commits_by_month: BTreeMap<String, u64>,
  pub commits_by_year: BTreeMap<i32, u64>,
  pub commits_by_timezone: BTreeMap<String, u64>,
}

impl ActivityCounters {
  pub fn record(&mut self, rec: &CommitRecord) {
    let n = bump(&mut self.by_hour_of_day, rec.hour);
    self.hour_of_day_busiest = self.hour_of_day_busiest.max(n);

    bump(&mut self.by_day_of_week, rec.weekday);

    let n = bump(self.by_hour_of_week.entry(rec.weekday).or_default(), rec.hour);
    self.hour_of_week_busiest = self.hour_of_week_busiest.max(n);

    bump(&mut self.by_month_of_year, rec.month);

    let n = bump(&mut self.by_year_week, rec.year_week.clone());
    self.year_week_peak = self.year_week_peak.max(n);

    bump(&mut self.commits_by_month, rec.year_month.clone());
    bump(&mut self.commits_by_year, rec.year);
    bump(&mut self.commits_by_timezone, rec.timezone.clone());
  }
}

/// Everything collected about one or more repositories.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GitStats {
  pub project_name: String,
  pub stamp_created: i64,

  pub activity: ActivityCounters,

  pub authors: BTreeMap<String, AuthorStat>,
  /// author names, most commits first; filled in by refinement
  pub authors_by_commits: Vec<String>,
  pub author_of_month: BTreeMap<String, BTreeMap<String, u64>>,
  pub author_of_year: BTreeMap<i32, BTreeMap<String, u64>>,
  pub domains: BTreeMap<String, DomainStat>,

  pub total_authors: u64,
  pub total_commits: u64,
  pub total_files: u64,
  pub total_size: u64,
  pub total_lines: i64,
  pub total_lines_added: u64,
  pub total_lines_removed: u64,

  pub lines_added_by_month: BTreeMap<String, u64>,
  pub lines_removed_by_month: BTreeMap<String, u64>,
  pub lines_added_by_year: BTreeMap<i32, u64>,
  pub lines_removed_by_year: BTreeMap<i32, u64>,

  pub first_commit_stamp: i64,
  pub last_commit_stamp: i64,
  pub last_active_day: Option<String>,
  pub active_days: BTreeSet<String>,

  pub tags: BTreeMap<String, TagInfo>,
  pub files_by_stamp: BTreeMap<i64, u64>,
  pub extensions: BTreeMap<String, ExtensionStat>,
  pub changes_by_date: BTreeMap<i64, ChangeByDate>,
  pub changes_by_date_by_author: BTreeMap<i64, BTreeMap<String, AuthorSnapshot>>,
}

impl GitStats {
  pub fn new(stamp_created: i64) -> Self {
    GitStats {
      stamp_created,
      ..Default::default()
    }
  }

  /// Fold one revision record into the activity, author, domain and calendar tables.
  pub fn record_commit(&mut self, rec: &CommitRecord) {
    // cherry-picks and patches mean stamps arrive in any order
    if rec.stamp > self.last_commit_stamp {
      self.last_commit_stamp = rec.stamp;
    }
    if self.first_commit_stamp == 0 || rec.stamp < self.first_commit_stamp {
      self.first_commit_stamp = rec.stamp;
    }

    self.activity.record(rec);
    self.domains.entry(rec.domain.clone()).or_default().commits += 1;
    self.authors.entry(rec.author.clone()).or_default().observe(rec);

    bump(
      self.author_of_month.entry(rec.year_month.clone()).or_default(),
      rec.author.clone(),
    );
    bump(self.author_of_year.entry(rec.year).or_default(), rec.author.clone());

    if self.last_active_day.as_deref() != Some(rec.day.as_str()) {
      self.last_active_day = Some(rec.day.clone());
      self.active_days.insert(rec.day.clone());
    }
  }

  /// Count one tracked file under its extension bucket.
  pub fn add_extension_file(&mut self, ext: &str) {
    self.extensions.entry(ext.to_string()).or_default().files += 1;
  }

  pub fn add_extension_lines(&mut self, ext: &str, lines: u64) {
    self.extensions.entry(ext.to_string()).or_default().lines += lines;
  }

  /// Author names by commit count descending, ties by name.
  pub fn authors(&self, limit: Option<usize>) -> Vec<String> {
    let mut names: Vec<(&String, u64)> = self.authors.iter().map(|(n, a)| (n, a.commits)).collect();
    names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let take = limit.unwrap_or(names.len());
    names.into_iter().take(take).map(|(n, _)| n.clone()).collect()
  }

  pub fn author_info(&self, author: &str) -> Option<&AuthorStat> {
    self.authors.get(author)
  }

  pub fn active_days(&self) -> &BTreeSet<String> {
    &self.active_days
  }

  pub fn activity_by_hour_of_day(&self) -> &BTreeMap<u32, u64> {
    &self.activity.by_hour_of_day
  }

  pub fn activity_by_day_of_week(&self) -> &BTreeMap<u32, u64> {
    &self.activity.by_day_of_week
  }

  /// Days spanned by the history, inclusive of the first day.
  pub fn commit_delta_days(&self) -> f64 {
    (self.last_commit_stamp as f64 / 86400.0 - self.first_commit_stamp as f64 / 86400.0) + 1.0
  }

  pub fn domains(&self) -> Vec<&str> {
    self.domains.keys().map(String::as_str).collect()
  }

  pub fn domain_info(&self, domain: &str) -> Option<&DomainStat> {
    self.domains.get(domain)
  }

  pub fn tags(&self) -> Vec<&str> {
    self.tags.keys().map(String::as_str).collect()
  }

  pub fn tag_info(&self, tag: &str) -> Option<&TagInfo> {
    self.tags.get(tag)
  }

  pub fn first_commit_date(&self) -> DateTime<Local> {
    local_time(self.first_commit_stamp)
  }

  pub fn last_commit_date(&self) -> DateTime<Local> {
    local_time(self.last_commit_stamp)
  }

  pub fn total_authors(&self) -> u64 {
    self.total_authors
  }

  pub fn total_commits(&self) -> u64 {
    self.total_commits
  }

  pub fn total_files(&self) -> u64 {
    self.total_files
  }

  pub fn total_loc(&self) -> i64 {
    self.total_lines
  }

  pub fn total_size(&self) -> u64 {
    self.total_size
  }
}
