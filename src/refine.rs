use thiserror::Error;

use crate::model::GitStats;
use crate::util::local_date;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefineError {
  #[error("no commits found in the selected range")]
  NoCommits,
}

/// Derive per-author rank, commit share, dates and active span.
///
/// Safe to call more than once; every derived field is recomputed from the raw counters.
pub fn refine(stats: &mut GitStats) -> Result<(), RefineError> {
  if stats.total_commits == 0 {
    return Err(RefineError::NoCommits);
  }
  let ranked = stats.authors(None);
  let total = stats.total_commits as f64;
  for (place, name) in ranked.iter().enumerate() {
    if let Some(a) = stats.authors.get_mut(name) {
      a.place_by_commits = place + 1;
      a.commits_frac = 100.0 * a.commits as f64 / total;
      a.date_first = local_date(a.first_commit_stamp);
      a.date_last = local_date(a.last_commit_stamp);
      a.timedelta = a.last_commit_stamp - a.first_commit_stamp;
    }
  }
  stats.authors_by_commits = ranked;
  Ok(())
}
