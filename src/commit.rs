// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Turn one revision line ("<stamp> <date> <time> <tz> <name> <<email>>") into a CommitRecord with calendar buckets
// role: commit parsing
// inputs: rev-list output lines in the %at %ai %aN <%aE> format
// outputs: CommitRecord (ephemeral; folded into the aggregate model right away)
// side_effects: none
// invariants:
// - calendar fields come from the local-time conversion of the epoch stamp, never from the commit's own offset
// - the offset string is kept verbatim for the timezone distribution only
// - domain is the text after the last '@' of the email, "?" when there is none
// errors: malformed lines yield None; an unparsable stamp becomes 0
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{Datelike, Timelike};

use crate::util::local_time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub stamp: i64,
  pub author: String,
  pub email: String,
  pub timezone: String,
  pub domain: String,
  pub hour: u32,
  /// 0 = Monday .. 6 = Sunday
  pub weekday: u32,
  pub month: u32,
  pub year: i32,
  /// `%Y-%W`
  pub year_week: String,
  /// `YYYY-MM`
  pub year_month: String,
  /// `YYYY-MM-DD`
  pub day: String,
}

pub fn email_domain(email: &str) -> String {
  match email.rsplit_once('@') {
    Some((_, domain)) => domain.to_string(),
    None => "?".to_string(),
  }
}

impl CommitRecord {
  pub fn new(stamp: i64, author: &str, email: &str, timezone: &str) -> Self {
    let date = local_time(stamp);
    CommitRecord {
      stamp,
      author: author.to_string(),
      email: email.to_string(),
      timezone: timezone.to_string(),
      domain: email_domain(email),
      hour: date.hour(),
      weekday: date.weekday().num_days_from_monday(),
      month: date.month(),
      year: date.year(),
      year_week: date.format("%Y-%W").to_string(),
      year_month: date.format("%Y-%m").to_string(),
      day: date.format("%Y-%m-%d").to_string(),
    }
  }

  pub fn parse(line: &str) -> Option<Self> {
    let parts: Vec<&str> = line.splitn(5, ' ').collect();
    if parts.len() != 5 {
      return None;
    }
    let stamp = parts[0].parse::<i64>().unwrap_or(0);
    let timezone = parts[3];
    let (author, mail) = parts[4].split_once('<')?;
    let author = author.trim_end();
    let mail = mail.trim_end_matches('>');
    Some(CommitRecord::new(stamp, author, mail, timezone))
  }
}
