// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, local-time conversion, extension bucketing, output directories and man page rendering
// role: utilities/helpers
// inputs: Various primitives; epoch seconds; paths; clap CommandFactory
// outputs: Canonicalized paths, local DateTimes and date strings, extension keys, man page text
// side_effects: prepare_out_dir creates directories
// invariants:
// - epoch conversion always goes through the machine's local timezone
// - extension keys are lowercase; missing or overlong extensions map to ""
// - prepare_out_dir returns an existing directory or fails
// errors: IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::CommandFactory;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

/// Converts an epoch timestamp to the machine's local time. Out-of-range values clamp to the epoch.
pub fn local_time(epoch: i64) -> DateTime<Local> {
  DateTime::<Utc>::from_timestamp(epoch, 0)
    .unwrap_or_default()
    .with_timezone(&Local)
}

/// `YYYY-MM-DD` of an epoch timestamp in local time.
pub fn local_date(epoch: i64) -> String {
  local_time(epoch).format("%Y-%m-%d").to_string()
}

/// Extension bucket for a tracked path.
///
/// Uses the final path component; a leading dot does not start an extension.
pub fn extension_of(path: &str, max_len: usize) -> String {
  let filename = path.rsplit('/').next().unwrap_or(path);
  match filename.rfind('.') {
    Some(pos) if pos > 0 => {
      let ext = &filename[pos + 1..];
      if ext.chars().count() > max_len {
        String::new()
      } else {
        ext.to_lowercase()
      }
    }
    _ => String::new(),
  }
}

/// Create the output directory if needed; an existing non-directory is an error.
pub fn prepare_out_dir(out: &Path) -> Result<PathBuf> {
  if out.exists() && !out.is_dir() {
    bail!("Output path is not a directory: {}", out.display());
  }
  std::fs::create_dir_all(out).with_context(|| format!("creating output directory {}", out.display()))?;
  Ok(PathBuf::from(canonicalize_lossy(out)))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
