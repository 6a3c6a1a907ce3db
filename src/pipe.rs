// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Run external commands as a pipeline (stage N stdin <- stage N-1 stdout) and capture the last stage's output
// role: process execution
// inputs: working directory, ordered Stage list
// outputs: final stage stdout as text (trailing newlines stripped) or raw bytes
// side_effects: spawns child processes; adds elapsed wall-clock time to the run's ExecTimer
// invariants:
// - stages run concurrently like a shell pipeline; every started child is waited on before returning
// - each stage's stderr is drained on its own thread while the pipeline runs
// - non-UTF-8 output decodes byte-for-byte (Latin-1), never errors
// - ExecTimer only counts calls made from the orchestrating thread; a worker batch is counted once
// errors: spawn failure and non-zero exit surface the command line and stderr
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PipeError {
  #[error("failed to spawn `{command}`: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("reading output of `{command}`: {source}")]
  Read {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("`{command}` exited with {status}: {stderr}")]
  Failed {
    command: String,
    status: ExitStatus,
    stderr: String,
  },
}

/// One command in a pipeline. Arguments are passed verbatim, no shell involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
  pub program: String,
  pub args: Vec<String>,
}

impl Stage {
  pub fn new<I, S>(program: &str, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Stage {
      program: program.to_string(),
      args: args.into_iter().map(Into::into).collect(),
    }
  }

  pub fn git<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Stage::new("git", args)
  }

  /// `wc -l`, used to count lines of the previous stage.
  pub fn line_count() -> Self {
    Stage::new("wc", ["-l"])
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for a in &self.args {
      write!(f, " {}", a)?;
    }
    Ok(())
  }
}

fn describe(stages: &[Stage]) -> String {
  stages.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" | ")
}

/// Cumulative time spent waiting on external commands during one run.
#[derive(Debug, Clone, Default)]
pub struct ExecTimer {
  nanos: Arc<AtomicU64>,
}

impl ExecTimer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&self, elapsed: Duration) {
    let n = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    self.nanos.fetch_add(n, Ordering::Relaxed);
  }

  pub fn total(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
  }
}

/// Decode command output, falling back to one char per byte when it is not UTF-8.
pub fn decode_output(bytes: Vec<u8>) -> String {
  match String::from_utf8(bytes) {
    Ok(s) => s,
    Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
  }
}

#[derive(Debug, Clone)]
pub struct PipeRunner {
  dir: PathBuf,
  timer: ExecTimer,
}

impl PipeRunner {
  pub fn new<P: AsRef<Path>>(dir: P, timer: ExecTimer) -> Self {
    PipeRunner {
      dir: dir.as_ref().to_path_buf(),
      timer,
    }
  }

  /// Run `f` with an untimed runner for the same directory and add the batch's
  /// wall-clock time once. Calls made from worker threads go through here.
  pub fn batch<T>(&self, f: impl FnOnce(&PipeRunner) -> T) -> T {
    let worker = PipeRunner::new(&self.dir, ExecTimer::new());
    let start = Instant::now();
    let out = f(&worker);
    self.timer.add(start.elapsed());
    out
  }

  /// Run the pipeline and return the last stage's output with trailing newlines removed.
  pub fn run(&self, stages: &[Stage]) -> Result<String, PipeError> {
    let bytes = self.run_bytes(stages)?;
    let mut text = decode_output(bytes);
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    Ok(text)
  }

  /// Run the pipeline and return the last stage's raw stdout.
  pub fn run_bytes(&self, stages: &[Stage]) -> Result<Vec<u8>, PipeError> {
    let start = Instant::now();
    let result = self.exec(stages);
    let elapsed = start.elapsed();
    self.timer.add(elapsed);
    debug!("[{:.5}] >> {}", elapsed.as_secs_f64(), describe(stages));
    result
  }

  fn exec(&self, stages: &[Stage]) -> Result<Vec<u8>, PipeError> {
    let mut children: Vec<Running> = Vec::with_capacity(stages.len());
    let mut upstream: Option<std::process::ChildStdout> = None;

    for stage in stages {
      let mut cmd = Command::new(&stage.program);
      cmd
        .args(&stage.args)
        .current_dir(&self.dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
      match upstream.take() {
        Some(out) => cmd.stdin(Stdio::from(out)),
        None => cmd.stdin(Stdio::null()),
      };
      let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
          reap(children);
          return Err(PipeError::Spawn {
            command: stage.to_string(),
            source,
          });
        }
      };
      upstream = child.stdout.take();
      let stderr = drain(child.stderr.take());
      children.push(Running { stage, child, stderr });
    }

    let mut buf = Vec::new();
    if let Some(mut out) = upstream {
      if let Err(source) = out.read_to_end(&mut buf) {
        reap(children);
        return Err(PipeError::Read {
          command: describe(stages),
          source,
        });
      }
    }

    let mut failure: Option<PipeError> = None;
    for Running { stage, mut child, stderr } in children {
      let status = child.wait();
      let stderr = stderr.join().unwrap_or_default();
      let err = match status {
        Ok(status) if status.success() => continue,
        Ok(status) => PipeError::Failed {
          command: stage.to_string(),
          status,
          stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        },
        Err(source) => PipeError::Read {
          command: stage.to_string(),
          source,
        },
      };
      if failure.is_none() {
        failure = Some(err);
      }
    }

    match failure {
      Some(e) => Err(e),
      None => Ok(buf),
    }
  }
}

struct Running<'s> {
  stage: &'s Stage,
  child: Child,
  stderr: JoinHandle<Vec<u8>>,
}

fn drain(pipe: Option<ChildStderr>) -> JoinHandle<Vec<u8>> {
  thread::spawn(move || {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
      let _ = pipe.read_to_end(&mut buf);
    }
    buf
  })
}

/// Kill and wait on stages already started when the pipeline cannot complete.
/// Their stderr readers are detached and finish when the pipes close.
fn reap(children: Vec<Running>) {
  for mut r in children {
    let _ = r.child.kill();
    let _ = r.child.wait();
  }
}
