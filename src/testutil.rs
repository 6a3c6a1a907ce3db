use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub fn git(dir: &Path, args: &[&str]) -> String {
  git_with_input(dir, args, None)
}

pub fn git_with_input(dir: &Path, args: &[&str], stdin: Option<&[u8]>) -> String {
  let mut child = Command::new("git")
    .args(args)
    .current_dir(dir)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .spawn()
    .unwrap();
  let mut input = child.stdin.take().unwrap();
  if let Some(data) = stdin {
    input.write_all(data).unwrap();
  }
  drop(input);
  let out = child.wait_with_output().unwrap();
  assert!(out.status.success(), "git {:?} failed", args);
  String::from_utf8(out.stdout).unwrap().trim().to_string()
}

pub fn init_repo() -> tempfile::TempDir {
  let dir = tempfile::TempDir::new().unwrap();
  git(dir.path(), &["init", "-q", "-b", "main"]);
  git(dir.path(), &["config", "user.name", "Fixture Bot"]);
  git(dir.path(), &["config", "user.email", "fixture@example.com"]);
  git(dir.path(), &["config", "commit.gpgsign", "false"]);
  git(dir.path(), &["config", "tag.gpgsign", "false"]);
  dir
}

/// Write `path`, stage everything and commit as `author <email>` at the given ISO date.
pub fn commit_file(repo: &Path, path: &str, content: &str, author: &str, email: &str, date: &str) {
  let full = repo.join(path);
  if let Some(parent) = full.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&full, content).unwrap();
  git(repo, &["add", "-A"]);
  let status = Command::new("git")
    .args(["commit", "-q", "-m", &format!("update {path}")])
    .current_dir(repo)
    .env("GIT_AUTHOR_NAME", author)
    .env("GIT_AUTHOR_EMAIL", email)
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .status()
    .unwrap();
  assert!(status.success());
}

/// `git merge --no-ff <branch>` into the current branch as `author <email>` at the given ISO date.
pub fn merge_no_ff(repo: &Path, branch: &str, author: &str, email: &str, date: &str) {
  let status = Command::new("git")
    .args(["merge", "-q", "--no-ff", "-m", &format!("merge {branch}"), branch])
    .current_dir(repo)
    .env("GIT_AUTHOR_NAME", author)
    .env("GIT_AUTHOR_EMAIL", email)
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .status()
    .unwrap();
  assert!(status.success());
}

/// A linear history of `n` commits by one author, one day apart starting 2024-01-01.
pub fn linear_repo(n: usize) -> tempfile::TempDir {
  let dir = init_repo();
  for i in 0..n {
    let date = format!("2024-01-{:02}T12:00:00", i + 1);
    let content: String = (0..=i).map(|l| format!("line {l}\n")).collect();
    commit_file(dir.path(), "notes.txt", &content, "Fixture Bot", "fixture@example.com", &date);
  }
  dir
}
