use std::path::Path;
use std::process::Command;

#[allow(dead_code)]
pub fn run(repo: &Path, args: &[&str]) {
  let status = Command::new("git").args(args).current_dir(repo).status().unwrap();
  assert!(status.success(), "git {:?} failed", args);
}

#[allow(dead_code)]
pub fn commit(repo: &Path, files: &[(&str, &[u8])], author: (&str, &str), date: &str, message: &str) {
  for (path, content) in files {
    let full = repo.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&full, content).unwrap();
  }
  run(repo, &["add", "."]);

  let env = [
    ("GIT_AUTHOR_NAME", author.0),
    ("GIT_AUTHOR_EMAIL", author.1),
    ("GIT_AUTHOR_DATE", date),
    ("GIT_COMMITTER_DATE", date),
  ];
  let status = Command::new("git")
    .args(["commit", "-q", "-m", message])
    .current_dir(repo)
    .envs(env.iter().cloned())
    .status()
    .unwrap();
  assert!(status.success());
}

/// Three commits by two authors, a `v1` tag after the second, and one binary file.
#[allow(dead_code)]
pub fn init_fixture_repo() -> tempfile::TempDir {
  let dir = tempfile::TempDir::new().unwrap();
  let p = dir.path();

  run(p, &["init", "-q", "-b", "main"]);
  run(p, &["config", "user.name", "Fixture Bot"]);
  run(p, &["config", "user.email", "fixture@example.com"]);
  run(p, &["config", "commit.gpgsign", "false"]);
  run(p, &["config", "tag.gpgsign", "false"]);

  let alice = ("Alice Example", "alice@example.com");
  let bob = ("Bob", "bob@corp.io");

  commit(
    p,
    &[("src/app.py", &b"import os\nprint(os.name)\n"[..]), ("README", &b"demo\n"[..])],
    alice,
    "2024-03-01T09:00:00",
    "feat: initial app",
  );
  commit(
    p,
    &[("src/util.py", &b"def f():\n    return 1\n\n"[..]), ("logo.PNG", &b"\x89PNG\r\n\x1a\n\0\0\0"[..])],
    bob,
    "2024-03-02T15:30:00",
    "feat: util and logo",
  );
  run(p, &["tag", "v1"]);
  commit(p, &[("src/app.py", &b"import os\n"[..])], alice, "2024-03-05T11:00:00", "fix: trim app");

  dir
}
