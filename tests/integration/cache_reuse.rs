use assert_cmd::Command;
use predicates::prelude::*;

use crate::common;

fn gitstats(repo: &std::path::Path, out: &std::path::Path) -> assert_cmd::assert::Assert {
  Command::cargo_bin("gitstats")
    .unwrap()
    .args([repo.to_str().unwrap(), out.to_str().unwrap()])
    .assert()
}

fn stats_without_timestamp(out: &std::path::Path) -> serde_json::Value {
  let mut v: serde_json::Value = serde_json::from_slice(&std::fs::read(out.join("gitstats.json")).unwrap()).unwrap();
  v["stats"]["stamp_created"] = serde_json::Value::Null;
  v["stats"].clone()
}

#[test]
fn second_run_reuses_cache_with_same_result() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();

  gitstats(repo.path(), out.path()).success();
  let cache = out.path().join("gitstats.cache");
  let first_cache = std::fs::read(&cache).unwrap();
  let first = stats_without_timestamp(out.path());

  gitstats(repo.path(), out.path()).success();
  assert_eq!(std::fs::read(&cache).unwrap(), first_cache);
  assert_eq!(stats_without_timestamp(out.path()), first);
  assert!(!out.path().join("gitstats.cache.tmp").exists());
}

#[test]
fn new_commits_extend_existing_cache() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();
  gitstats(repo.path(), out.path()).success();

  common::commit(
    repo.path(),
    &[("src/extra.py", &b"x = 1\n"[..])],
    ("Carol", "carol@example.com"),
    "2024-03-09T08:00:00",
    "feat: extra",
  );
  gitstats(repo.path(), out.path()).success();

  let v = stats_without_timestamp(out.path());
  assert_eq!(v["total_commits"], 4);
  assert_eq!(v["extensions"]["py"]["lines"], 5);
  assert_eq!(v["authors"]["Carol"]["commits"], 1);
}

#[test]
fn corrupt_cache_aborts_the_run() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();
  std::fs::write(out.path().join("gitstats.cache"), b"definitely not a cache").unwrap();

  gitstats(repo.path(), out.path())
    .failure()
    .code(1)
    .stderr(predicate::str::contains("Error:").and(predicate::str::contains("corrupt")));
}
