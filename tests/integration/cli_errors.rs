use assert_cmd::Command;
use predicates::prelude::*;

use crate::common;

#[test]
fn output_path_that_is_a_file_fails() {
  let repo = common::init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let file = td.path().join("occupied");
  std::fs::write(&file, "x").unwrap();

  Command::cargo_bin("gitstats")
    .unwrap()
    .args([repo.path().to_str().unwrap(), file.to_str().unwrap()])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn unknown_config_key_fails() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();

  Command::cargo_bin("gitstats")
    .unwrap()
    .args(["-c", "colour=blue", repo.path().to_str().unwrap(), out.path().to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("No such key"));
}

#[test]
fn malformed_override_fails() {
  Command::cargo_bin("gitstats")
    .unwrap()
    .args(["-c", "processes", "repo", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("key=value"));
}

#[test]
fn missing_output_path_is_a_usage_error() {
  Command::cargo_bin("gitstats")
    .unwrap()
    .arg("only-one-path")
    .assert()
    .failure();
}

#[test]
fn empty_selection_reports_no_commits() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();

  Command::cargo_bin("gitstats")
    .unwrap()
    .args(["-c", "start_date=2099-01-01", repo.path().to_str().unwrap(), out.path().to_str().unwrap()])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("no commits"));
}
