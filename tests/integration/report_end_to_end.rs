use assert_cmd::Command;
use predicates::prelude::*;

use crate::common;

fn read_json(path: &std::path::Path) -> serde_json::Value {
  serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn report_captures_fixture_history() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();
  let out_dir = out.path().join("report");

  Command::cargo_bin("gitstats")
    .unwrap()
    .args([repo.path().to_str().unwrap(), out_dir.to_str().unwrap()])
    .env_remove("RUST_LOG")
    .assert()
    .success()
    .stdout(predicate::str::contains("Execution time").and(predicate::str::contains("in external commands")));

  assert!(out_dir.join("gitstats.cache").is_file());
  let v = read_json(&out_dir.join("gitstats.json"));
  let summary = &v["summary"];
  assert_eq!(summary["total_commits"], 3);
  assert_eq!(summary["total_authors"], 2);
  assert_eq!(summary["total_files"], 4);
  assert_eq!(summary["total_loc"], 5);
  assert_eq!(summary["top_authors"][0], "Alice Example");

  let stats = &v["stats"];
  let alice = &stats["authors"]["Alice Example"];
  assert_eq!(alice["commits"], 2);
  assert_eq!(alice["lines_added"], 3);
  assert_eq!(alice["lines_removed"], 1);
  assert_eq!(alice["place_by_commits"], 1);
  assert_eq!(stats["authors"]["Bob"]["place_by_commits"], 2);

  assert_eq!(stats["extensions"]["py"]["files"], 2);
  assert_eq!(stats["extensions"]["py"]["lines"], 4);
  assert_eq!(stats["extensions"]["png"]["lines"], 0);
  assert_eq!(stats["extensions"][""]["files"], 1);

  assert_eq!(stats["domains"]["example.com"]["commits"], 2);
  assert_eq!(stats["domains"]["corp.io"]["commits"], 1);

  assert_eq!(stats["tags"]["v1"]["commits"], 2);
  assert_eq!(stats["tags"]["v1"]["authors"]["Bob"], 1);
}

#[test]
fn json_format_exports_next_to_output_dir() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();
  let out_dir = out.path().join("site");

  Command::cargo_bin("gitstats")
    .unwrap()
    .args(["--format", "json", repo.path().to_str().unwrap(), out_dir.to_str().unwrap()])
    .assert()
    .success();

  let extra = out.path().join("site.json");
  assert!(extra.is_file());
  assert_eq!(read_json(&extra)["summary"]["total_commits"], 3);
}

#[test]
fn config_overrides_reach_collection() {
  let repo = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();

  Command::cargo_bin("gitstats")
    .unwrap()
    .args([
      "-c",
      "exclude_exts=PY",
      "-c",
      "project_name=Fixture",
      "-c",
      "processes=1",
      repo.path().to_str().unwrap(),
      out.path().to_str().unwrap(),
    ])
    .assert()
    .success();

  let v = read_json(&out.path().join("gitstats.json"));
  assert_eq!(v["summary"]["project_name"], "Fixture");
  assert_eq!(v["stats"]["extensions"]["py"]["lines"], 0);
  assert_eq!(v["config"]["processes"], 1);
}
