use assert_cmd::Command;

use crate::common;

#[test]
fn repositories_accumulate_into_one_report() {
  let a = common::init_fixture_repo();
  let b = common::init_fixture_repo();
  let out = tempfile::TempDir::new().unwrap();

  Command::cargo_bin("gitstats")
    .unwrap()
    .args([
      a.path().to_str().unwrap(),
      b.path().to_str().unwrap(),
      out.path().to_str().unwrap(),
    ])
    .assert()
    .success();

  let v: serde_json::Value =
    serde_json::from_slice(&std::fs::read(out.path().join("gitstats.json")).unwrap()).unwrap();
  let stats = &v["stats"];
  assert_eq!(stats["total_commits"], 6);
  assert_eq!(stats["total_files"], 8);
  assert_eq!(stats["total_lines"], 10);
  assert_eq!(stats["authors"]["Alice Example"]["commits"], 4);
  assert_eq!(stats["extensions"]["py"]["files"], 4);
}
