use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn diff_without_assembly_reports_everything_added() {
  let env = TestEnv::new();

  env
    .vtt_cmd()
    .args(["diff", "split", "--out"])
    .arg(env.temp.path().join("missing"))
    .assert()
    .success()
    .stderr(predicate::str::contains("every stack is new"))
    .stdout(predicate::str::contains("Dev-FoundryVttNetworkStack"));
}

#[test]
fn diff_after_synth_is_clean() {
  let env = TestEnv::new();
  env.synth(&["foundry"]);

  env
    .vtt_cmd()
    .args(["diff", "foundry", "--out"])
    .arg(env.out_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes"));
}

#[test]
fn diff_shows_cdn_resources_when_enabled() {
  let env = TestEnv::new();
  env.synth(&["foundry"]);

  env
    .vtt_cmd()
    .args(["diff", "foundry", "--cdn", "-v", "--out"])
    .arg(env.out_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("CloudFront (AWS::CloudFront::Distribution)"))
    .stdout(predicate::str::contains("Output CloudFrontDomainName"));
}

#[test]
fn diff_json_output() {
  let env = TestEnv::new();
  env.synth(&["split"]);

  let output = env
    .vtt_cmd()
    .args(["diff", "split", "--stage", "Prod", "-o", "json", "--out"])
    .arg(env.out_path())
    .output()
    .unwrap();
  assert!(output.status.success());

  let diff: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let statuses: Vec<_> = diff["stacks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["status"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(statuses, vec!["added", "added", "removed", "removed"]);
}
