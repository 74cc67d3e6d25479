use serde_json::json;

use super::common::{TestEnv, read_json};

#[test]
fn manifest_lists_stacks_in_deploy_order() {
  let env = TestEnv::new();
  env.synth(&["split"]);

  let manifest = read_json(&env.out_path().join("manifest.json"));
  assert_eq!(manifest["version"], 1);
  assert_eq!(manifest["stage"], "Dev");
  assert_eq!(manifest["project"], "FoundryVtt");

  let names: Vec<_> = manifest["stacks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["name"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(names, vec!["Dev-FoundryVttNetworkStack", "Dev-FoundryVttFilesystemStack"]);
  assert_eq!(manifest["stacks"][1]["dependencies"], json!(["Dev-FoundryVttNetworkStack"]));
  assert_eq!(manifest["stacks"][0]["hash"].as_str().unwrap().len(), 20);
}

#[test]
fn stage_and_project_flow_into_templates() {
  let env = TestEnv::new();
  env
    .vtt_cmd()
    .args(["synth", "split", "--stage", "Prod", "--out"])
    .arg(env.out_path())
    .env("PROJECT", "Tabletop")
    .assert()
    .success();

  let network = read_json(&env.out_path().join("Prod-TabletopNetworkStack.template.json"));
  assert_eq!(network["Outputs"]["VPCID"]["Export"]["Name"], "Prod-Tabletop-vpc-id");

  let filesystem = read_json(&env.out_path().join("Prod-TabletopFilesystemStack.template.json"));
  assert_eq!(filesystem["Outputs"]["FileSystemId"]["Export"]["Name"], "Prod-Tabletop-efs-id");
  assert_eq!(
    filesystem["Resources"]["MyEfsFileSystemEfsMountTarget1"]["Properties"]["SubnetId"],
    json!({ "Fn::Select": [0, { "Fn::Split": [",", { "Fn::ImportValue": "Prod-Tabletop-vpc-public-subnets" }] }] })
  );
}

#[test]
fn foundry_app_uses_secret_arn_from_env() {
  let env = TestEnv::new();
  env
    .vtt_cmd()
    .args(["synth", "foundry", "--out"])
    .arg(env.out_path())
    .env("FOUNDRY_SECRET_ARN", "arn:aws:secretsmanager:eu-west-1:1:secret:vtt")
    .assert()
    .success();

  let template = read_json(&env.out_path().join("Dev-FoundryVttFoundryStack.template.json"));
  let secrets = &template["Resources"]["TaskDefinition"]["Properties"]["ContainerDefinitions"][0]["Secrets"];
  assert!(
    secrets
      .as_array()
      .unwrap()
      .iter()
      .all(|s| s["ValueFrom"].as_str().unwrap().starts_with("arn:aws:secretsmanager:eu-west-1:1:secret:vtt:"))
  );
}

#[test]
fn cdn_flag_adds_distribution_and_export() {
  let env = TestEnv::new();
  env.synth(&["foundry", "--cdn"]);

  let template = read_json(&env.out_path().join("Dev-FoundryVttFoundryStack.template.json"));
  assert_eq!(template["Resources"]["CloudFront"]["Type"], "AWS::CloudFront::Distribution");
  assert_eq!(
    template["Outputs"]["CloudFrontDomainName"]["Export"]["Name"],
    "Dev-FoundryVtt-cloudfront-domain-name"
  );
}

#[test]
fn yaml_format_writes_yaml_templates() {
  let env = TestEnv::new();
  env.synth(&["ecs", "--format", "yaml"]);

  let path = env.out_path().join("Dev-FoundryVttStack.template.yaml");
  let content = std::fs::read_to_string(path).unwrap();
  assert!(content.contains("AWSTemplateFormatVersion"));

  let manifest = read_json(&env.out_path().join("manifest.json"));
  assert_eq!(manifest["stacks"][0]["template_file"], "Dev-FoundryVttStack.template.yaml");
}
