//! Properties that hold for every stage/project pair.

use serde_json::json;
use vttcloud_lib::consts::{DEFAULT_PROJECT, DEFAULT_STAGE};
use vttcloud_lib::exports::ExportKey;
use vttcloud_lib::{App, AppKind, FoundryOptions, StackConfig};

use super::common::{CONFIGS, all_keys, synth, synth_with};

#[test]
fn every_key_is_scoped_by_stage_and_project() {
  let options = FoundryOptions {
    cdn: true,
    ..FoundryOptions::default()
  };
  for (stage, project) in CONFIGS {
    let prefix = format!("{stage}-{project}-");
    for kind in AppKind::ALL {
      let assembly = synth_with(kind, stage, project, &options);
      for key in all_keys(&assembly) {
        let suffix = key
          .strip_prefix(&prefix)
          .unwrap_or_else(|| panic!("{key} is not scoped by {prefix}"));
        assert!(
          ExportKey::ALL.iter().any(|k| k.suffix() == suffix),
          "unknown export suffix {suffix}"
        );
      }
    }
  }
}

#[test]
fn split_app_exports_and_imports_line_up() {
  let assembly = synth(AppKind::Split, "Dev", "FoundryVtt");
  let network = assembly.template("Dev-FoundryVttNetworkStack").unwrap();
  let filesystem = assembly.template("Dev-FoundryVttFilesystemStack").unwrap();

  let mut exported = network.export_names();
  exported.sort_unstable();
  assert_eq!(
    exported,
    vec![
      "Dev-FoundryVtt-vpc-azs",
      "Dev-FoundryVtt-vpc-id",
      "Dev-FoundryVtt-vpc-public-subnets",
    ]
  );
  assert_eq!(filesystem.import_names(), vec!["Dev-FoundryVtt-vpc-id", "Dev-FoundryVtt-vpc-public-subnets"]);
  assert!(filesystem.import_names().iter().all(|name| exported.contains(&name.as_str())));

  let mut fs_exports = filesystem.export_names();
  fs_exports.sort_unstable();
  assert_eq!(fs_exports, vec!["Dev-FoundryVtt-efs-id", "Dev-FoundryVtt-efs-sg"]);
}

#[test]
fn recorded_imports_match_template_imports() {
  let options = FoundryOptions {
    cdn: true,
    ..FoundryOptions::default()
  };
  for kind in AppKind::ALL {
    let config = StackConfig::new("Prod", "Tabletop");
    let app = App::build(kind, &config, &options).unwrap();
    for stack in app.stacks() {
      let mut recorded: Vec<String> = stack.imported_keys().map(|key| key.name(&config)).collect();
      recorded.sort();
      assert_eq!(recorded, stack.synth().import_names(), "{} ({kind})", stack.name());
    }
  }
}

#[test]
fn renaming_leaves_no_stale_keys() {
  for kind in AppKind::ALL {
    let before = all_keys(&synth(kind, "Dev", "FoundryVtt"));
    let after = all_keys(&synth(kind, "Prod", "Renamed"));

    assert_eq!(before.len(), after.len());
    for key in &after {
      assert!(key.starts_with("Prod-Renamed-"), "stale key {key}");
      assert!(!before.contains(key));
    }
  }
}

#[test]
fn file_system_policy_requires_mount_target() {
  for kind in [AppKind::Foundry, AppKind::Split] {
    let assembly = synth(kind, "Dev", "FoundryVtt");
    let policies: Vec<_> = assembly
      .templates
      .values()
      .flat_map(|t| t.resources_of_type("AWS::EFS::FileSystem"))
      .map(|(_, r)| r.property("FileSystemPolicy").cloned().unwrap())
      .collect();
    assert_eq!(policies.len(), 1);

    assert_eq!(
      policies[0]["Statement"],
      json!([{
        "Action": "elasticfilesystem:ClientMount",
        "Condition": { "Bool": { "elasticfilesystem:AccessedViaMountTarget": "true" } },
        "Effect": "Allow",
        "Principal": { "AWS": "*" },
      }])
    );
  }
}

#[test]
fn foundry_health_check_values() {
  let assembly = synth(AppKind::Foundry, "Dev", "FoundryVtt");
  let template = assembly.template("Dev-FoundryVttFoundryStack").unwrap();
  let (_, tg) = template
    .resources_of_type("AWS::ElasticLoadBalancingV2::TargetGroup")
    .next()
    .unwrap();

  let expect = [
    ("HealthCheckPath", json!("/api/status")),
    ("HealthCheckPort", json!("30000")),
    ("Matcher", json!({ "HttpCode": "200" })),
    ("HealthyThresholdCount", json!(2)),
    ("UnhealthyThresholdCount", json!(2)),
    ("HealthCheckTimeoutSeconds", json!(5)),
    ("HealthCheckIntervalSeconds", json!(10)),
  ];
  for (property, value) in expect {
    assert_eq!(tg.property(property), Some(&value), "{property}");
  }
}

#[test]
fn foundry_task_definition_shape() {
  let assembly = synth(AppKind::Foundry, "Dev", "FoundryVtt");
  let template = assembly.template("Dev-FoundryVttFoundryStack").unwrap();
  let (_, task) = template.resources_of_type("AWS::ECS::TaskDefinition").next().unwrap();

  assert_eq!(task.property("Cpu"), Some(&json!("2048")));
  assert_eq!(task.property("Memory"), Some(&json!("4096")));

  let volumes = task.property("Volumes").unwrap().as_array().unwrap();
  assert_eq!(volumes.len(), 1);
  assert_eq!(volumes[0]["Name"], "efs");

  let container = &task.property("ContainerDefinitions").unwrap()[0];
  assert_eq!(container["MountPoints"].as_array().unwrap().len(), 1);
  assert_eq!(container["MountPoints"][0]["ContainerPath"], "/data");
  assert_eq!(container["PortMappings"], json!([{ "ContainerPort": 30000, "Protocol": "tcp" }]));
}

#[test]
fn default_context_is_dev_foundryvtt() {
  let config = StackConfig::from_lookup(|_| None);
  assert_eq!(config.stage, DEFAULT_STAGE);
  assert_eq!(config.project, DEFAULT_PROJECT);
  assert_eq!(config, StackConfig::new("Dev", "FoundryVtt"));
}

#[test]
fn every_taggable_resource_carries_project_and_stage() {
  let assembly = synth(AppKind::Foundry, "Prod", "Tabletop");
  let template = assembly.template("Prod-TabletopFoundryStack").unwrap();

  let vpc = &template.resources["Vpc"];
  let tags = vpc.property("Tags").unwrap().as_array().unwrap();
  assert!(tags.contains(&json!({ "Key": "project", "Value": "Tabletop" })));
  assert!(tags.contains(&json!({ "Key": "stage", "Value": "Prod" })));

  let fs = &template.resources["MyEfsFileSystem"];
  assert!(fs.property("FileSystemTags").is_some());
  assert!(fs.property("Tags").is_none());
}
