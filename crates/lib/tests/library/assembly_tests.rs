use tempfile::TempDir;
use vttcloud_lib::AppKind;
use vttcloud_lib::assembly::{CloudAssembly, StackStatus, diff_assemblies};
use vttcloud_lib::template::TemplateFormat;

use super::common::synth;

#[test]
fn written_assembly_reloads_unchanged() {
  let temp = TempDir::new().unwrap();
  let assembly = synth(AppKind::Split, "Dev", "FoundryVtt");
  assembly.write_to(temp.path(), TemplateFormat::Json).unwrap();

  let loaded = CloudAssembly::load(temp.path()).unwrap();
  assert_eq!(loaded.manifest.stage, "Dev");
  assert_eq!(loaded.manifest.project, "FoundryVtt");

  let diff = diff_assemblies(Some(&loaded), &assembly);
  assert!(diff.is_empty());
}

#[test]
fn renamed_stage_replaces_every_stack() {
  let temp = TempDir::new().unwrap();
  synth(AppKind::Split, "Dev", "FoundryVtt")
    .write_to(temp.path(), TemplateFormat::Yaml)
    .unwrap();
  let old = CloudAssembly::load(temp.path()).unwrap();

  let new = synth(AppKind::Split, "Prod", "FoundryVtt");
  let diff = diff_assemblies(Some(&old), &new);

  let added = diff.stacks.iter().filter(|s| s.status == StackStatus::Added).count();
  let removed = diff.stacks.iter().filter(|s| s.status == StackStatus::Removed).count();
  assert_eq!((added, removed), (2, 2));
}

#[test]
fn enabling_cdn_modifies_only_the_foundry_stack() {
  use vttcloud_lib::FoundryOptions;

  let old = synth(AppKind::Foundry, "Dev", "FoundryVtt");
  let new = super::common::synth_with(
    AppKind::Foundry,
    "Dev",
    "FoundryVtt",
    &FoundryOptions {
      cdn: true,
      ..FoundryOptions::default()
    },
  );

  let diff = diff_assemblies(Some(&old), &new);
  assert_eq!(diff.stacks.len(), 1);
  let stack = &diff.stacks[0];
  assert_eq!(stack.status, StackStatus::Modified);
  assert!(
    stack
      .template
      .resources
      .iter()
      .any(|c| c.logical_id == "CloudFront")
  );
  assert!(stack.template.outputs.iter().any(|o| o.id == "CloudFrontDomainName"));
}
