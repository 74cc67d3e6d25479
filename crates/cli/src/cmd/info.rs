use anyhow::Result;
use serde_json::json;

use vttcloud_lib::consts::{
  DEFAULT_ASSEMBLY_DIR, DEFAULT_PROJECT, DEFAULT_SECRET_ARN, DEFAULT_STAGE, FOUNDRY_IMAGE, FOUNDRY_PORT,
  PROJECT_ENV, STAGE_ENV,
};
use vttcloud_lib::{AppKind, StackConfig};

use crate::output::{print_info, print_json, print_stat};

pub fn cmd_info(config: &StackConfig, json: bool) -> Result<()> {
  let apps: Vec<_> = AppKind::ALL.iter().map(|kind| kind.to_string()).collect();

  if json {
    return print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "stage": config.stage,
      "project": config.project,
      "resource_group": config.resource_group_name(),
      "defaults": {
        "stage": DEFAULT_STAGE,
        "project": DEFAULT_PROJECT,
        "secret_arn": DEFAULT_SECRET_ARN,
        "assembly_dir": DEFAULT_ASSEMBLY_DIR,
      },
      "apps": apps,
    }));
  }

  print_info(&format!("vttcloud v{}", env!("CARGO_PKG_VERSION")));
  println!();
  print_stat("Stage", &format!("{} (${}, default {})", config.stage, STAGE_ENV, DEFAULT_STAGE));
  print_stat("Project", &format!("{} (${}, default {})", config.project, PROJECT_ENV, DEFAULT_PROJECT));
  print_stat("Resource group", &config.resource_group_name());
  print_stat("Apps", &apps.join(", "));
  println!();
  print_stat("Image", FOUNDRY_IMAGE);
  print_stat("Port", &FOUNDRY_PORT.to_string());
  print_stat("Secret", DEFAULT_SECRET_ARN);
  print_stat("Assembly dir", DEFAULT_ASSEMBLY_DIR);
  Ok(())
}
