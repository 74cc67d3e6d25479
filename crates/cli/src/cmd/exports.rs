//! Exports command implementation.
//!
//! Shows every cross-stack export of an app with its producer and consumers.

use anyhow::Result;
use serde::Serialize;

use vttcloud_lib::exports::ExportKey;
use vttcloud_lib::{AppKind, StackConfig};

use crate::output::{print_info, print_json, print_stat};

use super::{FoundryArgs, build_app};

#[derive(Serialize)]
struct ExportEntry<'a> {
  key: ExportKey,
  name: String,
  producer: &'a str,
  consumers: Vec<&'a str>,
}

pub fn cmd_exports(config: &StackConfig, kind: AppKind, foundry: &FoundryArgs, json: bool) -> Result<()> {
  let app = build_app(config, kind, foundry)?;

  let entries: Vec<ExportEntry<'_>> = app
    .registry()
    .entries()
    .map(|(key, name, producer)| ExportEntry {
      key,
      name,
      producer,
      consumers: app
        .stacks()
        .iter()
        .filter(|s| s.imported_keys().any(|k| k == key))
        .map(|s| s.name())
        .collect(),
    })
    .collect();

  if json {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info("No exports.");
    return Ok(());
  }

  for entry in &entries {
    print_info(&entry.name);
    print_stat("producer", entry.producer);
    if !entry.consumers.is_empty() {
      print_stat("consumers", &entry.consumers.join(", "));
    }
  }
  Ok(())
}
