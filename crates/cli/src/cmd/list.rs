//! List command implementation.
//!
//! Prints an app's stacks in deploy order with the stacks they import from.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use vttcloud_lib::{AppKind, StackConfig};

use crate::output::{print_json, symbols};

use super::{FoundryArgs, build_app};

#[derive(Serialize)]
struct StackEntry<'a> {
  name: &'a str,
  description: Option<&'a str>,
  dependencies: Vec<&'a str>,
  wave: usize,
}

pub fn cmd_list(config: &StackConfig, kind: AppKind, foundry: &FoundryArgs, json: bool) -> Result<()> {
  let app = build_app(config, kind, foundry)?;
  let waves = app.graph()?.deploy_waves()?;
  let wave_of = |name: &str| waves.iter().position(|w| w.iter().any(|n| n == name)).unwrap_or(0);

  let entries: Vec<StackEntry<'_>> = app
    .deploy_order()?
    .into_iter()
    .map(|stack| StackEntry {
      name: stack.name(),
      description: stack.description(),
      dependencies: stack.dependencies().collect(),
      wave: wave_of(stack.name()),
    })
    .collect();

  if json {
    return print_json(&entries);
  }

  for (index, entry) in entries.iter().enumerate() {
    println!(
      "{}. {}",
      index + 1,
      entry.name.if_supports_color(Stream::Stdout, |s| s.bold())
    );
    if let Some(description) = entry.description {
      println!("   {}", description.if_supports_color(Stream::Stdout, |s| s.dimmed()));
    }
    for dependency in &entry.dependencies {
      println!("   {} {}", symbols::ARROW, dependency);
    }
  }
  Ok(())
}
