//! Diff command implementation.
//!
//! Synthesizes in memory and compares against the assembly already on disk.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use vttcloud_lib::assembly::{AssemblyDiff, ChangeKind, CloudAssembly, StackStatus, diff_assemblies};
use vttcloud_lib::{AppKind, StackConfig};

use crate::output::{print_change, print_json, print_success, print_warning, symbols};

use super::{FoundryArgs, build_app};

pub fn cmd_diff(
  config: &StackConfig,
  kind: AppKind,
  foundry: &FoundryArgs,
  dir: &Path,
  verbose: bool,
  json: bool,
) -> Result<()> {
  let app = build_app(config, kind, foundry)?;
  let assembly = app.synth().context("Failed to synthesize app")?;

  let previous = CloudAssembly::load_if_present(dir)
    .with_context(|| format!("Failed to load assembly from {}", dir.display()))?;
  if previous.is_none() && !json {
    print_warning(&format!("No assembly in {}; every stack is new", dir.display()));
  }

  let diff = diff_assemblies(previous.as_ref(), &assembly);

  if json {
    return print_json(&diff);
  }
  print_human_diff(&diff, verbose);
  Ok(())
}

fn change_symbol(kind: ChangeKind) -> &'static str {
  match kind {
    ChangeKind::Added => symbols::ADD,
    ChangeKind::Removed => symbols::REMOVE,
    ChangeKind::Modified => symbols::MODIFY,
  }
}

fn print_human_diff(diff: &AssemblyDiff, verbose: bool) {
  if diff.is_empty() {
    print_success("No changes.");
    return;
  }

  for stack in diff.changed() {
    let symbol = match stack.status {
      StackStatus::Added => symbols::ADD,
      StackStatus::Removed => symbols::REMOVE,
      StackStatus::Modified | StackStatus::Unchanged => symbols::MODIFY,
    };
    print_change(symbol, 0, &format!("{}", stack.name.if_supports_color(Stream::Stdout, |s| s.bold())));

    let template = &stack.template;
    if !verbose {
      println!(
        "    {} added, {} modified, {} removed",
        template.count(ChangeKind::Added),
        template.count(ChangeKind::Modified),
        template.count(ChangeKind::Removed)
      );
      continue;
    }

    for change in &template.resources {
      let mut line = format!("{} ({})", change.logical_id, change.resource_type);
      if change.replaced {
        line.push_str(" [replaced]");
      }
      if !change.changed_properties.is_empty() {
        line.push_str(&format!(" {}", change.changed_properties.join(", ")));
      }
      print_change(change_symbol(change.kind), 4, &line);
    }
    for output in &template.outputs {
      print_change(change_symbol(output.kind), 4, &format!("Output {}", output.id));
    }
  }
}
