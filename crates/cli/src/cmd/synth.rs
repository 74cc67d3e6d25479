//! Synth command implementation.
//!
//! Builds an app, synthesizes it and writes the cloud assembly to disk.

use std::path::Path;

use anyhow::{Context, Result};

use vttcloud_lib::template::TemplateFormat;
use vttcloud_lib::{AppKind, StackConfig};

use crate::output::{print_info, print_stat, print_success, symbols, truncate_hash};

use super::{FoundryArgs, build_app};

pub fn cmd_synth(
  config: &StackConfig,
  kind: AppKind,
  foundry: &FoundryArgs,
  out: &Path,
  format: TemplateFormat,
  verbose: bool,
) -> Result<()> {
  let app = build_app(config, kind, foundry)?;
  let assembly = app.synth().context("Failed to synthesize app")?;
  let manifest = assembly
    .write_to(out, format)
    .with_context(|| format!("Failed to write assembly to {}", out.display()))?;

  for stack in &manifest.stacks {
    print_info(&format!(
      "{} {} {}",
      stack.name,
      symbols::ARROW,
      out.join(&stack.template_file).display()
    ));
    if verbose {
      if let Some(template) = assembly.template(&stack.name) {
        print_stat("resources", &template.resources.len().to_string());
        print_stat("outputs", &template.outputs.len().to_string());
      }
      print_stat("hash", truncate_hash(&stack.hash.0));
    }
  }

  print_success(&format!(
    "Synthesized {} stack(s) for {} into {}",
    manifest.stacks.len(),
    config,
    out.display()
  ));
  Ok(())
}
