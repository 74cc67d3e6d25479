use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StackConfig;
use crate::consts::ASSEMBLY_VERSION;
use crate::template::{RenderError, Template, TemplateFormat};
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// Manifest file name inside an assembly directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Errors reading or writing a cloud assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
  #[error("failed to create assembly directory {path}: {source}")]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("failed to read {path}: {source}")]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to write {path}: {source}")]
  Write { path: PathBuf, source: io::Error },

  #[error("no assembly manifest found in {0}")]
  NotFound(PathBuf),

  #[error("failed to parse assembly manifest: {0}")]
  ParseManifest(#[source] serde_json::Error),

  #[error("failed to serialize assembly manifest: {0}")]
  SerializeManifest(#[source] serde_json::Error),

  #[error("template {file}: {source}")]
  Template { file: String, source: RenderError },

  #[error("failed to hash template for stack {stack}: {source}")]
  Hash { stack: String, source: HashError },

  #[error("unsupported assembly manifest version {0}")]
  UnsupportedVersion(u32),

  #[error("manifest lists stack {0} twice")]
  DuplicateStack(String),

  #[error("manifest lists stack {0} but the assembly has no template for it")]
  MissingTemplate(String),
}

/// Per-stack manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackManifest {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub template_file: String,
  #[serde(default)]
  pub dependencies: Vec<String>,
  pub hash: ObjectHash,
}

/// `manifest.json`: stacks in deploy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyManifest {
  pub version: u32,
  pub stage: String,
  pub project: String,
  pub stacks: Vec<StackManifest>,
}

impl AssemblyManifest {
  pub fn new(config: &StackConfig) -> Self {
    Self {
      version: ASSEMBLY_VERSION,
      stage: config.stage.clone(),
      project: config.project.clone(),
      stacks: Vec::new(),
    }
  }

  pub fn stack(&self, name: &str) -> Option<&StackManifest> {
    self.stacks.iter().find(|s| s.name == name)
  }
}

/// File name a stack's template is written under.
pub fn template_file_name(stack: &str, format: TemplateFormat) -> String {
  format!("{}.template.{}", stack, format.extension())
}

/// Synthesized templates plus the manifest describing them.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
  pub manifest: AssemblyManifest,
  pub templates: BTreeMap<String, Template>,
}

impl CloudAssembly {
  pub fn new(config: &StackConfig) -> Self {
    Self {
      manifest: AssemblyManifest::new(config),
      templates: BTreeMap::new(),
    }
  }

  /// Append a stack. Stacks must be added in deploy order.
  pub fn add_stack(
    &mut self,
    name: &str,
    dependencies: Vec<String>,
    template: Template,
  ) -> Result<&StackManifest, AssemblyError> {
    if self.templates.contains_key(name) {
      return Err(AssemblyError::DuplicateStack(name.to_string()));
    }

    let hash = template.compute_hash().map_err(|source| AssemblyError::Hash {
      stack: name.to_string(),
      source,
    })?;

    self.manifest.stacks.push(StackManifest {
      name: name.to_string(),
      description: template.description.clone(),
      template_file: template_file_name(name, TemplateFormat::Json),
      dependencies,
      hash,
    });
    self.templates.insert(name.to_string(), template);

    let index = self.manifest.stacks.len() - 1;
    Ok(&self.manifest.stacks[index])
  }

  pub fn template(&self, name: &str) -> Option<&Template> {
    self.templates.get(name)
  }

  /// Stack names in deploy order.
  pub fn stack_names(&self) -> impl Iterator<Item = &str> {
    self.manifest.stacks.iter().map(|s| s.name.as_str())
  }

  pub fn config(&self) -> StackConfig {
    StackConfig::new(&self.manifest.stage, &self.manifest.project)
  }
}
