//! A named, independently deployable unit of declared infrastructure.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::StackConfig;
use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry, Import};
use crate::template::tags::apply_tags;
use crate::template::{Expr, Output, Resource, Template};

/// Build a CloudFormation logical id from construct path segments.
///
/// Non-alphanumeric characters are dropped, so `["Vpc", "PublicSubnet1", "Subnet"]`
/// becomes `VpcPublicSubnet1Subnet`.
pub fn logical_id(parts: &[&str]) -> String {
  parts
    .iter()
    .flat_map(|part| part.chars())
    .filter(char::is_ascii_alphanumeric)
    .collect()
}

/// A stack under construction.
///
/// Constructs add resources and outputs through the stack; cross-stack
/// values go through an [`ExportRegistry`] so the stack records which other
/// stacks it depends on. An import only counts once its `Fn::ImportValue`
/// lands in the template.
#[derive(Debug, Clone)]
pub struct Stack {
  name: String,
  config: StackConfig,
  template: Template,
  exports: BTreeSet<ExportKey>,
  imports: BTreeMap<ExportKey, Import>,
}

impl Stack {
  pub fn new(name: impl Into<String>, config: &StackConfig) -> Self {
    Self {
      name: name.into(),
      config: config.clone(),
      template: Template::default(),
      exports: BTreeSet::new(),
      imports: BTreeMap::new(),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.template.description = Some(description.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn config(&self) -> &StackConfig {
    &self.config
  }

  pub fn description(&self) -> Option<&str> {
    self.template.description.as_deref()
  }

  /// Names of the stacks this one imports from.
  pub fn dependencies(&self) -> impl Iterator<Item = &str> {
    let producers: BTreeSet<&str> = self
      .used_imports()
      .map(|import| import.producer.as_str())
      .filter(|producer| *producer != self.name)
      .collect();
    producers.into_iter()
  }

  pub fn exported_keys(&self) -> impl Iterator<Item = ExportKey> + '_ {
    self.exports.iter().copied()
  }

  pub fn imported_keys(&self) -> impl Iterator<Item = ExportKey> + '_ {
    self.used_imports().map(|import| import.key)
  }

  fn used_imports(&self) -> impl Iterator<Item = &Import> + '_ {
    let referenced = self.template.import_names();
    self
      .imports
      .values()
      .filter(move |import| referenced.contains(&import.name))
  }

  /// Add a resource and return its logical id.
  pub fn add_resource(&mut self, id: impl Into<String>, resource: Resource) -> Result<String, SynthError> {
    let id = id.into();
    if self.template.resources.contains_key(&id) {
      return Err(SynthError::DuplicateLogicalId {
        stack: self.name.clone(),
        id,
      });
    }
    debug!(stack = %self.name, id = %id, resource_type = %resource.resource_type, "declared resource");
    self.template.resources.insert(id.clone(), resource);
    Ok(id)
  }

  pub fn has_resource(&self, id: &str) -> bool {
    self.template.resources.contains_key(id)
  }

  pub fn resource(&self, id: &str) -> Option<&Resource> {
    self.template.resources.get(id)
  }

  pub fn resource_mut(&mut self, id: &str) -> Result<&mut Resource, SynthError> {
    match self.template.resources.get_mut(id) {
      Some(resource) => Ok(resource),
      None => Err(SynthError::ResourceNotFound {
        stack: self.name.clone(),
        id: id.to_string(),
      }),
    }
  }

  pub fn add_output(&mut self, id: impl Into<String>, output: Output) -> Result<(), SynthError> {
    let id = id.into();
    if self.template.outputs.contains_key(&id) {
      return Err(SynthError::DuplicateOutput {
        stack: self.name.clone(),
        id,
      });
    }
    self.template.outputs.insert(id, output);
    Ok(())
  }

  /// Publish `value` under the scoped export name for `key`.
  pub fn export(
    &mut self,
    registry: &mut ExportRegistry,
    key: ExportKey,
    output_id: &str,
    value: &Expr,
    description: &str,
  ) -> Result<(), SynthError> {
    let name = registry.register(key, &self.name)?;
    debug!(stack = %self.name, export = %name, "registered export");
    self.add_output(
      output_id,
      Output::new(value).with_description(description).with_export_name(name),
    )?;
    self.exports.insert(key);
    Ok(())
  }

  /// Read a value another stack exported.
  ///
  /// The dependency on the producer is recorded once the returned expression
  /// is used in a resource or output.
  pub fn import(&mut self, registry: &ExportRegistry, key: ExportKey) -> Result<Expr, SynthError> {
    let import = registry.import(key, &self.name)?;
    let value = import.value.clone();
    self.imports.insert(key, import);
    Ok(value)
  }

  /// The raw template, without stack-wide tags.
  pub fn template(&self) -> &Template {
    &self.template
  }

  /// The final template with `project`/`stage` tags applied.
  pub fn synth(&self) -> Template {
    let mut template = self.template.clone();
    apply_tags(&mut template, &self.config.tags());
    template
  }
}
