//! CloudFormation template model.
//!
//! A [`Template`] is the serialized form of one stack. Maps are
//! [`BTreeMap`]s so the rendered JSON is byte-for-byte deterministic, which
//! keeps assembly hashes and diffs stable across runs.

mod expr;
pub mod tags;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consts::TEMPLATE_FORMAT_VERSION;
use crate::util::hash::Hashable;

pub use expr::Expr;

/// What CloudFormation does with a resource removed from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
  Delete,
  Retain,
  Snapshot,
}

/// One entry under `Resources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  #[serde(rename = "Type")]
  pub resource_type: String,

  #[serde(rename = "Properties", default, skip_serializing_if = "Map::is_empty")]
  pub properties: Map<String, Value>,

  #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,

  #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
  pub update_replace_policy: Option<RemovalPolicy>,

  #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
  pub deletion_policy: Option<RemovalPolicy>,
}

impl Resource {
  pub fn new(resource_type: impl Into<String>) -> Self {
    Self {
      resource_type: resource_type.into(),
      properties: Map::new(),
      depends_on: Vec::new(),
      update_replace_policy: None,
      deletion_policy: None,
    }
  }

  /// Replace all properties. Non-object values are ignored.
  pub fn with_properties(mut self, properties: Value) -> Self {
    if let Value::Object(map) = properties {
      self.properties = map;
    }
    self
  }

  pub fn depends_on<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for id in ids {
      let id = id.into();
      if !self.depends_on.contains(&id) {
        self.depends_on.push(id);
      }
    }
    self
  }

  pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
    self.update_replace_policy = Some(policy);
    self.deletion_policy = Some(policy);
    self
  }

  pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
    self.properties.insert(key.into(), value);
  }

  pub fn property(&self, key: &str) -> Option<&Value> {
    self.properties.get(key)
  }

  /// Mutable access to an array property, created empty if missing.
  pub fn array_property_mut(&mut self, key: &str) -> &mut Vec<Value> {
    array_entry(&mut self.properties, key)
  }
}

/// Mutable access to the array stored under `key`, replacing any non-array value.
pub(crate) fn array_entry<'a>(object: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
  let entry = object.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
  if !entry.is_array() {
    *entry = Value::Array(Vec::new());
  }
  match entry {
    Value::Array(items) => items,
    _ => unreachable!("entry was just set to an array"),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputExport {
  #[serde(rename = "Name")]
  pub name: String,
}

/// One entry under `Outputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
  #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  #[serde(rename = "Value")]
  pub value: Value,

  #[serde(rename = "Export", default, skip_serializing_if = "Option::is_none")]
  pub export: Option<OutputExport>,
}

impl Output {
  pub fn new(value: &Expr) -> Self {
    Self {
      description: None,
      value: value.to_value(),
      export: None,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_export_name(mut self, name: impl Into<String>) -> Self {
    self.export = Some(OutputExport { name: name.into() });
    self
  }

  pub fn export_name(&self) -> Option<&str> {
    self.export.as_ref().map(|e| e.name.as_str())
  }
}

/// A complete CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
  #[serde(rename = "AWSTemplateFormatVersion")]
  pub format_version: String,

  #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  #[serde(rename = "Resources", default)]
  pub resources: BTreeMap<String, Resource>,

  #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
  pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
  fn default() -> Self {
    Self {
      format_version: TEMPLATE_FORMAT_VERSION.to_string(),
      description: None,
      resources: BTreeMap::new(),
      outputs: BTreeMap::new(),
    }
  }
}

impl Template {
  pub fn new(description: Option<String>) -> Self {
    Self {
      description,
      ..Self::default()
    }
  }

  /// Logical ids of all resources of the given type.
  pub fn resources_of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = (&'a String, &'a Resource)> {
    self
      .resources
      .iter()
      .filter(move |(_, r)| r.resource_type == resource_type)
  }

  /// Export names declared by this template's outputs.
  pub fn export_names(&self) -> Vec<&str> {
    self.outputs.values().filter_map(Output::export_name).collect()
  }

  /// Every `Fn::ImportValue` name referenced anywhere in the resources or outputs.
  pub fn import_names(&self) -> Vec<String> {
    let mut names = Vec::new();
    for resource in self.resources.values() {
      for value in resource.properties.values() {
        collect_imports(value, &mut names);
      }
    }
    for output in self.outputs.values() {
      collect_imports(&output.value, &mut names);
    }
    names.sort();
    names.dedup();
    names
  }

  pub fn render(&self, format: TemplateFormat) -> Result<String, RenderError> {
    match format {
      TemplateFormat::Json => Ok(serde_json::to_string_pretty(self)?),
      TemplateFormat::Yaml => Ok(serde_yaml::to_string(self)?),
    }
  }

  pub fn parse(content: &str, format: TemplateFormat) -> Result<Self, RenderError> {
    match format {
      TemplateFormat::Json => Ok(serde_json::from_str(content)?),
      TemplateFormat::Yaml => Ok(serde_yaml::from_str(content)?),
    }
  }
}

impl Hashable for Template {}

fn collect_imports(value: &Value, names: &mut Vec<String>) {
  match value {
    Value::Object(map) => {
      if let Some(Value::String(name)) = map.get("Fn::ImportValue") {
        names.push(name.clone());
      }
      for nested in map.values() {
        collect_imports(nested, names);
      }
    }
    Value::Array(items) => {
      for item in items {
        collect_imports(item, names);
      }
    }
    _ => {}
  }
}

/// Serialization format for rendered templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
  #[default]
  Json,
  Yaml,
}

impl TemplateFormat {
  pub fn extension(self) -> &'static str {
    match self {
      Self::Json => "json",
      Self::Yaml => "yaml",
    }
  }

  /// Infer the format from a template file name.
  pub fn from_file_name(name: &str) -> Option<Self> {
    if name.ends_with(".json") {
      Some(Self::Json)
    } else if name.ends_with(".yaml") || name.ends_with(".yml") {
      Some(Self::Yaml)
    } else {
      None
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample() -> Template {
    let mut template = Template::new(Some("Sample".to_string()));
    template.resources.insert(
      "Bucket".to_string(),
      Resource::new("AWS::S3::Bucket")
        .with_properties(json!({ "BucketName": Expr::import_value("s-p-name") }))
        .with_removal_policy(RemovalPolicy::Retain),
    );
    template.outputs.insert(
      "BucketRef".to_string(),
      Output::new(&Expr::reference("Bucket"))
        .with_description("Bucket")
        .with_export_name("s-p-bucket"),
    );
    template
  }

  #[test]
  fn renders_cloudformation_shape() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(value["Description"], "Sample");
    assert_eq!(value["Resources"]["Bucket"]["Type"], "AWS::S3::Bucket");
    assert_eq!(value["Resources"]["Bucket"]["DeletionPolicy"], "Retain");
    assert_eq!(value["Resources"]["Bucket"]["UpdateReplacePolicy"], "Retain");
    assert!(value["Resources"]["Bucket"].get("DependsOn").is_none());
    assert_eq!(value["Outputs"]["BucketRef"]["Export"]["Name"], "s-p-bucket");
    assert_eq!(value["Outputs"]["BucketRef"]["Value"], json!({ "Ref": "Bucket" }));
  }

  #[test]
  fn json_and_yaml_parse_back() {
    let template = sample();
    for format in [TemplateFormat::Json, TemplateFormat::Yaml] {
      let rendered = template.render(format).unwrap();
      assert_eq!(Template::parse(&rendered, format).unwrap(), template);
    }
  }

  #[test]
  fn collects_exports_and_imports() {
    let template = sample();
    assert_eq!(template.export_names(), vec!["s-p-bucket"]);
    assert_eq!(template.import_names(), vec!["s-p-name".to_string()]);
  }

  #[test]
  fn depends_on_is_deduplicated() {
    let resource = Resource::new("AWS::EC2::Route").depends_on(["A", "B"]).depends_on(["A"]);
    assert_eq!(resource.depends_on, vec!["A", "B"]);
  }

  #[test]
  fn format_from_file_name() {
    assert_eq!(TemplateFormat::from_file_name("x.template.json"), Some(TemplateFormat::Json));
    assert_eq!(TemplateFormat::from_file_name("x.template.yml"), Some(TemplateFormat::Yaml));
    assert_eq!(TemplateFormat::from_file_name("x.txt"), None);
  }
}
