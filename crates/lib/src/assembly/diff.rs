//! Differences between two templates or two assemblies.
//!
//! Used to preview what a new synthesis changes relative to the assembly
//! already on disk. Resources and outputs are matched by logical id.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::template::{Resource, Template};

use super::types::CloudAssembly;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Added,
  Removed,
  Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
  pub logical_id: String,
  pub kind: ChangeKind,
  /// Type in the new template, or the old one for removals.
  pub resource_type: String,
  /// The resource type itself changed, forcing replacement.
  pub replaced: bool,
  /// Top-level property names whose values differ.
  pub changed_properties: Vec<String>,
  /// `DependsOn` or retention policies differ.
  pub attributes_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputChange {
  pub id: String,
  pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateDiff {
  pub resources: Vec<ResourceChange>,
  pub outputs: Vec<OutputChange>,
  pub description_changed: bool,
}

impl TemplateDiff {
  pub fn is_empty(&self) -> bool {
    self.resources.is_empty() && self.outputs.is_empty() && !self.description_changed
  }

  pub fn count(&self, kind: ChangeKind) -> usize {
    self.resources.iter().filter(|c| c.kind == kind).count()
  }
}

/// Compare `old` against `new`.
pub fn diff_templates(old: &Template, new: &Template) -> TemplateDiff {
  let mut diff = TemplateDiff {
    description_changed: old.description != new.description,
    ..TemplateDiff::default()
  };

  let ids: BTreeSet<&String> = old.resources.keys().chain(new.resources.keys()).collect();
  for id in ids {
    match (old.resources.get(id), new.resources.get(id)) {
      (None, Some(added)) => diff.resources.push(ResourceChange {
        logical_id: id.clone(),
        kind: ChangeKind::Added,
        resource_type: added.resource_type.clone(),
        replaced: false,
        changed_properties: Vec::new(),
        attributes_changed: false,
      }),
      (Some(removed), None) => diff.resources.push(ResourceChange {
        logical_id: id.clone(),
        kind: ChangeKind::Removed,
        resource_type: removed.resource_type.clone(),
        replaced: false,
        changed_properties: Vec::new(),
        attributes_changed: false,
      }),
      (Some(before), Some(after)) if before != after => diff.resources.push(modified(id, before, after)),
      _ => {}
    }
  }

  let ids: BTreeSet<&String> = old.outputs.keys().chain(new.outputs.keys()).collect();
  for id in ids {
    let kind = match (old.outputs.get(id), new.outputs.get(id)) {
      (None, Some(_)) => ChangeKind::Added,
      (Some(_), None) => ChangeKind::Removed,
      (Some(before), Some(after)) if before != after => ChangeKind::Modified,
      _ => continue,
    };
    diff.outputs.push(OutputChange { id: id.clone(), kind });
  }

  diff
}

fn modified(id: &str, before: &Resource, after: &Resource) -> ResourceChange {
  let keys: BTreeSet<&String> = before.properties.keys().chain(after.properties.keys()).collect();
  let changed_properties = keys
    .into_iter()
    .filter(|key| before.properties.get(*key) != after.properties.get(*key))
    .cloned()
    .collect();

  ResourceChange {
    logical_id: id.to_string(),
    kind: ChangeKind::Modified,
    resource_type: after.resource_type.clone(),
    replaced: before.resource_type != after.resource_type,
    changed_properties,
    attributes_changed: before.depends_on != after.depends_on
      || before.deletion_policy != after.deletion_policy
      || before.update_replace_policy != after.update_replace_policy,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackStatus {
  Added,
  Removed,
  Modified,
  Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackDiff {
  pub name: String,
  pub status: StackStatus,
  pub template: TemplateDiff,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyDiff {
  pub stacks: Vec<StackDiff>,
}

impl AssemblyDiff {
  pub fn is_empty(&self) -> bool {
    self.stacks.iter().all(|s| s.status == StackStatus::Unchanged)
  }

  pub fn changed(&self) -> impl Iterator<Item = &StackDiff> {
    self.stacks.iter().filter(|s| s.status != StackStatus::Unchanged)
  }
}

/// Compare each stack of `new` with its counterpart in `old`.
///
/// With no previous assembly every stack is reported as added. Stacks whose
/// manifest hashes match are not compared resource by resource.
pub fn diff_assemblies(old: Option<&CloudAssembly>, new: &CloudAssembly) -> AssemblyDiff {
  let empty = Template::default();
  let mut diff = AssemblyDiff::default();

  for entry in &new.manifest.stacks {
    let new_template = new.template(&entry.name).unwrap_or(&empty);
    let previous = old.and_then(|o| o.manifest.stack(&entry.name).map(|m| (m, o.template(&entry.name))));

    let stack_diff = match previous {
      None => StackDiff {
        name: entry.name.clone(),
        status: StackStatus::Added,
        template: diff_templates(&empty, new_template),
      },
      Some((old_entry, _)) if old_entry.hash == entry.hash => StackDiff {
        name: entry.name.clone(),
        status: StackStatus::Unchanged,
        template: TemplateDiff::default(),
      },
      Some((_, old_template)) => {
        let template = diff_templates(old_template.unwrap_or(&empty), new_template);
        let status = if template.is_empty() {
          StackStatus::Unchanged
        } else {
          StackStatus::Modified
        };
        StackDiff {
          name: entry.name.clone(),
          status,
          template,
        }
      }
    };
    diff.stacks.push(stack_diff);
  }

  if let Some(old) = old {
    for entry in &old.manifest.stacks {
      if new.manifest.stack(&entry.name).is_none() {
        diff.stacks.push(StackDiff {
          name: entry.name.clone(),
          status: StackStatus::Removed,
          template: diff_templates(old.template(&entry.name).unwrap_or(&empty), &empty),
        });
      }
    }
  }

  diff
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::config::StackConfig;
  use crate::template::{Output, RemovalPolicy};

  fn base() -> Template {
    let mut template = Template::new(Some("base".to_string()));
    template.resources.insert(
      "Queue".into(),
      Resource::new("AWS::SQS::Queue").with_properties(json!({ "DelaySeconds": 5, "FifoQueue": false })),
    );
    template.resources.insert("Topic".into(), Resource::new("AWS::SNS::Topic"));
    template.outputs.insert("QueueUrl".into(), Output::new(&"q".into()));
    template
  }

  #[test]
  fn identical_templates_have_no_diff() {
    assert!(diff_templates(&base(), &base()).is_empty());
  }

  #[test]
  fn added_removed_and_modified_resources() {
    let old = base();
    let mut new = base();
    new.resources.remove("Topic");
    new.resources.insert("Bucket".into(), Resource::new("AWS::S3::Bucket"));
    if let Some(queue) = new.resources.get_mut("Queue") {
      queue.set_property("DelaySeconds", json!(10));
    }

    let diff = diff_templates(&old, &new);
    assert_eq!(diff.count(ChangeKind::Added), 1);
    assert_eq!(diff.count(ChangeKind::Removed), 1);
    assert_eq!(diff.count(ChangeKind::Modified), 1);

    let queue = diff.resources.iter().find(|c| c.logical_id == "Queue").unwrap();
    assert_eq!(queue.changed_properties, vec!["DelaySeconds".to_string()]);
    assert!(!queue.replaced);
    assert!(!queue.attributes_changed);
  }

  #[test]
  fn type_and_policy_changes() {
    let old = base();
    let mut new = base();
    new.resources.insert(
      "Topic".into(),
      Resource::new("AWS::SNS::Topic").with_removal_policy(RemovalPolicy::Retain),
    );
    new.resources.insert(
      "Queue".into(),
      Resource::new("AWS::SQS::Other").with_properties(json!({ "DelaySeconds": 5, "FifoQueue": false })),
    );

    let diff = diff_templates(&old, &new);
    let topic = diff.resources.iter().find(|c| c.logical_id == "Topic").unwrap();
    assert!(topic.attributes_changed);
    let queue = diff.resources.iter().find(|c| c.logical_id == "Queue").unwrap();
    assert!(queue.replaced);
    assert!(queue.changed_properties.is_empty());
  }

  #[test]
  fn output_changes() {
    let old = base();
    let mut new = base();
    new.outputs.insert("QueueUrl".into(), Output::new(&"other".into()));
    new.outputs.insert("TopicArn".into(), Output::new(&"t".into()));

    let diff = diff_templates(&old, &new);
    assert_eq!(
      diff.outputs,
      vec![
        OutputChange {
          id: "QueueUrl".into(),
          kind: ChangeKind::Modified,
        },
        OutputChange {
          id: "TopicArn".into(),
          kind: ChangeKind::Added,
        },
      ]
    );
  }

  #[test]
  fn assembly_diff_statuses() {
    let config = StackConfig::default();

    let mut old = CloudAssembly::new(&config);
    old.add_stack("Same", vec![], base()).unwrap();
    old.add_stack("Changed", vec![], base()).unwrap();
    old.add_stack("Gone", vec![], base()).unwrap();

    let mut changed = base();
    changed.resources.remove("Topic");
    let mut new = CloudAssembly::new(&config);
    new.add_stack("Same", vec![], base()).unwrap();
    new.add_stack("Changed", vec![], changed).unwrap();
    new.add_stack("Fresh", vec![], base()).unwrap();

    let diff = diff_assemblies(Some(&old), &new);
    let status = |name: &str| diff.stacks.iter().find(|s| s.name == name).unwrap().status;
    assert_eq!(status("Same"), StackStatus::Unchanged);
    assert_eq!(status("Changed"), StackStatus::Modified);
    assert_eq!(status("Fresh"), StackStatus::Added);
    assert_eq!(status("Gone"), StackStatus::Removed);
    assert_eq!(diff.changed().count(), 3);
    assert!(!diff.is_empty());
  }

  #[test]
  fn without_previous_assembly_everything_is_added() {
    let mut new = CloudAssembly::new(&StackConfig::default());
    new.add_stack("Only", vec![], base()).unwrap();

    let diff = diff_assemblies(None, &new);
    assert_eq!(diff.stacks[0].status, StackStatus::Added);
    assert_eq!(diff.stacks[0].template.count(ChangeKind::Added), 2);
  }
}
