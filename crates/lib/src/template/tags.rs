//! Stack-wide tagging.
//!
//! Every taggable resource receives the deployment's `project` and `stage`
//! tags so the resource group (and billing) can find it.

use serde_json::{Value, json};

use super::Template;

/// Resource types CloudFormation does not accept tags on.
const UNTAGGABLE: &[&str] = &[
  "AWS::EC2::Route",
  "AWS::EC2::SecurityGroupEgress",
  "AWS::EC2::SecurityGroupIngress",
  "AWS::EC2::SubnetRouteTableAssociation",
  "AWS::EC2::VPCGatewayAttachment",
  "AWS::EFS::MountTarget",
  "AWS::ElasticLoadBalancingV2::Listener",
  "AWS::IAM::Policy",
];

/// Property holding the tag list for a resource type, if it is taggable.
pub fn tag_property(resource_type: &str) -> Option<&'static str> {
  if UNTAGGABLE.contains(&resource_type) {
    return None;
  }
  match resource_type {
    "AWS::EFS::FileSystem" => Some("FileSystemTags"),
    _ => Some("Tags"),
  }
}

/// Merge `tags` into every taggable resource.
///
/// Existing tags with other keys are kept; the result is sorted by key.
pub fn apply_tags(template: &mut Template, tags: &[(String, String)]) {
  for resource in template.resources.values_mut() {
    let Some(property) = tag_property(&resource.resource_type) else {
      continue;
    };

    let list = resource.array_property_mut(property);
    list.retain(|existing| {
      let key = existing.get("Key").and_then(Value::as_str);
      !tags.iter().any(|(k, _)| Some(k.as_str()) == key)
    });
    for (key, value) in tags {
      list.push(json!({ "Key": key, "Value": value }));
    }
    list.sort_by(|a, b| {
      let a = a.get("Key").and_then(Value::as_str).unwrap_or_default();
      let b = b.get("Key").and_then(Value::as_str).unwrap_or_default();
      a.cmp(b)
    });
  }
}
