//! Tag-based resource groups.

use serde_json::json;

use crate::error::SynthError;
use crate::stack::Stack;
use crate::template::Resource;

/// An `AWS::ResourceGroups::Group` collecting every supported resource
/// carrying all of the given tags.
#[derive(Debug, Clone)]
pub struct ResourceGroup {
  pub logical_id: String,
  pub name: String,
}

impl ResourceGroup {
  pub fn new(stack: &mut Stack, id: &str, name: &str, tags: &[(String, String)]) -> Result<Self, SynthError> {
    let tag_filters: Vec<_> = tags
      .iter()
      .map(|(key, value)| json!({ "Key": key, "Values": [value] }))
      .collect();

    let group_id = stack.add_resource(
      id,
      Resource::new("AWS::ResourceGroups::Group").with_properties(json!({
        "Name": name,
        "ResourceQuery": {
          "Query": {
            "ResourceTypeFilters": ["AWS::AllSupported"],
            "TagFilters": tag_filters,
          },
          "Type": "TAG_FILTERS_1_0",
        },
      })),
    )?;

    Ok(Self {
      logical_id: group_id,
      name: name.to_string(),
    })
  }
}
