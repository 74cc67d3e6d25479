//! The deployable stacks.
//!
//! Each stack takes the resolved [`StackConfig`](crate::config::StackConfig)
//! and the app's [`ExportRegistry`]. Stacks that publish values for others
//! must be built before the stacks importing them; [`crate::app::App`] takes
//! care of that order.

pub mod ecs;
pub mod filesystem;
pub mod foundry;
pub mod network;

pub use ecs::FoundryEcsStack;
pub use filesystem::FilesystemStack;
pub use foundry::{FoundryOptions, FoundryStack};
pub use network::NetworkStack;

use crate::constructs::resource_group::ResourceGroup;
use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry};
use crate::stack::Stack;
use crate::template::Expr;

/// Declare the `{stage}-{project}` resource group and export its name.
pub(crate) fn add_resource_group(
  stack: &mut Stack,
  registry: &mut ExportRegistry,
) -> Result<ResourceGroup, SynthError> {
  let config = stack.config().clone();
  let group = ResourceGroup::new(stack, "ResourceGroup", &config.resource_group_name(), &config.tags())?;
  stack.export(
    registry,
    ExportKey::ResourceGroup,
    "ResourceGroupName",
    &Expr::str(&group.name),
    "Resource Group Name",
  )?;
  Ok(group)
}
