//! Persistent EFS storage inside the shared VPC.

use tracing::info;

use crate::config::StackConfig;
use crate::constructs::efs::{
  FileSystem, FileSystemProps, LifecyclePolicy, PerformanceMode, ThroughputMode, mount_target_access_statement,
};
use crate::constructs::vpc::Vpc;
use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry};
use crate::stack::Stack;

use super::network::NETWORK_MAX_AZS;

/// Settings shared by every Foundry data file system.
pub fn foundry_file_system_props() -> FileSystemProps {
  FileSystemProps {
    encrypted: true,
    lifecycle_policy: Some(LifecyclePolicy::After14Days),
    performance_mode: PerformanceMode::GeneralPurpose,
    throughput_mode: ThroughputMode::Bursting,
  }
}

/// Declare the Foundry data file system, mountable only through a mount
/// target.
pub(crate) fn declare_file_system(stack: &mut Stack, vpc: &Vpc) -> Result<FileSystem, SynthError> {
  let mut file_system = FileSystem::new(stack, "MyEfsFileSystem", vpc, foundry_file_system_props())?;
  file_system.add_to_resource_policy(stack, mount_target_access_statement())?;
  Ok(file_system)
}

#[derive(Debug, Clone)]
pub struct FilesystemStack {
  pub stack: Stack,
  pub file_system: FileSystem,
}

impl FilesystemStack {
  pub const UNIT: &'static str = "Filesystem";

  pub fn new(config: &StackConfig, registry: &mut ExportRegistry) -> Result<Self, SynthError> {
    let mut stack = Stack::new(config.stack_name(Self::UNIT), config)
      .with_description(format!("{} file system for {}", config.stage, config.project));

    let vpc = Vpc::from_imports(&mut stack, registry, NETWORK_MAX_AZS)?;
    let file_system = declare_file_system(&mut stack, &vpc)?;

    stack.export(
      registry,
      ExportKey::EfsId,
      "FileSystemId",
      &file_system.file_system_id,
      "EFS FileSystem ID",
    )?;
    stack.export(
      registry,
      ExportKey::EfsSecurityGroup,
      "FileSystemSG",
      &file_system.security_group.group_id,
      "EFS FileSystem Security Group",
    )?;

    info!(stack = %stack.name(), "declared filesystem stack");
    Ok(Self { stack, file_system })
  }
}
