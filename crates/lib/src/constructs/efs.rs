//! Elastic file system shared by the service's tasks.

use serde_json::json;

use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, RemovalPolicy, Resource};

use super::ec2::SecurityGroup;
use super::iam::{PolicyDocument, PolicyStatement, Principal, Role};
use super::vpc::Vpc;

/// NFS port the mount targets listen on.
pub const EFS_PORT: u16 = 2049;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePolicy {
  After1Day,
  After7Days,
  After14Days,
  After30Days,
  After60Days,
  After90Days,
}

impl LifecyclePolicy {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::After1Day => "AFTER_1_DAY",
      Self::After7Days => "AFTER_7_DAYS",
      Self::After14Days => "AFTER_14_DAYS",
      Self::After30Days => "AFTER_30_DAYS",
      Self::After60Days => "AFTER_60_DAYS",
      Self::After90Days => "AFTER_90_DAYS",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceMode {
  #[default]
  GeneralPurpose,
  MaxIo,
}

impl PerformanceMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::GeneralPurpose => "generalPurpose",
      Self::MaxIo => "maxIO",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThroughputMode {
  #[default]
  Bursting,
  Elastic,
}

impl ThroughputMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Bursting => "bursting",
      Self::Elastic => "elastic",
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct FileSystemProps {
  pub encrypted: bool,
  pub lifecycle_policy: Option<LifecyclePolicy>,
  pub performance_mode: PerformanceMode,
  pub throughput_mode: ThroughputMode,
}

/// The statement every Foundry file system carries: any principal may
/// mount, but only through a mount target inside the VPC.
pub fn mount_target_access_statement() -> PolicyStatement {
  PolicyStatement::allow()
    .with_actions(["elasticfilesystem:ClientMount"])
    .with_principal(Principal::Any)
    .with_condition("Bool", "elasticfilesystem:AccessedViaMountTarget", "true")
}

/// An encrypted EFS file system with one mount target per VPC subnet.
#[derive(Debug, Clone)]
pub struct FileSystem {
  pub logical_id: String,
  pub file_system_id: Expr,
  pub arn: Expr,
  pub security_group: SecurityGroup,
  resource_policy: PolicyDocument,
}

impl FileSystem {
  pub fn new(stack: &mut Stack, id: &str, vpc: &Vpc, props: FileSystemProps) -> Result<Self, SynthError> {
    let mut properties = json!({
      "Encrypted": props.encrypted,
      "PerformanceMode": props.performance_mode.as_str(),
      "ThroughputMode": props.throughput_mode.as_str(),
    });
    if let Some(policy) = props.lifecycle_policy {
      properties["LifecyclePolicies"] = json!([{ "TransitionToIA": policy.as_str() }]);
    }

    let fs_id = stack.add_resource(
      id,
      Resource::new("AWS::EFS::FileSystem")
        .with_properties(properties)
        .with_removal_policy(RemovalPolicy::Retain),
    )?;

    let description = format!("{}/{}/EfsSecurityGroup", stack.name(), id);
    let security_group = SecurityGroup::new(stack, &logical_id(&[id, "EfsSecurityGroup"]), vpc, &description, true)?;

    for (index, subnet) in vpc.public_subnet_ids.iter().enumerate() {
      stack.add_resource(
        logical_id(&[id, &format!("EfsMountTarget{}", index + 1)]),
        Resource::new("AWS::EFS::MountTarget").with_properties(json!({
          "FileSystemId": Expr::reference(&fs_id),
          "SecurityGroups": [security_group.group_id],
          "SubnetId": subnet,
        })),
      )?;
    }

    Ok(Self {
      file_system_id: Expr::reference(&fs_id),
      arn: Expr::get_att(&fs_id, "Arn"),
      logical_id: fs_id,
      security_group,
      resource_policy: PolicyDocument::default(),
    })
  }

  pub fn resource_policy(&self) -> &PolicyDocument {
    &self.resource_policy
  }

  /// Append a statement to the file system's resource policy.
  pub fn add_to_resource_policy(&mut self, stack: &mut Stack, statement: PolicyStatement) -> Result<(), SynthError> {
    self.resource_policy.add_statement(statement);
    let resource = stack.resource_mut(&self.logical_id)?;
    resource.set_property("FileSystemPolicy", self.resource_policy.to_value());
    Ok(())
  }

  /// Let `role` write to the file system as root.
  pub fn grant_root_access(&self, stack: &mut Stack, role: &Role) -> Result<(), SynthError> {
    role.add_to_policy(
      stack,
      PolicyStatement::allow()
        .with_actions(["elasticfilesystem:ClientRootAccess", "elasticfilesystem:ClientWrite"])
        .with_resource(self.arn.clone()),
    )
  }

  /// Open the NFS port to traffic from `peer`.
  pub fn allow_default_port_from(&self, stack: &mut Stack, peer: &SecurityGroup) -> Result<(), SynthError> {
    self.security_group.allow_from(stack, peer, EFS_PORT)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StackConfig;
  use crate::constructs::vpc::VpcProps;

  fn foundry_props() -> FileSystemProps {
    FileSystemProps {
      encrypted: true,
      lifecycle_policy: Some(LifecyclePolicy::After14Days),
      performance_mode: PerformanceMode::GeneralPurpose,
      throughput_mode: ThroughputMode::Bursting,
    }
  }

  #[test]
  fn declares_encrypted_retained_file_system() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let vpc = Vpc::new(&mut stack, "Vpc", VpcProps { max_azs: 2, ..VpcProps::default() }).unwrap();
    let fs = FileSystem::new(&mut stack, "Efs", &vpc, foundry_props()).unwrap();

    let resource = stack.resource(&fs.logical_id).unwrap();
    assert_eq!(resource.property("Encrypted"), Some(&json!(true)));
    assert_eq!(
      resource.property("LifecyclePolicies"),
      Some(&json!([{ "TransitionToIA": "AFTER_14_DAYS" }]))
    );
    assert_eq!(resource.property("PerformanceMode"), Some(&json!("generalPurpose")));
    assert_eq!(resource.property("ThroughputMode"), Some(&json!("bursting")));
    assert_eq!(resource.deletion_policy, Some(RemovalPolicy::Retain));

    assert_eq!(stack.template().resources_of_type("AWS::EFS::MountTarget").count(), 2);
  }

  #[test]
  fn resource_policy_requires_mount_target() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let vpc = Vpc::new(&mut stack, "Vpc", VpcProps::default()).unwrap();
    let mut fs = FileSystem::new(&mut stack, "Efs", &vpc, foundry_props()).unwrap();
    fs.add_to_resource_policy(&mut stack, mount_target_access_statement())
      .unwrap();

    let policy = stack.resource("Efs").unwrap().property("FileSystemPolicy").unwrap();
    assert_eq!(
      policy,
      &json!({
        "Statement": [{
          "Action": "elasticfilesystem:ClientMount",
          "Condition": { "Bool": { "elasticfilesystem:AccessedViaMountTarget": "true" } },
          "Effect": "Allow",
          "Principal": { "AWS": "*" }
        }],
        "Version": "2012-10-17"
      })
    );
  }

  #[test]
  fn root_access_grant_targets_file_system_arn() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let vpc = Vpc::new(&mut stack, "Vpc", VpcProps::default()).unwrap();
    let fs = FileSystem::new(&mut stack, "Efs", &vpc, foundry_props()).unwrap();
    let role = Role::new(&mut stack, "TaskRole", "ecs-tasks.amazonaws.com").unwrap();

    fs.grant_root_access(&mut stack, &role).unwrap();

    let policy = stack.resource(role.policy_id()).unwrap().property("PolicyDocument").unwrap();
    assert_eq!(
      policy["Statement"][0]["Action"],
      json!(["elasticfilesystem:ClientRootAccess", "elasticfilesystem:ClientWrite"])
    );
    assert_eq!(policy["Statement"][0]["Resource"], json!({ "Fn::GetAtt": ["Efs", "Arn"] }));
  }
}
