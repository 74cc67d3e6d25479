//! ECS cluster, Fargate task definitions and container definitions.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, RemovalPolicy, Resource, array_entry};

use super::iam::{PolicyStatement, Role};
use super::secrets::ContainerSecret;
use super::vpc::Vpc;

/// Service principal ECS tasks assume roles with.
pub const ECS_TASKS_SERVICE: &str = "ecs-tasks.amazonaws.com";

/// Check a cpu/memory pair against the Fargate size table.
pub fn validate_fargate_size(cpu: u32, memory_mib: u32) -> Result<(), SynthError> {
  let valid = match cpu {
    256 => matches!(memory_mib, 512 | 1024 | 2048),
    512 => (1024..=4096).contains(&memory_mib) && memory_mib % 1024 == 0,
    1024 => (2048..=8192).contains(&memory_mib) && memory_mib % 1024 == 0,
    2048 => (4096..=16384).contains(&memory_mib) && memory_mib % 1024 == 0,
    4096 => (8192..=30720).contains(&memory_mib) && memory_mib % 1024 == 0,
    8192 => (16384..=61440).contains(&memory_mib) && memory_mib % 4096 == 0,
    16384 => (32768..=122880).contains(&memory_mib) && memory_mib % 8192 == 0,
    _ => false,
  };
  if valid {
    Ok(())
  } else {
    Err(SynthError::InvalidTaskSize { cpu, memory_mib })
  }
}

#[derive(Debug, Clone)]
pub struct Cluster {
  pub logical_id: String,
  pub cluster_ref: Expr,
  pub vpc: Vpc,
}

impl Cluster {
  pub fn new(stack: &mut Stack, id: &str, vpc: &Vpc) -> Result<Self, SynthError> {
    let cluster_id = stack.add_resource(id, Resource::new("AWS::ECS::Cluster"))?;
    Ok(Self {
      cluster_ref: Expr::reference(&cluster_id),
      logical_id: cluster_id,
      vpc: vpc.clone(),
    })
  }
}

/// A task volume backed by an EFS file system.
#[derive(Debug, Clone)]
pub struct Volume {
  pub name: String,
  pub efs_file_system_id: Option<Expr>,
}

impl Volume {
  fn to_value(&self) -> Value {
    let mut volume = json!({ "Name": self.name });
    if let Some(fs) = &self.efs_file_system_id {
      volume["EFSVolumeConfiguration"] = json!({ "FilesystemId": fs });
    }
    volume
  }
}

#[derive(Debug, Clone)]
pub struct FargateTaskDefinitionProps {
  pub cpu: u32,
  pub memory_mib: u32,
  pub volumes: Vec<Volume>,
}

impl Default for FargateTaskDefinitionProps {
  fn default() -> Self {
    Self {
      cpu: 256,
      memory_mib: 512,
      volumes: Vec::new(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct FargateTaskDefinition {
  pub logical_id: String,
  pub task_definition_ref: Expr,
  pub task_role: Role,
  execution_role: Option<Role>,
  cpu: u32,
  memory_mib: u32,
}

impl FargateTaskDefinition {
  pub fn new(stack: &mut Stack, id: &str, props: FargateTaskDefinitionProps) -> Result<Self, SynthError> {
    validate_fargate_size(props.cpu, props.memory_mib)?;

    let task_role = Role::new(stack, &logical_id(&[id, "TaskRole"]), ECS_TASKS_SERVICE)?;

    let mut properties = json!({
      "ContainerDefinitions": [],
      "Cpu": props.cpu.to_string(),
      "Family": logical_id(&[stack.name(), id]),
      "Memory": props.memory_mib.to_string(),
      "NetworkMode": "awsvpc",
      "RequiresCompatibilities": ["FARGATE"],
      "TaskRoleArn": task_role.arn,
    });
    if !props.volumes.is_empty() {
      properties["Volumes"] = Value::Array(props.volumes.iter().map(Volume::to_value).collect());
    }

    let task_id = stack.add_resource(id, Resource::new("AWS::ECS::TaskDefinition").with_properties(properties))?;

    Ok(Self {
      task_definition_ref: Expr::reference(&task_id),
      logical_id: task_id,
      task_role,
      execution_role: None,
      cpu: props.cpu,
      memory_mib: props.memory_mib,
    })
  }

  pub fn cpu(&self) -> u32 {
    self.cpu
  }

  pub fn memory_mib(&self) -> u32 {
    self.memory_mib
  }

  /// The role ECS uses to pull images, ship logs and read secrets.
  ///
  /// Created on first use.
  pub fn obtain_execution_role(&mut self, stack: &mut Stack) -> Result<Role, SynthError> {
    if let Some(role) = &self.execution_role {
      return Ok(role.clone());
    }

    let role = Role::new(stack, &logical_id(&[&self.logical_id, "ExecutionRole"]), ECS_TASKS_SERVICE)?;
    stack
      .resource_mut(&self.logical_id)?
      .set_property("ExecutionRoleArn", role.arn.to_value());
    self.execution_role = Some(role.clone());
    Ok(role)
  }

  pub fn execution_role(&self) -> Option<&Role> {
    self.execution_role.as_ref()
  }

  /// Name and first mapped port of the first container, which load
  /// balancers route to.
  pub fn default_container(&self, stack: &Stack) -> Result<(String, u16), SynthError> {
    let no_port = || SynthError::NoContainerPort(self.logical_id.clone());
    let container = stack
      .resource(&self.logical_id)
      .and_then(|td| td.property("ContainerDefinitions"))
      .and_then(|defs| defs.get(0))
      .ok_or_else(no_port)?;

    let name = container.get("Name").and_then(Value::as_str).ok_or_else(no_port)?;
    let port = container
      .get("PortMappings")
      .and_then(|mappings| mappings.get(0))
      .and_then(|mapping| mapping.get("ContainerPort"))
      .and_then(Value::as_u64)
      .and_then(|port| u16::try_from(port).ok())
      .ok_or_else(no_port)?;

    Ok((name.to_string(), port))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerImage {
  Registry(String),
}

impl ContainerImage {
  pub fn from_registry(name: impl Into<String>) -> Self {
    Self::Registry(name.into())
  }

  pub fn image_name(&self) -> &str {
    match self {
      Self::Registry(name) => name,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDriver {
  /// CloudWatch Logs, into a log group created alongside the container.
  AwsLogs { stream_prefix: String },
}

impl LogDriver {
  pub fn aws_logs(stream_prefix: impl Into<String>) -> Self {
    Self::AwsLogs {
      stream_prefix: stream_prefix.into(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ContainerDefinitionOptions {
  pub container_name: String,
  pub image: ContainerImage,
  pub logging: Option<LogDriver>,
  pub secrets: BTreeMap<String, ContainerSecret>,
  pub environment: BTreeMap<String, String>,
}

impl ContainerDefinitionOptions {
  pub fn new(container_name: impl Into<String>, image: ContainerImage) -> Self {
    Self {
      container_name: container_name.into(),
      image,
      logging: None,
      secrets: BTreeMap::new(),
      environment: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
  pub source_volume: String,
  pub container_path: String,
  pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
  #[default]
  Tcp,
  Udp,
}

impl Protocol {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Tcp => "tcp",
      Self::Udp => "udp",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
  pub container_port: u16,
  pub protocol: Protocol,
}

impl PortMapping {
  pub fn tcp(container_port: u16) -> Self {
    Self {
      container_port,
      protocol: Protocol::Tcp,
    }
  }
}

/// Handle to a container inside a task definition's `ContainerDefinitions`.
#[derive(Debug, Clone)]
pub struct ContainerDefinition {
  pub name: String,
  task_definition_id: String,
}

impl ContainerDefinition {
  pub fn new(
    stack: &mut Stack,
    id: &str,
    task_definition: &mut FargateTaskDefinition,
    options: ContainerDefinitionOptions,
  ) -> Result<Self, SynthError> {
    let mut container = json!({
      "Essential": true,
      "Image": options.image.image_name(),
      "Name": options.container_name,
    });

    if let Some(LogDriver::AwsLogs { stream_prefix }) = &options.logging {
      let log_group_id = stack.add_resource(
        logical_id(&[&task_definition.logical_id, id, "LogGroup"]),
        Resource::new("AWS::Logs::LogGroup").with_removal_policy(RemovalPolicy::Retain),
      )?;
      container["LogConfiguration"] = json!({
        "LogDriver": "awslogs",
        "Options": {
          "awslogs-group": Expr::reference(&log_group_id),
          "awslogs-region": Expr::region(),
          "awslogs-stream-prefix": stream_prefix,
        },
      });

      let role = task_definition.obtain_execution_role(stack)?;
      role.add_to_policy(
        stack,
        PolicyStatement::allow()
          .with_actions(["logs:CreateLogStream", "logs:PutLogEvents"])
          .with_resource(Expr::get_att(&log_group_id, "Arn")),
      )?;
    }

    if !options.environment.is_empty() {
      container["Environment"] = options
        .environment
        .iter()
        .map(|(name, value)| json!({ "Name": name, "Value": value }))
        .collect();
    }

    if !options.secrets.is_empty() {
      container["Secrets"] = options
        .secrets
        .iter()
        .map(|(name, secret)| json!({ "Name": name, "ValueFrom": secret.value_from() }))
        .collect();

      let mut arns: Vec<&str> = options.secrets.values().map(|s| s.secret().arn()).collect();
      arns.sort_unstable();
      arns.dedup();

      let role = task_definition.obtain_execution_role(stack)?;
      let mut statement =
        PolicyStatement::allow().with_actions(["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"]);
      for arn in arns {
        statement = statement.with_resource(Expr::str(arn));
      }
      role.add_to_policy(stack, statement)?;
    }

    debug!(container = %options.container_name, task = %task_definition.logical_id, "declared container");
    stack
      .resource_mut(&task_definition.logical_id)?
      .array_property_mut("ContainerDefinitions")
      .push(container);

    Ok(Self {
      name: options.container_name,
      task_definition_id: task_definition.logical_id.clone(),
    })
  }

  pub fn add_mount_points(&self, stack: &mut Stack, mount_points: &[MountPoint]) -> Result<(), SynthError> {
    self.update(stack, |container| {
      let list = array_entry(container, "MountPoints");
      for mount in mount_points {
        list.push(json!({
          "ContainerPath": mount.container_path,
          "ReadOnly": mount.read_only,
          "SourceVolume": mount.source_volume,
        }));
      }
    })
  }

  pub fn add_port_mappings(&self, stack: &mut Stack, mappings: &[PortMapping]) -> Result<(), SynthError> {
    self.update(stack, |container| {
      let list = array_entry(container, "PortMappings");
      for mapping in mappings {
        list.push(json!({
          "ContainerPort": mapping.container_port,
          "Protocol": mapping.protocol.as_str(),
        }));
      }
    })
  }

  fn update<F>(&self, stack: &mut Stack, f: F) -> Result<(), SynthError>
  where
    F: FnOnce(&mut Map<String, Value>),
  {
    let stack_name = stack.name().to_string();
    let task_definition = stack.resource_mut(&self.task_definition_id)?;
    let container = task_definition
      .array_property_mut("ContainerDefinitions")
      .iter_mut()
      .filter_map(Value::as_object_mut)
      .find(|c| c.get("Name").and_then(Value::as_str) == Some(self.name.as_str()));

    match container {
      Some(container) => {
        f(container);
        Ok(())
      }
      None => Err(SynthError::ResourceNotFound {
        stack: stack_name,
        id: format!("{}/{}", self.task_definition_id, self.name),
      }),
    }
  }
}
