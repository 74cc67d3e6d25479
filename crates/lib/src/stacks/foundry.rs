//! The full Foundry VTT deployment: network, storage and the game server
//! behind a load balancer, in one stack.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::StackConfig;
use crate::consts::{DEFAULT_SECRET_ARN, FOUNDRY_IMAGE, FOUNDRY_PORT, SECRET_ARN_ENV};
use crate::constructs::cloudfront::{Distribution, DistributionProps};
use crate::constructs::ecs::{
  Cluster, ContainerDefinition, ContainerDefinitionOptions, ContainerImage, FargateTaskDefinition,
  FargateTaskDefinitionProps, LogDriver, MountPoint, PortMapping, Volume,
};
use crate::constructs::efs::FileSystem;
use crate::constructs::patterns::{
  ApplicationLoadBalancedFargateService, ApplicationLoadBalancedFargateServiceProps, HealthCheck, ServiceTask,
};
use crate::constructs::secrets::{ContainerSecret, Secret};
use crate::constructs::vpc::{Vpc, VpcProps};
use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry};
use crate::stack::Stack;

use super::add_resource_group;
use super::filesystem::declare_file_system;

/// Task volume backed by the data file system.
pub const DATA_VOLUME: &str = "efs";

/// Where the container expects its data directory.
pub const DATA_PATH: &str = "/data";

/// Endpoint Foundry answers with 200 once it is serving.
pub const HEALTH_CHECK_PATH: &str = "/api/status";

/// Container environment variable and the secret JSON field it is read from.
pub const FOUNDRY_SECRETS: [(&str, &str); 3] = [
  ("FOUNDRY_USERNAME", "foundry-username"),
  ("FOUNDRY_PASSWORD", "foundryvtt-password"),
  ("FOUNDRY_ADMIN_KEY", "foundryvtt-admin-key"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundryOptions {
  /// Complete ARN of the secret holding the Foundry credentials.
  pub secret_arn: String,
  /// Put a CloudFront distribution in front of the load balancer.
  pub cdn: bool,
}

impl Default for FoundryOptions {
  fn default() -> Self {
    Self {
      secret_arn: DEFAULT_SECRET_ARN.to_string(),
      cdn: false,
    }
  }
}

impl FoundryOptions {
  /// Defaults, with the secret ARN taken from `FOUNDRY_SECRET_ARN` when set.
  pub fn from_env() -> Self {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let secret_arn = lookup(SECRET_ARN_ENV)
      .filter(|value| !value.is_empty())
      .unwrap_or_else(|| DEFAULT_SECRET_ARN.to_string());
    Self {
      secret_arn,
      ..Self::default()
    }
  }
}

/// Health check tuned for Foundry's startup and status endpoint.
pub fn foundry_health_check() -> HealthCheck {
  HealthCheck {
    path: Some(HEALTH_CHECK_PATH.to_string()),
    port: Some(FOUNDRY_PORT.to_string()),
    healthy_http_codes: Some("200".to_string()),
    healthy_threshold_count: Some(2),
    unhealthy_threshold_count: Some(2),
    timeout_seconds: Some(5),
    interval_seconds: Some(10),
  }
}

#[derive(Debug, Clone)]
pub struct FoundryStack {
  pub stack: Stack,
  pub file_system: FileSystem,
  pub service: ApplicationLoadBalancedFargateService,
  pub distribution: Option<Distribution>,
}

impl FoundryStack {
  pub const UNIT: &'static str = "Foundry";

  pub fn new(
    config: &StackConfig,
    registry: &mut ExportRegistry,
    options: &FoundryOptions,
  ) -> Result<Self, SynthError> {
    let mut stack = Stack::new(config.stack_name(Self::UNIT), config)
      .with_description(format!("Foundry VTT {} deployment for {}", config.stage, config.project));

    add_resource_group(&mut stack, registry)?;

    let secret = Secret::from_secret_complete_arn(&options.secret_arn);

    let vpc = Vpc::new(
      &mut stack,
      "Vpc",
      VpcProps {
        max_azs: 2,
        ..VpcProps::default()
      },
    )?;
    let file_system = declare_file_system(&mut stack, &vpc)?;
    let cluster = Cluster::new(&mut stack, "DefaultEcsCluster", &vpc)?;

    let mut task_definition = FargateTaskDefinition::new(
      &mut stack,
      "TaskDefinition",
      FargateTaskDefinitionProps {
        cpu: 2048,
        memory_mib: 4096,
        volumes: vec![Volume {
          name: DATA_VOLUME.to_string(),
          efs_file_system_id: Some(file_system.file_system_id.clone()),
        }],
      },
    )?;

    let mut container_options =
      ContainerDefinitionOptions::new("foundryvtt", ContainerImage::from_registry(FOUNDRY_IMAGE));
    container_options.logging = Some(LogDriver::aws_logs("foundryvtt"));
    container_options.secrets = FOUNDRY_SECRETS
      .iter()
      .map(|(name, field)| (name.to_string(), ContainerSecret::from_secrets_manager(&secret, *field)))
      .collect::<BTreeMap<_, _>>();

    let container = ContainerDefinition::new(
      &mut stack,
      "ContainerDefinition",
      &mut task_definition,
      container_options,
    )?;
    container.add_mount_points(
      &mut stack,
      &[MountPoint {
        source_volume: DATA_VOLUME.to_string(),
        container_path: DATA_PATH.to_string(),
        read_only: false,
      }],
    )?;
    container.add_port_mappings(&mut stack, &[PortMapping::tcp(FOUNDRY_PORT)])?;

    let mut props = ApplicationLoadBalancedFargateServiceProps::new(&cluster, ServiceTask::Definition(task_definition));
    props.desired_count = 1;
    props.public_load_balancer = true;
    let service = ApplicationLoadBalancedFargateService::new(&mut stack, "ECSFargate", props)?;

    service
      .target_group
      .set_attribute(&mut stack, "deregistration_delay.timeout_seconds", "30")?;
    service
      .target_group
      .configure_health_check(&mut stack, &foundry_health_check())?;

    file_system.grant_root_access(&mut stack, &service.task_definition.task_role)?;
    file_system.allow_default_port_from(&mut stack, &service.service.security_group)?;

    let distribution = if options.cdn {
      let distribution = Distribution::new(
        &mut stack,
        "CloudFront",
        &service.load_balancer,
        DistributionProps {
          comment: format!(
            "The {} Cloud Front Distribution for the {} service.",
            config.stage, config.project
          ),
          origin_http_port: 80,
          ..DistributionProps::default()
        },
      )?;
      stack.export(
        registry,
        ExportKey::CloudFrontDomainName,
        "CloudFrontDomainName",
        &distribution.domain_name,
        "CloudFront Domain Name",
      )?;
      Some(distribution)
    } else {
      None
    };

    info!(stack = %stack.name(), cdn = options.cdn, "declared foundry stack");
    Ok(Self {
      stack,
      file_system,
      service,
      distribution,
    })
  }
}
