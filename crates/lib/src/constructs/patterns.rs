//! Composite constructs wiring several building blocks together.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::debug;

use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, Output, Resource};

use super::ec2::SecurityGroup;
use super::ecs::{
  Cluster, ContainerDefinition, ContainerDefinitionOptions, ContainerImage, FargateTaskDefinition,
  FargateTaskDefinitionProps, LogDriver, PortMapping,
};
use super::secrets::ContainerSecret;

/// Target group health check settings. Unset fields keep the load
/// balancer defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheck {
  pub path: Option<String>,
  pub port: Option<String>,
  pub healthy_http_codes: Option<String>,
  pub healthy_threshold_count: Option<u32>,
  pub unhealthy_threshold_count: Option<u32>,
  pub timeout_seconds: Option<u32>,
  pub interval_seconds: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct LoadBalancer {
  pub logical_id: String,
  pub dns_name: Expr,
  pub security_group: SecurityGroup,
}

#[derive(Debug, Clone)]
pub struct TargetGroup {
  pub logical_id: String,
  pub arn: Expr,
}

impl TargetGroup {
  /// Set a target group attribute, replacing an earlier value for `key`.
  pub fn set_attribute(&self, stack: &mut Stack, key: &str, value: &str) -> Result<(), SynthError> {
    let attributes = stack
      .resource_mut(&self.logical_id)?
      .array_property_mut("TargetGroupAttributes");
    attributes.retain(|attr| attr.get("Key").and_then(Value::as_str) != Some(key));
    attributes.push(json!({ "Key": key, "Value": value }));
    Ok(())
  }

  pub fn configure_health_check(&self, stack: &mut Stack, health_check: &HealthCheck) -> Result<(), SynthError> {
    let resource = stack.resource_mut(&self.logical_id)?;
    resource.set_property("HealthCheckEnabled", json!(true));
    if let Some(path) = &health_check.path {
      resource.set_property("HealthCheckPath", json!(path));
    }
    if let Some(port) = &health_check.port {
      resource.set_property("HealthCheckPort", json!(port));
    }
    if let Some(codes) = &health_check.healthy_http_codes {
      resource.set_property("Matcher", json!({ "HttpCode": codes }));
    }
    if let Some(count) = health_check.healthy_threshold_count {
      resource.set_property("HealthyThresholdCount", json!(count));
    }
    if let Some(count) = health_check.unhealthy_threshold_count {
      resource.set_property("UnhealthyThresholdCount", json!(count));
    }
    if let Some(seconds) = health_check.timeout_seconds {
      resource.set_property("HealthCheckTimeoutSeconds", json!(seconds));
    }
    if let Some(seconds) = health_check.interval_seconds {
      resource.set_property("HealthCheckIntervalSeconds", json!(seconds));
    }
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct FargateService {
  pub logical_id: String,
  pub service_name: Expr,
  pub security_group: SecurityGroup,
}

/// Options for a service whose task definition is generated from an image.
#[derive(Debug, Clone)]
pub struct ImageTaskOptions {
  pub image: ContainerImage,
  pub container_name: String,
  pub container_port: u16,
  pub enable_logging: bool,
  pub environment: BTreeMap<String, String>,
  pub secrets: BTreeMap<String, ContainerSecret>,
}

impl ImageTaskOptions {
  pub fn new(image: ContainerImage) -> Self {
    Self {
      image,
      container_name: "web".to_string(),
      container_port: 80,
      enable_logging: true,
      environment: BTreeMap::new(),
      secrets: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Clone)]
pub enum ServiceTask {
  /// Generate a single-container task definition.
  Image(ImageTaskOptions),
  /// Use a task definition declared by the caller.
  Definition(FargateTaskDefinition),
}

#[derive(Debug, Clone)]
pub struct ApplicationLoadBalancedFargateServiceProps {
  pub cluster: Cluster,
  pub task: ServiceTask,
  /// Task size for [`ServiceTask::Image`]; ignored otherwise.
  pub cpu: u32,
  pub memory_mib: u32,
  pub desired_count: u32,
  pub public_load_balancer: bool,
  pub listener_port: u16,
  pub assign_public_ip: bool,
  pub health_check_grace_period_seconds: u32,
}

impl ApplicationLoadBalancedFargateServiceProps {
  pub fn new(cluster: &Cluster, task: ServiceTask) -> Self {
    Self {
      cluster: cluster.clone(),
      task,
      cpu: 256,
      memory_mib: 512,
      desired_count: 1,
      public_load_balancer: true,
      listener_port: 80,
      assign_public_ip: true,
      health_check_grace_period_seconds: 60,
    }
  }
}

/// A Fargate service behind an application load balancer.
///
/// Traffic flows listener -> target group -> container port. The load
/// balancer's group may only send to the service's group on that port.
#[derive(Debug, Clone)]
pub struct ApplicationLoadBalancedFargateService {
  pub load_balancer: LoadBalancer,
  pub listener_id: String,
  pub target_group: TargetGroup,
  pub service: FargateService,
  pub task_definition: FargateTaskDefinition,
}

impl ApplicationLoadBalancedFargateService {
  pub fn new(
    stack: &mut Stack,
    id: &str,
    props: ApplicationLoadBalancedFargateServiceProps,
  ) -> Result<Self, SynthError> {
    let vpc = props.cluster.vpc.clone();

    let task_definition = match props.task {
      ServiceTask::Definition(task_definition) => task_definition,
      ServiceTask::Image(options) => image_task_definition(stack, id, props.cpu, props.memory_mib, options)?,
    };
    let (container_name, container_port) = task_definition.default_container(stack)?;

    // Load balancer
    let lb_sg_description = format!("Automatically created Security Group for ELB {}{}LB", stack.name(), id);
    let lb_security_group = SecurityGroup::new(
      stack,
      &logical_id(&[id, "LBSecurityGroup"]),
      &vpc,
      &lb_sg_description,
      false,
    )?;
    lb_security_group.allow_from_any_ipv4(
      stack,
      props.listener_port,
      &format!("Allow from anyone on port {}", props.listener_port),
    )?;

    let scheme = if props.public_load_balancer {
      "internet-facing"
    } else {
      "internal"
    };
    let lb_id = stack.add_resource(
      logical_id(&[id, "LB"]),
      Resource::new("AWS::ElasticLoadBalancingV2::LoadBalancer")
        .with_properties(json!({
          "LoadBalancerAttributes": [{ "Key": "deletion_protection.enabled", "Value": "false" }],
          "Scheme": scheme,
          "SecurityGroups": [lb_security_group.group_id],
          "Subnets": vpc.public_subnet_ids,
          "Type": "application",
        }))
        .depends_on(vpc.internet_dependencies().iter().cloned()),
    )?;

    let target_group_id = stack.add_resource(
      logical_id(&[id, "LBPublicListener", "ECSGroup"]),
      Resource::new("AWS::ElasticLoadBalancingV2::TargetGroup").with_properties(json!({
        "Port": 80,
        "Protocol": "HTTP",
        "TargetGroupAttributes": [{ "Key": "stickiness.enabled", "Value": "false" }],
        "TargetType": "ip",
        "VpcId": vpc.vpc_id,
      })),
    )?;
    let target_group = TargetGroup {
      arn: Expr::reference(&target_group_id),
      logical_id: target_group_id,
    };

    let listener_id = stack.add_resource(
      logical_id(&[id, "LBPublicListener"]),
      Resource::new("AWS::ElasticLoadBalancingV2::Listener").with_properties(json!({
        "DefaultActions": [{ "TargetGroupArn": target_group.arn, "Type": "forward" }],
        "LoadBalancerArn": Expr::reference(&lb_id),
        "Port": props.listener_port,
        "Protocol": "HTTP",
      })),
    )?;

    // Service
    let service_sg_description = format!("{}/{}/Service/SecurityGroup", stack.name(), id);
    let service_security_group = SecurityGroup::new(
      stack,
      &logical_id(&[id, "ServiceSecurityGroup"]),
      &vpc,
      &service_sg_description,
      true,
    )?;
    service_security_group.allow_from(stack, &lb_security_group, container_port)?;

    let assign_public_ip = if props.assign_public_ip { "ENABLED" } else { "DISABLED" };
    let service_id = stack.add_resource(
      logical_id(&[id, "Service"]),
      Resource::new("AWS::ECS::Service")
        .with_properties(json!({
          "Cluster": props.cluster.cluster_ref,
          "DeploymentConfiguration": { "MaximumPercent": 200, "MinimumHealthyPercent": 50 },
          "DesiredCount": props.desired_count,
          "EnableECSManagedTags": false,
          "HealthCheckGracePeriodSeconds": props.health_check_grace_period_seconds,
          "LaunchType": "FARGATE",
          "LoadBalancers": [{
            "ContainerName": container_name,
            "ContainerPort": container_port,
            "TargetGroupArn": target_group.arn,
          }],
          "NetworkConfiguration": {
            "AwsvpcConfiguration": {
              "AssignPublicIp": assign_public_ip,
              "SecurityGroups": [service_security_group.group_id],
              "Subnets": vpc.public_subnet_ids,
            },
          },
          "TaskDefinition": task_definition.task_definition_ref,
        }))
        .depends_on([listener_id.clone(), target_group.logical_id.clone()]),
    )?;

    let dns_name = Expr::get_att(&lb_id, "DNSName");
    stack.add_output(logical_id(&[id, "LoadBalancerDNS"]), Output::new(&dns_name))?;
    stack.add_output(
      logical_id(&[id, "ServiceURL"]),
      Output::new(&Expr::join("", vec![Expr::str("http://"), dns_name.clone()])),
    )?;

    debug!(
      stack = %stack.name(),
      service = %service_id,
      container = %container_name,
      port = container_port,
      "declared load balanced service"
    );

    Ok(Self {
      load_balancer: LoadBalancer {
        logical_id: lb_id,
        dns_name,
        security_group: lb_security_group,
      },
      listener_id,
      target_group,
      service: FargateService {
        service_name: Expr::get_att(&service_id, "Name"),
        logical_id: service_id,
        security_group: service_security_group,
      },
      task_definition,
    })
  }
}

fn image_task_definition(
  stack: &mut Stack,
  id: &str,
  cpu: u32,
  memory_mib: u32,
  options: ImageTaskOptions,
) -> Result<FargateTaskDefinition, SynthError> {
  let mut task_definition = FargateTaskDefinition::new(
    stack,
    &logical_id(&[id, "TaskDef"]),
    FargateTaskDefinitionProps {
      cpu,
      memory_mib,
      volumes: Vec::new(),
    },
  )?;

  let mut container_options = ContainerDefinitionOptions::new(&options.container_name, options.image);
  if options.enable_logging {
    container_options.logging = Some(LogDriver::aws_logs(id));
  }
  container_options.environment = options.environment;
  container_options.secrets = options.secrets;

  let container = ContainerDefinition::new(stack, &options.container_name, &mut task_definition, container_options)?;
  container.add_port_mappings(stack, &[PortMapping::tcp(options.container_port)])?;
  Ok(task_definition)
}
