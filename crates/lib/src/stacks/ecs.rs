//! Minimal single-stack deployment running the ECS sample image.

use tracing::info;

use crate::config::StackConfig;
use crate::constructs::ecs::{Cluster, ContainerImage};
use crate::constructs::patterns::{
  ApplicationLoadBalancedFargateService, ApplicationLoadBalancedFargateServiceProps, ImageTaskOptions, ServiceTask,
};
use crate::constructs::vpc::{Vpc, VpcProps};
use crate::error::SynthError;
use crate::exports::ExportRegistry;
use crate::stack::Stack;

use super::add_resource_group;

pub const SAMPLE_IMAGE: &str = "amazon/amazon-ecs-sample";

#[derive(Debug, Clone)]
pub struct FoundryEcsStack {
  pub stack: Stack,
  pub service: ApplicationLoadBalancedFargateService,
}

impl FoundryEcsStack {
  pub const UNIT: &'static str = "";
  pub const DESCRIPTION: &'static str = "Foundry ECS Stack";

  pub fn new(config: &StackConfig, registry: &mut ExportRegistry) -> Result<Self, SynthError> {
    let mut stack = Stack::new(config.stack_name(Self::UNIT), config).with_description(Self::DESCRIPTION);

    add_resource_group(&mut stack, registry)?;

    let vpc = Vpc::new(
      &mut stack,
      "VPC",
      VpcProps {
        max_azs: 3,
        ..VpcProps::default()
      },
    )?;
    let cluster = Cluster::new(&mut stack, "Cluster", &vpc)?;

    let mut props = ApplicationLoadBalancedFargateServiceProps::new(
      &cluster,
      ServiceTask::Image(ImageTaskOptions::new(ContainerImage::from_registry(SAMPLE_IMAGE))),
    );
    props.cpu = 512;
    props.memory_mib = 2048;
    props.desired_count = 6;
    props.public_load_balancer = true;
    let service = ApplicationLoadBalancedFargateService::new(&mut stack, "Service", props)?;

    info!(stack = %stack.name(), "declared ecs stack");
    Ok(Self { stack, service })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn sample_service_shape() {
    let config = StackConfig::default();
    let mut registry = ExportRegistry::new(&config);
    let ecs = FoundryEcsStack::new(&config, &mut registry).unwrap();

    assert_eq!(ecs.stack.name(), "Dev-FoundryVttStack");
    assert_eq!(ecs.stack.description(), Some("Foundry ECS Stack"));

    let template = ecs.stack.synth();
    assert_eq!(template.resources_of_type("AWS::EC2::Subnet").count(), 3);
    assert_eq!(template.resources_of_type("AWS::ECS::Cluster").count(), 1);

    let (_, task) = template.resources_of_type("AWS::ECS::TaskDefinition").next().unwrap();
    assert_eq!(task.property("Cpu"), Some(&json!("512")));
    assert_eq!(task.property("Memory"), Some(&json!("2048")));
    assert_eq!(
      task.property("ContainerDefinitions").unwrap()[0]["Image"],
      "amazon/amazon-ecs-sample"
    );

    let (_, service) = template.resources_of_type("AWS::ECS::Service").next().unwrap();
    assert_eq!(service.property("DesiredCount"), Some(&json!(6)));

    let (_, lb) = template
      .resources_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer")
      .next()
      .unwrap();
    assert_eq!(lb.property("Scheme"), Some(&json!("internet-facing")));

    assert_eq!(
      template.outputs["ResourceGroupName"].export_name(),
      Some("Dev-FoundryVtt-resource-group")
    );
    assert_eq!(template.outputs["ResourceGroupName"].value, json!("Dev-FoundryVtt"));
  }
}
