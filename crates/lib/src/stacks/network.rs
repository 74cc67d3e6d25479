//! Shared VPC published for the other stacks.

use tracing::info;

use crate::config::StackConfig;
use crate::constructs::vpc::{Vpc, VpcProps};
use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry};
use crate::stack::Stack;

/// Availability zones spanned by the shared VPC.
pub const NETWORK_MAX_AZS: usize = 2;

#[derive(Debug, Clone)]
pub struct NetworkStack {
  pub stack: Stack,
  pub vpc: Vpc,
}

impl NetworkStack {
  pub const UNIT: &'static str = "Network";

  pub fn new(config: &StackConfig, registry: &mut ExportRegistry) -> Result<Self, SynthError> {
    let mut stack = Stack::new(config.stack_name(Self::UNIT), config)
      .with_description(format!("{} network for {}", config.stage, config.project));

    let vpc = Vpc::new(
      &mut stack,
      "VPC",
      VpcProps {
        max_azs: NETWORK_MAX_AZS,
        ..VpcProps::default()
      },
    )?;

    stack.export(registry, ExportKey::VpcId, "VPCID", &vpc.vpc_id, "VPC ID")?;
    stack.export(
      registry,
      ExportKey::VpcAzs,
      "VPCAvailabilityZones",
      &vpc.availability_zones_joined(),
      "VPC Availability Zones",
    )?;
    stack.export(
      registry,
      ExportKey::VpcPublicSubnets,
      "VPCPublicSubnets",
      &vpc.public_subnet_ids_joined(),
      "VPC Public Subnets",
    )?;

    info!(stack = %stack.name(), zones = NETWORK_MAX_AZS, "declared network stack");
    Ok(Self { stack, vpc })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn exports_vpc_descriptors() {
    let config = StackConfig::new("Dev", "FoundryVtt");
    let mut registry = ExportRegistry::new(&config);
    let network = NetworkStack::new(&config, &mut registry).unwrap();

    assert_eq!(network.stack.name(), "Dev-FoundryVttNetworkStack");
    let template = network.stack.synth();
    assert_eq!(template.resources_of_type("AWS::EC2::Subnet").count(), 2);

    let mut exports = template.export_names();
    exports.sort_unstable();
    assert_eq!(
      exports,
      vec![
        "Dev-FoundryVtt-vpc-azs",
        "Dev-FoundryVtt-vpc-id",
        "Dev-FoundryVtt-vpc-public-subnets",
      ]
    );
    assert_eq!(template.outputs["VPCID"].value, json!({ "Ref": "VPC" }));
    assert_eq!(
      template.outputs["VPCPublicSubnets"].value,
      json!({ "Fn::Join": [",", [{ "Ref": "VPCPublicSubnet1Subnet" }, { "Ref": "VPCPublicSubnet2Subnet" }]] })
    );
  }
}
