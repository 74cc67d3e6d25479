//! Virtual network with public subnets only.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde_json::json;

use crate::error::SynthError;
use crate::exports::{ExportKey, ExportRegistry};
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, Resource};

/// An IPv4 network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
  network: Ipv4Addr,
  prefix: u8,
}

impl Ipv4Cidr {
  pub fn prefix(&self) -> u8 {
    self.prefix
  }

  /// Split into `count` equally sized subnets, smallest prefix that fits.
  pub fn split(&self, count: usize) -> Result<Vec<Ipv4Cidr>, SynthError> {
    let err = || SynthError::SubnetSplit {
      cidr: self.to_string(),
      count,
    };
    if count == 0 {
      return Err(err());
    }

    let bits = usize::BITS - (count - 1).leading_zeros();
    let prefix = u32::from(self.prefix) + bits;
    if prefix > 32 {
      return Err(err());
    }

    let base = u64::from(u32::from(self.network));
    let size = 1u64 << (32 - prefix);
    (0..count as u64)
      .map(|i| {
        let network = u32::try_from(base + i * size).map_err(|_| err())?;
        Ok(Ipv4Cidr {
          network: Ipv4Addr::from(network),
          prefix: prefix as u8,
        })
      })
      .collect()
  }
}

impl FromStr for Ipv4Cidr {
  type Err = SynthError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || SynthError::InvalidCidr(s.to_string());
    let (addr, prefix) = s.split_once('/').ok_or_else(invalid)?;
    let network: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    if prefix > 32 {
      return Err(invalid());
    }

    let host_mask = if prefix == 0 { u32::MAX } else { (1u32 << (32 - prefix)).wrapping_sub(1) };
    if u32::from(network) & host_mask != 0 {
      return Err(invalid());
    }
    Ok(Self { network, prefix })
  }
}

impl fmt::Display for Ipv4Cidr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.network, self.prefix)
  }
}

#[derive(Debug, Clone)]
pub struct VpcProps {
  pub cidr: String,
  /// Number of availability zones to spread public subnets over.
  pub max_azs: usize,
}

impl Default for VpcProps {
  fn default() -> Self {
    Self {
      cidr: "10.0.0.0/16".to_string(),
      max_azs: 3,
    }
  }
}

/// Identifiers of an existing VPC, typically read from imports.
#[derive(Debug, Clone)]
pub struct VpcAttributes {
  pub vpc_id: Expr,
  /// List-valued expression of availability zones.
  pub availability_zones: Expr,
  /// List-valued expression of public subnet ids, one per zone.
  pub public_subnet_ids: Expr,
  pub zone_count: usize,
}

/// A declared or imported VPC.
#[derive(Debug, Clone)]
pub struct Vpc {
  pub vpc_id: Expr,
  pub availability_zones: Vec<Expr>,
  pub public_subnet_ids: Vec<Expr>,
  internet_dependencies: Vec<String>,
}

impl Vpc {
  /// Declare a VPC with one public subnet per availability zone, each routed
  /// to a shared internet gateway.
  pub fn new(stack: &mut Stack, id: &str, props: VpcProps) -> Result<Self, SynthError> {
    let cidr: Ipv4Cidr = props.cidr.parse()?;
    let subnets = cidr.split(props.max_azs)?;

    let vpc_id = stack.add_resource(
      id,
      Resource::new("AWS::EC2::VPC").with_properties(json!({
        "CidrBlock": cidr.to_string(),
        "EnableDnsHostnames": true,
        "EnableDnsSupport": true,
        "InstanceTenancy": "default",
      })),
    )?;
    let igw_id = stack.add_resource(logical_id(&[id, "IGW"]), Resource::new("AWS::EC2::InternetGateway"))?;
    let attachment_id = stack.add_resource(
      logical_id(&[id, "VPCGW"]),
      Resource::new("AWS::EC2::VPCGatewayAttachment").with_properties(json!({
        "InternetGatewayId": Expr::reference(&igw_id),
        "VpcId": Expr::reference(&vpc_id),
      })),
    )?;

    let mut availability_zones = Vec::with_capacity(subnets.len());
    let mut public_subnet_ids = Vec::with_capacity(subnets.len());
    let mut internet_dependencies = Vec::with_capacity(subnets.len() * 2);

    for (index, subnet_cidr) in subnets.iter().enumerate() {
      let prefix = logical_id(&[id, &format!("PublicSubnet{}", index + 1)]);
      let az = Expr::select(index, Expr::azs());

      let subnet_id = stack.add_resource(
        logical_id(&[&prefix, "Subnet"]),
        Resource::new("AWS::EC2::Subnet").with_properties(json!({
          "AvailabilityZone": az,
          "CidrBlock": subnet_cidr.to_string(),
          "MapPublicIpOnLaunch": true,
          "VpcId": Expr::reference(&vpc_id),
          "Tags": [{ "Key": "Name", "Value": format!("{}/{}/PublicSubnet{}", stack.name(), id, index + 1) }],
        })),
      )?;
      let route_table_id = stack.add_resource(
        logical_id(&[&prefix, "RouteTable"]),
        Resource::new("AWS::EC2::RouteTable").with_properties(json!({ "VpcId": Expr::reference(&vpc_id) })),
      )?;
      let association_id = stack.add_resource(
        logical_id(&[&prefix, "RouteTableAssociation"]),
        Resource::new("AWS::EC2::SubnetRouteTableAssociation").with_properties(json!({
          "RouteTableId": Expr::reference(&route_table_id),
          "SubnetId": Expr::reference(&subnet_id),
        })),
      )?;
      let route_id = stack.add_resource(
        logical_id(&[&prefix, "DefaultRoute"]),
        Resource::new("AWS::EC2::Route")
          .with_properties(json!({
            "DestinationCidrBlock": "0.0.0.0/0",
            "GatewayId": Expr::reference(&igw_id),
            "RouteTableId": Expr::reference(&route_table_id),
          }))
          .depends_on([attachment_id.clone()]),
      )?;

      availability_zones.push(az);
      public_subnet_ids.push(Expr::reference(&subnet_id));
      internet_dependencies.push(route_id);
      internet_dependencies.push(association_id);
    }

    Ok(Self {
      vpc_id: Expr::reference(&vpc_id),
      availability_zones,
      public_subnet_ids,
      internet_dependencies,
    })
  }

  /// Reference an existing VPC, selecting each zone and subnet out of the
  /// list-valued attributes.
  pub fn from_attributes(attributes: VpcAttributes) -> Self {
    let availability_zones = (0..attributes.zone_count)
      .map(|i| Expr::select(i, attributes.availability_zones.clone()))
      .collect();
    let public_subnet_ids = (0..attributes.zone_count)
      .map(|i| Expr::select(i, attributes.public_subnet_ids.clone()))
      .collect();

    Self {
      vpc_id: attributes.vpc_id,
      availability_zones,
      public_subnet_ids,
      internet_dependencies: Vec::new(),
    }
  }

  /// Reference the VPC another stack exported through `registry`.
  pub fn from_imports(stack: &mut Stack, registry: &ExportRegistry, zone_count: usize) -> Result<Self, SynthError> {
    Ok(Self::from_attributes(VpcAttributes {
      vpc_id: stack.import(registry, ExportKey::VpcId)?,
      availability_zones: stack.import(registry, ExportKey::VpcAzs)?,
      public_subnet_ids: stack.import(registry, ExportKey::VpcPublicSubnets)?,
      zone_count,
    }))
  }

  /// Availability zones joined with `,`, suitable for a list export.
  pub fn availability_zones_joined(&self) -> Expr {
    Expr::join(",", self.availability_zones.clone())
  }

  /// Public subnet ids joined with `,`, suitable for a list export.
  pub fn public_subnet_ids_joined(&self) -> Expr {
    Expr::join(",", self.public_subnet_ids.clone())
  }

  /// Resources that must exist before anything internet-facing is placed in
  /// the public subnets. Empty for imported VPCs.
  pub fn internet_dependencies(&self) -> &[String] {
    &self.internet_dependencies
  }
}
