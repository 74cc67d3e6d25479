//! Security groups and the rules connecting them.

use serde_json::{Value, json};

use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, Resource};

use super::vpc::Vpc;

#[derive(Debug, Clone)]
pub struct SecurityGroup {
  pub logical_id: String,
  pub group_id: Expr,
  allow_all_outbound: bool,
}

impl SecurityGroup {
  pub fn new(
    stack: &mut Stack,
    id: &str,
    vpc: &Vpc,
    description: &str,
    allow_all_outbound: bool,
  ) -> Result<Self, SynthError> {
    let egress = if allow_all_outbound {
      json!([{
        "CidrIp": "0.0.0.0/0",
        "Description": "Allow all outbound traffic by default",
        "IpProtocol": "-1",
      }])
    } else {
      json!([{
        "CidrIp": "255.255.255.255/32",
        "Description": "Disallow all traffic",
        "FromPort": 252,
        "IpProtocol": "icmp",
        "ToPort": 86,
      }])
    };

    let group_id = stack.add_resource(
      id,
      Resource::new("AWS::EC2::SecurityGroup").with_properties(json!({
        "GroupDescription": description,
        "SecurityGroupEgress": egress,
        "VpcId": vpc.vpc_id,
      })),
    )?;

    Ok(Self {
      group_id: Expr::get_att(&group_id, "GroupId"),
      logical_id: group_id,
      allow_all_outbound,
    })
  }

  pub fn allows_all_outbound(&self) -> bool {
    self.allow_all_outbound
  }

  /// Allow TCP `port` from anywhere, inline on the group.
  pub fn allow_from_any_ipv4(&self, stack: &mut Stack, port: u16, description: &str) -> Result<(), SynthError> {
    let group = stack.resource_mut(&self.logical_id)?;
    group.array_property_mut("SecurityGroupIngress").push(json!({
      "CidrIp": "0.0.0.0/0",
      "Description": description,
      "FromPort": port,
      "IpProtocol": "tcp",
      "ToPort": port,
    }));
    Ok(())
  }

  /// Allow TCP `port` from `source` into this group.
  ///
  /// When the source group restricts outbound traffic, the matching egress
  /// rule is added to it as well.
  pub fn allow_from(&self, stack: &mut Stack, source: &SecurityGroup, port: u16) -> Result<(), SynthError> {
    let description = format!("from {}:{}", source.logical_id, port);
    stack.add_resource(
      logical_id(&[&self.logical_id, "from", &source.logical_id, &port.to_string()]),
      Resource::new("AWS::EC2::SecurityGroupIngress").with_properties(rule(
        "GroupId",
        &self.group_id,
        "SourceSecurityGroupId",
        &source.group_id,
        port,
        &description,
      )),
    )?;

    if !source.allow_all_outbound {
      let description = format!("to {}:{}", self.logical_id, port);
      stack.add_resource(
        logical_id(&[&source.logical_id, "to", &self.logical_id, &port.to_string()]),
        Resource::new("AWS::EC2::SecurityGroupEgress").with_properties(rule(
          "GroupId",
          &source.group_id,
          "DestinationSecurityGroupId",
          &self.group_id,
          port,
          &description,
        )),
      )?;
    }
    Ok(())
  }
}

fn rule(group_key: &str, group: &Expr, peer_key: &str, peer: &Expr, port: u16, description: &str) -> Value {
  json!({
    "Description": description,
    "FromPort": port,
    group_key: group,
    "IpProtocol": "tcp",
    peer_key: peer,
    "ToPort": port,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StackConfig;
  use crate::constructs::vpc::VpcAttributes;

  fn vpc() -> Vpc {
    Vpc::from_attributes(VpcAttributes {
      vpc_id: Expr::import_value("vpc"),
      availability_zones: Expr::List(vec![]),
      public_subnet_ids: Expr::List(vec![]),
      zone_count: 0,
    })
  }

  #[test]
  fn restricted_source_gets_matching_egress() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let vpc = vpc();
    let lb = SecurityGroup::new(&mut stack, "LbSg", &vpc, "lb", false).unwrap();
    let svc = SecurityGroup::new(&mut stack, "SvcSg", &vpc, "svc", true).unwrap();

    svc.allow_from(&mut stack, &lb, 30000).unwrap();

    let ingress = stack.resource("SvcSgfromLbSg30000").unwrap();
    assert_eq!(ingress.resource_type, "AWS::EC2::SecurityGroupIngress");
    assert_eq!(ingress.property("FromPort"), Some(&json!(30000)));
    assert_eq!(
      ingress.property("SourceSecurityGroupId"),
      Some(&json!({ "Fn::GetAtt": ["LbSg", "GroupId"] }))
    );

    let egress = stack.resource("LbSgtoSvcSg30000").unwrap();
    assert_eq!(egress.resource_type, "AWS::EC2::SecurityGroupEgress");
  }

  #[test]
  fn open_source_gets_no_egress_rule() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let vpc = vpc();
    let fs = SecurityGroup::new(&mut stack, "FsSg", &vpc, "fs", true).unwrap();
    let svc = SecurityGroup::new(&mut stack, "SvcSg", &vpc, "svc", true).unwrap();

    fs.allow_from(&mut stack, &svc, 2049).unwrap();

    assert!(stack.has_resource("FsSgfromSvcSg2049"));
    assert!(!stack.has_resource("SvcSgtoFsSg2049"));
  }

  #[test]
  fn inline_ingress_from_anywhere() {
    let mut stack = Stack::new("S", &StackConfig::default());
    let sg = SecurityGroup::new(&mut stack, "Sg", &vpc(), "public", false).unwrap();
    sg.allow_from_any_ipv4(&mut stack, 80, "Allow from anyone on port 80").unwrap();

    let ingress = stack.resource("Sg").unwrap().property("SecurityGroupIngress").unwrap();
    assert_eq!(ingress[0]["CidrIp"], "0.0.0.0/0");
    assert_eq!(ingress[0]["ToPort"], 80);
  }
}
