//! CloudFront distribution fronting a load balancer.

use serde_json::json;

use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, Resource};

use super::patterns::LoadBalancer;

/// Id of the AWS managed `CachingOptimized` cache policy.
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// Minimum TLS version offered to viewers on a custom certificate.
pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2021";

#[derive(Debug, Clone, Default)]
pub struct DistributionProps {
  pub comment: String,
  /// ACM certificate for custom domain names. Without one the default
  /// CloudFront certificate is used.
  pub certificate_arn: Option<String>,
  pub domain_names: Vec<String>,
  /// Port the load balancer listens on for HTTP.
  pub origin_http_port: u16,
}

#[derive(Debug, Clone)]
pub struct Distribution {
  pub logical_id: String,
  pub domain_name: Expr,
}

impl Distribution {
  /// Serve `load_balancer` over HTTP-only origin requests with the
  /// optimized managed cache policy.
  pub fn new(
    stack: &mut Stack,
    id: &str,
    load_balancer: &LoadBalancer,
    props: DistributionProps,
  ) -> Result<Self, SynthError> {
    let origin_id = logical_id(&[stack.name(), id, "Origin1"]);
    let mut config = json!({
      "Comment": props.comment,
      "DefaultCacheBehavior": {
        "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
        "Compress": true,
        "TargetOriginId": origin_id,
        "ViewerProtocolPolicy": "allow-all",
      },
      "Enabled": true,
      "HttpVersion": "http2",
      "IPV6Enabled": true,
      "Origins": [{
        "CustomOriginConfig": {
          "HTTPPort": props.origin_http_port,
          "OriginProtocolPolicy": "http-only",
          "OriginSSLProtocols": ["TLSv1.2"],
        },
        "DomainName": load_balancer.dns_name,
        "Id": origin_id,
      }],
    });

    if let Some(arn) = &props.certificate_arn {
      config["Aliases"] = json!(props.domain_names);
      config["ViewerCertificate"] = json!({
        "AcmCertificateArn": arn,
        "MinimumProtocolVersion": MINIMUM_PROTOCOL_VERSION,
        "SslSupportMethod": "sni-only",
      });
    }

    let distribution_id = stack.add_resource(
      id,
      Resource::new("AWS::CloudFront::Distribution").with_properties(json!({ "DistributionConfig": config })),
    )?;

    Ok(Self {
      domain_name: Expr::get_att(&distribution_id, "DomainName"),
      logical_id: distribution_id,
    })
  }
}
