//! Errors raised while declaring and synthesizing stacks.

use thiserror::Error;

use crate::exports::ExportKey;

/// Structural errors detected at synthesis time.
///
/// Deploy-time failures (API rejections, quota limits) are reported by the
/// provisioning engine that consumes the synthesized templates.
#[derive(Debug, Error)]
pub enum SynthError {
  #[error("duplicate logical id '{id}' in stack {stack}")]
  DuplicateLogicalId { stack: String, id: String },

  #[error("duplicate output '{id}' in stack {stack}")]
  DuplicateOutput { stack: String, id: String },

  #[error("resource '{id}' not found in stack {stack}")]
  ResourceNotFound { stack: String, id: String },

  #[error("export {name} is not produced by any stack (requested by {consumer})")]
  MissingExport {
    key: ExportKey,
    name: String,
    consumer: String,
  },

  #[error("export {name} is already produced by stack {producer}")]
  DuplicateExport {
    key: ExportKey,
    name: String,
    producer: String,
  },

  #[error("invalid CIDR block '{0}'")]
  InvalidCidr(String),

  #[error("cannot split {cidr} into {count} subnets")]
  SubnetSplit { cidr: String, count: usize },

  #[error("invalid Fargate task size: cpu {cpu} with {memory_mib} MiB memory")]
  InvalidTaskSize { cpu: u32, memory_mib: u32 },

  #[error("task definition {0} has no container with a port mapping")]
  NoContainerPort(String),

  #[error("dependency cycle detected between stacks")]
  CycleDetected,
}
