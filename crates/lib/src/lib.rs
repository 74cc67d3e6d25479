//! vttcloud-lib: CloudFormation synthesis for Foundry VTT on ECS Fargate
//!
//! This crate declares the AWS infrastructure for a Foundry VTT server and
//! renders it as CloudFormation templates:
//! - `config`: the `(stage, project)` deployment context
//! - `template`: the CloudFormation document model and intrinsic functions
//! - `constructs`: VPC, EFS, ECS, load balancer and CDN building blocks
//! - `stacks`: the network, filesystem and service stacks
//! - `exports`: typed cross-stack export/import names
//! - `app`: stack sets and their deploy order
//! - `assembly`: the on-disk output and template diffs

pub mod app;
pub mod assembly;
pub mod config;
pub mod consts;
pub mod constructs;
pub mod error;
pub mod exports;
pub mod stack;
pub mod stacks;
pub mod template;
pub mod util;

pub use app::{App, AppError, AppKind};
pub use config::StackConfig;
pub use error::SynthError;
pub use stacks::FoundryOptions;
