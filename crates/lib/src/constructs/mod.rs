//! Building blocks that expand into raw CloudFormation resources.
//!
//! Each construct takes the [`Stack`](crate::stack::Stack) it belongs to and
//! a logical id prefix, declares its resources under that prefix and returns
//! a handle exposing the identifiers other constructs need.

pub mod cloudfront;
pub mod ec2;
pub mod ecs;
pub mod efs;
pub mod iam;
pub mod patterns;
pub mod resource_group;
pub mod secrets;
pub mod vpc;
