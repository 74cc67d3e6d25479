//! Typed registry of cross-stack exports.
//!
//! Stacks never share objects directly. A producer publishes a value under a
//! `{stage}-{project}-<suffix>` export name and a consumer reads it back with
//! `Fn::ImportValue`. Every suffix lives on [`ExportKey`], and imports go
//! through [`ExportRegistry`], so a consumer can only import what some stack
//! in the same app actually exports.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StackConfig;
use crate::error::SynthError;
use crate::template::Expr;

/// Every value one stack may publish for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKey {
  VpcId,
  VpcAzs,
  VpcPublicSubnets,
  EfsId,
  EfsSecurityGroup,
  ResourceGroup,
  CloudFrontDomainName,
}

impl ExportKey {
  pub const ALL: [ExportKey; 7] = [
    ExportKey::VpcId,
    ExportKey::VpcAzs,
    ExportKey::VpcPublicSubnets,
    ExportKey::EfsId,
    ExportKey::EfsSecurityGroup,
    ExportKey::ResourceGroup,
    ExportKey::CloudFrontDomainName,
  ];

  pub fn suffix(self) -> &'static str {
    match self {
      Self::VpcId => "vpc-id",
      Self::VpcAzs => "vpc-azs",
      Self::VpcPublicSubnets => "vpc-public-subnets",
      Self::EfsId => "efs-id",
      Self::EfsSecurityGroup => "efs-sg",
      Self::ResourceGroup => "resource-group",
      Self::CloudFrontDomainName => "cloudfront-domain-name",
    }
  }

  /// Comma-joined on export, split on import.
  pub fn is_list(self) -> bool {
    matches!(self, Self::VpcAzs | Self::VpcPublicSubnets)
  }

  /// The scoped export name, e.g. `Dev-FoundryVtt-vpc-id`.
  pub fn name(self, config: &StackConfig) -> String {
    config.scoped(self.suffix())
  }
}

impl fmt::Display for ExportKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.suffix())
  }
}

/// One resolved import: the expression to embed and the stack it comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
  pub key: ExportKey,
  pub name: String,
  pub producer: String,
  pub value: Expr,
}

/// Producer bookkeeping for every export in an app.
#[derive(Debug, Clone)]
pub struct ExportRegistry {
  config: StackConfig,
  producers: BTreeMap<ExportKey, String>,
}

impl ExportRegistry {
  pub fn new(config: &StackConfig) -> Self {
    Self {
      config: config.clone(),
      producers: BTreeMap::new(),
    }
  }

  pub fn config(&self) -> &StackConfig {
    &self.config
  }

  /// Record `producer` as the owner of `key` and return the export name.
  pub fn register(&mut self, key: ExportKey, producer: &str) -> Result<String, SynthError> {
    let name = key.name(&self.config);
    if let Some(existing) = self.producers.get(&key) {
      return Err(SynthError::DuplicateExport {
        key,
        name,
        producer: existing.clone(),
      });
    }
    self.producers.insert(key, producer.to_string());
    Ok(name)
  }

  /// Resolve `key` for `consumer` into an `Fn::ImportValue` expression.
  ///
  /// List exports come back as `Fn::Split(",", Fn::ImportValue(..))`.
  pub fn import(&self, key: ExportKey, consumer: &str) -> Result<Import, SynthError> {
    let name = key.name(&self.config);
    let producer = self.producers.get(&key).ok_or_else(|| SynthError::MissingExport {
      key,
      name: name.clone(),
      consumer: consumer.to_string(),
    })?;

    let imported = Expr::import_value(name.clone());
    let value = if key.is_list() {
      Expr::split(",", imported)
    } else {
      imported
    };

    Ok(Import {
      key,
      name,
      producer: producer.clone(),
      value,
    })
  }

  pub fn producer(&self, key: ExportKey) -> Option<&str> {
    self.producers.get(&key).map(String::as_str)
  }

  /// All registered exports as `(key, export name, producer)`.
  pub fn entries(&self) -> impl Iterator<Item = (ExportKey, String, &str)> {
    self
      .producers
      .iter()
      .map(|(key, producer)| (*key, key.name(&self.config), producer.as_str()))
  }
}
