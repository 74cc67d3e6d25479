//! Deployment context resolution.
//!
//! Every stack is parameterized by a stage and a project. Both are resolved
//! once, at process start, and then handed to each stack constructor as an
//! immutable [`StackConfig`]. Resource names and cross-stack export keys are
//! all derived from this pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PROJECT, DEFAULT_STAGE, LEGACY_DEFAULT_STAGE, PROJECT_ENV, STAGE_ENV};

/// The `(stage, project)` pair scoping every resource and export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackConfig {
  pub stage: String,
  pub project: String,
}

impl StackConfig {
  /// Stage default used by the older network/filesystem deployments.
  pub const LEGACY_STAGE_DEFAULT: &'static str = LEGACY_DEFAULT_STAGE;

  pub fn new(stage: impl Into<String>, project: impl Into<String>) -> Self {
    Self {
      stage: stage.into(),
      project: project.into(),
    }
  }

  /// Resolve from the process environment (`STAGE`, `PROJECT`).
  pub fn from_env() -> Self {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Resolve using an arbitrary variable lookup.
  ///
  /// Unset and empty values both fall back to the defaults.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let resolve = |name: &str, default: &str| {
      lookup(name)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
    };

    Self {
      stage: resolve(STAGE_ENV, DEFAULT_STAGE),
      project: resolve(PROJECT_ENV, DEFAULT_PROJECT),
    }
  }

  /// Replace stage and/or project, keeping the other value.
  pub fn with_overrides(mut self, stage: Option<String>, project: Option<String>) -> Self {
    if let Some(stage) = stage {
      self.stage = stage;
    }
    if let Some(project) = project {
      self.project = project;
    }
    self
  }

  /// `{stage}-{project}-{suffix}`
  pub fn scoped(&self, suffix: &str) -> String {
    format!("{}-{}-{}", self.stage, self.project, suffix)
  }

  /// `{stage}-{project}`, the name of the tag-based resource group.
  pub fn resource_group_name(&self) -> String {
    format!("{}-{}", self.stage, self.project)
  }

  /// Stack name for a deployment unit, e.g. `Dev-FoundryVttNetworkStack`.
  pub fn stack_name(&self, unit: &str) -> String {
    format!("{}-{}{}Stack", self.stage, self.project, unit)
  }

  /// Tags applied to every taggable resource, in key order.
  pub fn tags(&self) -> Vec<(String, String)> {
    vec![
      ("project".to_string(), self.project.clone()),
      ("stage".to_string(), self.stage.clone()),
    ]
  }
}

impl Default for StackConfig {
  fn default() -> Self {
    Self::new(DEFAULT_STAGE, DEFAULT_PROJECT)
  }
}

impl fmt::Display for StackConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.stage, self.project)
  }
}
