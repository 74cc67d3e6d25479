//! Apps: the sets of stacks deployed together.

mod graph;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::assembly::{AssemblyError, CloudAssembly};
use crate::config::StackConfig;
use crate::error::SynthError;
use crate::exports::ExportRegistry;
use crate::stack::Stack;
use crate::stacks::{FilesystemStack, FoundryEcsStack, FoundryOptions, FoundryStack, NetworkStack};

pub use graph::StackGraph;

/// Which set of stacks to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
  /// One minimal stack running the ECS sample image.
  #[default]
  Ecs,
  /// The complete Foundry deployment in one stack.
  Foundry,
  /// Separately deployed network and file system stacks.
  Split,
}

impl AppKind {
  pub const ALL: [AppKind; 3] = [AppKind::Ecs, AppKind::Foundry, AppKind::Split];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Ecs => "ecs",
      Self::Foundry => "foundry",
      Self::Split => "split",
    }
  }
}

impl fmt::Display for AppKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
#[error("unknown app '{0}' (expected one of: ecs, foundry, split)")]
pub struct ParseAppKindError(String);

impl FromStr for AppKind {
  type Err = ParseAppKindError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| ParseAppKindError(s.to_string()))
  }
}

/// Stacks of one app, built against a shared export registry.
#[derive(Debug, Clone)]
pub struct App {
  kind: AppKind,
  config: StackConfig,
  registry: ExportRegistry,
  stacks: Vec<Stack>,
}

impl App {
  /// Build every stack of `kind`, exporters first.
  pub fn build(kind: AppKind, config: &StackConfig, options: &FoundryOptions) -> Result<Self, SynthError> {
    let mut registry = ExportRegistry::new(config);

    let stacks = match kind {
      AppKind::Ecs => vec![FoundryEcsStack::new(config, &mut registry)?.stack],
      AppKind::Foundry => vec![FoundryStack::new(config, &mut registry, options)?.stack],
      AppKind::Split => {
        let network = NetworkStack::new(config, &mut registry)?;
        let filesystem = FilesystemStack::new(config, &mut registry)?;
        vec![network.stack, filesystem.stack]
      }
    };

    info!(app = %kind, config = %config, stacks = stacks.len(), "built app");
    Ok(Self {
      kind,
      config: config.clone(),
      registry,
      stacks,
    })
  }

  pub fn kind(&self) -> AppKind {
    self.kind
  }

  pub fn config(&self) -> &StackConfig {
    &self.config
  }

  pub fn registry(&self) -> &ExportRegistry {
    &self.registry
  }

  pub fn stacks(&self) -> &[Stack] {
    &self.stacks
  }

  pub fn stack(&self, name: &str) -> Option<&Stack> {
    self.stacks.iter().find(|s| s.name() == name)
  }

  pub fn graph(&self) -> Result<StackGraph, SynthError> {
    StackGraph::from_stacks(&self.stacks)
  }

  /// Stacks ordered so every exporter precedes its importers.
  pub fn deploy_order(&self) -> Result<Vec<&Stack>, SynthError> {
    let order = self.graph()?.deploy_order()?;
    Ok(order.iter().filter_map(|name| self.stack(name)).collect())
  }

  /// Synthesize every stack, in deploy order, into an assembly.
  pub fn synth(&self) -> Result<CloudAssembly, AppError> {
    let mut assembly = CloudAssembly::new(&self.config);
    for stack in self.deploy_order()? {
      let dependencies = stack.dependencies().map(str::to_string).collect();
      let entry = assembly.add_stack(stack.name(), dependencies, stack.synth())?;
      info!(stack = %entry.name, hash = %entry.hash, "synthesized stack");
    }
    Ok(assembly)
  }
}

/// Failure anywhere between declaring stacks and producing an assembly.
#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Synth(#[from] SynthError),

  #[error(transparent)]
  Assembly(#[from] AssemblyError),
}
