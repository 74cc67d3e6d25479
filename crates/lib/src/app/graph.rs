//! Stack dependency graph.
//!
//! Edges run from the stack exporting a value to every stack importing it,
//! so a topological order is a valid deploy order.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::SynthError;
use crate::stack::Stack;

pub struct StackGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl StackGraph {
  /// Build the graph from each stack's recorded import dependencies.
  ///
  /// Dependencies on stacks outside `stacks` are ignored; the registry
  /// only resolves imports against stacks of the same app.
  pub fn from_stacks(stacks: &[Stack]) -> Result<Self, SynthError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for stack in stacks {
      let idx = graph.add_node(stack.name().to_string());
      nodes.insert(stack.name().to_string(), idx);
    }

    for stack in stacks {
      let dependent_idx = nodes[stack.name()];
      for dependency in stack.dependencies() {
        if let Some(&dep_idx) = nodes.get(dependency) {
          graph.add_edge(dep_idx, dependent_idx, ());
        }
      }
    }

    let stack_graph = Self { graph, nodes };
    stack_graph.deploy_order()?;
    Ok(stack_graph)
  }

  /// Add an explicit `dependency -> dependent` edge.
  pub fn add_dependency(&mut self, dependency: &str, dependent: &str) {
    if let (Some(&from), Some(&to)) = (self.nodes.get(dependency), self.nodes.get(dependent)) {
      self.graph.add_edge(from, to, ());
    }
  }

  /// Stack names with every exporter ahead of its importers.
  pub fn deploy_order(&self) -> Result<Vec<String>, SynthError> {
    let sorted = toposort(&self.graph, None).map_err(|_| SynthError::CycleDetected)?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Stacks grouped into waves that can deploy concurrently: every stack's
  /// dependencies sit in earlier waves. Names within a wave are sorted.
  pub fn deploy_waves(&self) -> Result<Vec<Vec<String>>, SynthError> {
    let order = toposort(&self.graph, None).map_err(|_| SynthError::CycleDetected)?;

    let mut level: HashMap<NodeIndex, usize> = HashMap::new();
    for idx in order {
      let wave = self
        .graph
        .neighbors_directed(idx, Direction::Incoming)
        .filter_map(|dep| level.get(&dep))
        .map(|l| l + 1)
        .max()
        .unwrap_or(0);
      level.insert(idx, wave);
    }

    let mut waves: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (idx, wave) in level {
      waves.entry(wave).or_default().push(self.graph[idx].clone());
    }
    Ok(
      waves
        .into_values()
        .map(|mut names| {
          names.sort();
          names
        })
        .collect(),
    )
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }
}
