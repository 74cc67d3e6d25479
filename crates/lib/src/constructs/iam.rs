//! IAM policy documents, statements and roles.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::consts::POLICY_VERSION;
use crate::error::SynthError;
use crate::stack::{Stack, logical_id};
use crate::template::{Expr, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
  #[default]
  Allow,
  Deny,
}

impl Effect {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Allow => "Allow",
      Self::Deny => "Deny",
    }
  }
}

/// Who a resource policy statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
  /// Any principal (`{"AWS": "*"}`).
  Any,
  /// An AWS service, e.g. `ecs-tasks.amazonaws.com`.
  Service(String),
}

impl Principal {
  fn key(&self) -> &'static str {
    match self {
      Self::Any => "AWS",
      Self::Service(_) => "Service",
    }
  }

  fn value(&self) -> &str {
    match self {
      Self::Any => "*",
      Self::Service(name) => name,
    }
  }
}

/// A single IAM policy statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyStatement {
  effect: Effect,
  actions: Vec<String>,
  principals: Vec<Principal>,
  resources: Vec<Expr>,
  conditions: BTreeMap<String, BTreeMap<String, Value>>,
}

impl PolicyStatement {
  pub fn allow() -> Self {
    Self::default()
  }

  pub fn deny() -> Self {
    Self {
      effect: Effect::Deny,
      ..Self::default()
    }
  }

  pub fn with_actions<I, S>(mut self, actions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.actions.extend(actions.into_iter().map(Into::into));
    self
  }

  pub fn with_principal(mut self, principal: Principal) -> Self {
    self.principals.push(principal);
    self
  }

  pub fn with_resource(mut self, resource: Expr) -> Self {
    self.resources.push(resource);
    self
  }

  /// Add a condition, e.g. `("Bool", "aws:SecureTransport", "true")`.
  pub fn with_condition(mut self, operator: &str, key: &str, value: impl Into<Value>) -> Self {
    self
      .conditions
      .entry(operator.to_string())
      .or_default()
      .insert(key.to_string(), value.into());
    self
  }

  pub fn effect(&self) -> Effect {
    self.effect
  }

  pub fn actions(&self) -> &[String] {
    &self.actions
  }

  pub fn principals(&self) -> &[Principal] {
    &self.principals
  }

  pub fn resources(&self) -> &[Expr] {
    &self.resources
  }

  pub fn condition(&self, operator: &str, key: &str) -> Option<&Value> {
    self.conditions.get(operator).and_then(|c| c.get(key))
  }

  /// Single values are emitted as scalars, multiple as arrays.
  pub fn to_value(&self) -> Value {
    let mut statement = Map::new();

    statement.insert("Action".to_string(), scalar_or_list(self.actions.iter().map(|a| json!(a))));
    if !self.conditions.is_empty() {
      statement.insert("Condition".to_string(), json!(self.conditions));
    }
    statement.insert("Effect".to_string(), json!(self.effect.as_str()));

    if !self.principals.is_empty() {
      let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
      for principal in &self.principals {
        grouped.entry(principal.key()).or_default().push(json!(principal.value()));
      }
      let principal: Map<String, Value> = grouped
        .into_iter()
        .map(|(k, v)| (k.to_string(), scalar_or_list(v.into_iter())))
        .collect();
      statement.insert("Principal".to_string(), Value::Object(principal));
    }

    if !self.resources.is_empty() {
      statement.insert("Resource".to_string(), scalar_or_list(self.resources.iter().map(Expr::to_value)));
    }

    Value::Object(statement)
  }
}

fn scalar_or_list(values: impl Iterator<Item = Value>) -> Value {
  let mut values: Vec<Value> = values.collect();
  if values.len() == 1 {
    values.remove(0)
  } else {
    Value::Array(values)
  }
}

/// An ordered list of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyDocument {
  statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
  pub fn add_statement(&mut self, statement: PolicyStatement) {
    self.statements.push(statement);
  }

  pub fn statements(&self) -> &[PolicyStatement] {
    &self.statements
  }

  pub fn is_empty(&self) -> bool {
    self.statements.is_empty()
  }

  pub fn to_value(&self) -> Value {
    let statements: Vec<Value> = self.statements.iter().map(PolicyStatement::to_value).collect();
    json!({ "Statement": statements, "Version": POLICY_VERSION })
  }
}

/// An IAM role assumable by one service.
///
/// Permissions are attached lazily through a `{role}DefaultPolicy` resource,
/// created on the first [`Role::add_to_policy`] call.
#[derive(Debug, Clone)]
pub struct Role {
  pub logical_id: String,
  pub arn: Expr,
  policy_id: String,
}

impl Role {
  pub fn new(stack: &mut Stack, id: &str, service: &str) -> Result<Self, SynthError> {
    let assume = PolicyStatement::allow()
      .with_actions(["sts:AssumeRole"])
      .with_principal(Principal::Service(service.to_string()));
    let mut document = PolicyDocument::default();
    document.add_statement(assume);

    let role_id = stack.add_resource(
      id,
      Resource::new("AWS::IAM::Role").with_properties(json!({ "AssumeRolePolicyDocument": document.to_value() })),
    )?;

    Ok(Self {
      arn: Expr::get_att(&role_id, "Arn"),
      policy_id: logical_id(&[&role_id, "DefaultPolicy"]),
      logical_id: role_id,
    })
  }

  pub fn policy_id(&self) -> &str {
    &self.policy_id
  }

  pub fn add_to_policy(&self, stack: &mut Stack, statement: PolicyStatement) -> Result<(), SynthError> {
    if !stack.has_resource(&self.policy_id) {
      stack.add_resource(
        &self.policy_id,
        Resource::new("AWS::IAM::Policy").with_properties(json!({
          "PolicyDocument": PolicyDocument::default().to_value(),
          "PolicyName": self.policy_id,
          "Roles": [Expr::reference(&self.logical_id)],
        })),
      )?;
    }

    let policy = stack.resource_mut(&self.policy_id)?;
    if let Some(statements) = policy
      .properties
      .get_mut("PolicyDocument")
      .and_then(|d| d.get_mut("Statement"))
      .and_then(Value::as_array_mut)
    {
      statements.push(statement.to_value());
    }
    Ok(())
  }
}
