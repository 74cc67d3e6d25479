//! CloudFormation intrinsic functions.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// A template value: either a literal or an intrinsic function resolved by
/// CloudFormation at deploy time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Str(String),
  Int(i64),
  Bool(bool),
  List(Vec<Expr>),
  Ref(String),
  GetAtt(String, String),
  ImportValue(Box<Expr>),
  Join(String, Vec<Expr>),
  Split(String, Box<Expr>),
  Select(usize, Box<Expr>),
  GetAzs(String),
  Sub(String),
}

impl Expr {
  pub fn str(value: impl Into<String>) -> Self {
    Self::Str(value.into())
  }

  /// `{"Ref": logical_id}`
  pub fn reference(logical_id: impl Into<String>) -> Self {
    Self::Ref(logical_id.into())
  }

  /// `{"Fn::GetAtt": [logical_id, attribute]}`
  pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
    Self::GetAtt(logical_id.into(), attribute.into())
  }

  pub fn import_value(name: impl Into<String>) -> Self {
    Self::ImportValue(Box::new(Self::Str(name.into())))
  }

  pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
    Self::Join(delimiter.into(), parts)
  }

  pub fn split(delimiter: impl Into<String>, source: Expr) -> Self {
    Self::Split(delimiter.into(), Box::new(source))
  }

  pub fn select(index: usize, list: Expr) -> Self {
    Self::Select(index, Box::new(list))
  }

  /// Availability zones of the deployment region.
  pub fn azs() -> Self {
    Self::GetAzs(String::new())
  }

  /// The `AWS::Region` pseudo parameter.
  pub fn region() -> Self {
    Self::Ref("AWS::Region".to_string())
  }

  pub fn sub(template: impl Into<String>) -> Self {
    Self::Sub(template.into())
  }

  /// Literal string content, if this is not an intrinsic.
  pub fn as_literal(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn to_value(&self) -> Value {
    match self {
      Self::Str(s) => Value::String(s.clone()),
      Self::Int(n) => json!(n),
      Self::Bool(b) => Value::Bool(*b),
      Self::List(items) => Value::Array(items.iter().map(Expr::to_value).collect()),
      Self::Ref(id) => json!({ "Ref": id }),
      Self::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id, attr] }),
      Self::ImportValue(name) => json!({ "Fn::ImportValue": name.to_value() }),
      Self::Join(delimiter, parts) => {
        let parts: Vec<Value> = parts.iter().map(Expr::to_value).collect();
        json!({ "Fn::Join": [delimiter, parts] })
      }
      Self::Split(delimiter, source) => json!({ "Fn::Split": [delimiter, source.to_value()] }),
      Self::Select(index, list) => json!({ "Fn::Select": [index, list.to_value()] }),
      Self::GetAzs(region) => json!({ "Fn::GetAZs": region }),
      Self::Sub(template) => json!({ "Fn::Sub": template }),
    }
  }
}

impl Serialize for Expr {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.to_value().serialize(serializer)
  }
}

impl From<&str> for Expr {
  fn from(value: &str) -> Self {
    Self::Str(value.to_string())
  }
}

impl From<String> for Expr {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

impl From<bool> for Expr {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i64> for Expr {
  fn from(value: i64) -> Self {
    Self::Int(value)
  }
}
