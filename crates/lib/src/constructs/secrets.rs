//! Secrets Manager references.

/// An existing secret, referenced by its complete ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
  arn: String,
}

impl Secret {
  pub fn from_secret_complete_arn(arn: impl Into<String>) -> Self {
    Self { arn: arn.into() }
  }

  pub fn arn(&self) -> &str {
    &self.arn
  }
}

/// One JSON field of a secret, injected into a container as an
/// environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSecret {
  secret: Secret,
  field: String,
}

impl ContainerSecret {
  pub fn from_secrets_manager(secret: &Secret, field: impl Into<String>) -> Self {
    Self {
      secret: secret.clone(),
      field: field.into(),
    }
  }

  pub fn secret(&self) -> &Secret {
    &self.secret
  }

  pub fn field(&self) -> &str {
    &self.field
  }

  /// `ValueFrom` for ECS: `{arn}:{field}::` selects the JSON key at the
  /// current version.
  pub fn value_from(&self) -> String {
    format!("{}:{}::", self.secret.arn, self.field)
  }
}
