//! Error types for `graphschema-core`.

use thiserror::Error;

/// The table family an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Entity {
  #[strum(serialize = "graph schema extension")]
  Extension,
  #[strum(serialize = "schema node kind")]
  NodeKind,
  #[strum(serialize = "schema relationship kind")]
  EdgeKind,
  #[strum(serialize = "schema property")]
  Property,
  #[strum(serialize = "schema environment")]
  Environment,
  #[strum(serialize = "schema environment principal kind")]
  PrincipalKind,
  #[strum(serialize = "schema relationship finding")]
  Finding,
  #[strum(serialize = "schema remediation")]
  Remediation,
  #[strum(serialize = "kind")]
  Kind,
  #[strum(serialize = "source kind")]
  SourceKind,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {key}")]
  NotFound { entity: Entity, key: String },

  #[error("duplicate {entity} name: {name}")]
  DuplicateName { entity: Entity, name: String },

  #[error("cannot modify a built-in graph schema extension: {0}")]
  BuiltInImmutable(String),

  #[error("environment kind '{0}' not found")]
  EnvironmentKindNotFound(String),

  #[error("source kind '{0}' not found")]
  SourceKindNotFound(String),

  #[error("relationship kind '{0}' not found")]
  RelationshipKindNotFound(String),

  #[error("principal kind '{0}' not found")]
  PrincipalKindNotFound(String),

  #[error(
    "environment not found for environment kind '{environment_kind}' and \
     source kind '{source_kind}'"
  )]
  EnvironmentNotFound {
    environment_kind: String,
    source_kind:      String,
  },

  #[error("graph schema validation error: {0}")]
  Validation(String),

  /// A backend failure, wrapped with the operation that was in flight.
  #[error("{context}: {source}")]
  Store {
    context: String,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub fn not_found(entity: Entity, key: impl ToString) -> Self {
    Self::NotFound { entity, key: key.to_string() }
  }

  pub fn duplicate(entity: Entity, name: impl Into<String>) -> Self {
    Self::DuplicateName { entity, name: name.into() }
  }

  pub fn store(
    context: impl Into<String>,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::Store { context: context.into(), source: source.into() }
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }

  pub fn is_duplicate_name(&self) -> bool {
    matches!(self, Self::DuplicateName { .. })
  }

  pub fn is_builtin_immutable(&self) -> bool {
    matches!(self, Self::BuiltInImmutable(_))
  }

  /// True for the failures that name an identifier the upsert referenced
  /// but that could not be resolved.
  pub fn is_reference_not_found(&self) -> bool {
    matches!(
      self,
      Self::EnvironmentKindNotFound(_)
        | Self::SourceKindNotFound(_)
        | Self::RelationshipKindNotFound(_)
        | Self::PrincipalKindNotFound(_)
        | Self::EnvironmentNotFound { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
