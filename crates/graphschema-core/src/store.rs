//! Storage seams.
//!
//! Two layers live here:
//!
//! - The synchronous repository traits and [`UnitOfWork`] /
//!   [`SchemaTransaction`], which the reconciliation engine in
//!   [`crate::engine`] is written against. Every repository call made through
//!   a transaction is part of that transaction.
//! - The async [`SchemaStore`] facade that the owning service layer calls.
//!   Backends implement it by running the engine inside one transaction.

use std::future::Future;

use crate::{
  Result,
  input::{
    EdgeKindInput, EnvironmentInput, ExtensionInput, FindingInput,
    GraphExtensionInput, NodeKindInput, PropertyInput, RemediationInput,
  },
  model::{
    EdgeKind, Environment, GraphSchema, Kind, NodeKind, PrincipalKind,
    Property, RelationshipFinding, Remediation, SchemaExtension, SourceKind,
  },
};

// ─── Repositories ────────────────────────────────────────────────────────────
//
// Lookups by id, name or composite key return `Error::NotFound` when nothing
// matches. Creates that violate a uniqueness constraint return
// `Error::DuplicateName`. Listers return an empty vec rather than NotFound.

pub trait ExtensionRepository {
  fn create_extension(
    &self,
    input: &ExtensionInput,
    is_builtin: bool,
  ) -> Result<SchemaExtension>;
  fn get_extension_by_id(&self, id: i64) -> Result<SchemaExtension>;
  fn get_extension_by_name(&self, name: &str) -> Result<SchemaExtension>;
  fn list_extensions(&self) -> Result<Vec<SchemaExtension>>;
  /// Persist the mutable fields (display name, version, namespace).
  fn update_extension(
    &self,
    extension: &SchemaExtension,
  ) -> Result<SchemaExtension>;
  fn delete_extension(&self, id: i64) -> Result<()>;
}

pub trait NodeKindRepository {
  /// Create the row and register its name in the platform kind table.
  fn create_node_kind(
    &self,
    extension_id: i64,
    input: &NodeKindInput,
  ) -> Result<NodeKind>;
  fn get_node_kind_by_id(&self, id: i64) -> Result<NodeKind>;
  fn node_kinds_by_extension(&self, extension_id: i64) -> Result<Vec<NodeKind>>;
  fn delete_node_kind(&self, id: i64) -> Result<()>;
}

pub trait EdgeKindRepository {
  /// Create the row and register its name in the platform kind table.
  fn create_edge_kind(
    &self,
    extension_id: i64,
    input: &EdgeKindInput,
  ) -> Result<EdgeKind>;
  fn get_edge_kind_by_id(&self, id: i64) -> Result<EdgeKind>;
  fn edge_kinds_by_extension(&self, extension_id: i64) -> Result<Vec<EdgeKind>>;
  fn delete_edge_kind(&self, id: i64) -> Result<()>;
}

pub trait PropertyRepository {
  fn create_property(
    &self,
    extension_id: i64,
    input: &PropertyInput,
  ) -> Result<Property>;
  fn get_property_by_id(&self, id: i64) -> Result<Property>;
  fn properties_by_extension(&self, extension_id: i64) -> Result<Vec<Property>>;
  fn delete_property(&self, id: i64) -> Result<()>;
}

pub trait EnvironmentRepository {
  fn create_environment(
    &self,
    extension_id: i64,
    environment_kind_id: i64,
    source_kind_id: i64,
  ) -> Result<Environment>;
  fn get_environment_by_id(&self, id: i64) -> Result<Environment>;
  fn get_environment_by_kinds(
    &self,
    environment_kind_id: i64,
    source_kind_id: i64,
  ) -> Result<Environment>;
  fn environments_by_extension(
    &self,
    extension_id: i64,
  ) -> Result<Vec<Environment>>;
  fn delete_environment(&self, id: i64) -> Result<()>;

  fn create_principal_kind(
    &self,
    environment_id: i64,
    principal_kind: i64,
  ) -> Result<PrincipalKind>;
  fn principal_kinds_by_environment(
    &self,
    environment_id: i64,
  ) -> Result<Vec<PrincipalKind>>;
  /// Remove every principal kind of the environment. Not an error when
  /// there are none.
  fn delete_principal_kinds(&self, environment_id: i64) -> Result<()>;
}

pub trait FindingRepository {
  fn create_finding(
    &self,
    extension_id: i64,
    relationship_kind_id: i64,
    environment_id: i64,
    name: &str,
    display_name: &str,
  ) -> Result<RelationshipFinding>;
  fn get_finding_by_id(&self, id: i64) -> Result<RelationshipFinding>;
  fn get_finding_by_name(&self, name: &str) -> Result<RelationshipFinding>;
  fn findings_by_extension(
    &self,
    extension_id: i64,
  ) -> Result<Vec<RelationshipFinding>>;
  fn findings_by_environment(
    &self,
    environment_id: i64,
  ) -> Result<Vec<RelationshipFinding>>;
  fn delete_finding(&self, id: i64) -> Result<()>;
}

pub trait RemediationRepository {
  fn create_remediation(
    &self,
    finding_id: i64,
    input: &RemediationInput,
  ) -> Result<Remediation>;
  fn get_remediation(&self, finding_id: i64) -> Result<Remediation>;
  /// Overwrite the four text fields in place.
  fn update_remediation(
    &self,
    finding_id: i64,
    input: &RemediationInput,
  ) -> Result<Remediation>;
  /// Remove the remediation of a finding. Not an error when there is none.
  fn delete_remediation(&self, finding_id: i64) -> Result<()>;
}

/// Name → id translation over the platform kind table.
pub trait KindResolver {
  fn resolve_kind(&self, name: &str) -> Result<Option<Kind>>;
  /// Insert the name if absent and return its row either way.
  fn register_kind(&self, name: &str) -> Result<Kind>;
  fn get_kind_by_id(&self, id: i64) -> Result<Kind>;
}

/// Name → id translation over the source kind table. Inactive source kinds
/// are invisible to lookups until they are registered again.
pub trait SourceKindRegistry {
  fn resolve_source_kind(&self, name: &str) -> Result<Option<SourceKind>>;
  /// Insert the name if absent, reactivate it if it was deactivated.
  fn register_source_kind(&self, name: &str) -> Result<SourceKind>;
  fn get_source_kind_by_id(&self, id: i64) -> Result<SourceKind>;
  fn deactivate_source_kind(&self, name: &str) -> Result<()>;
}

/// Every repository the engine needs, bound to one transaction.
pub trait SchemaRepository:
  ExtensionRepository
  + NodeKindRepository
  + EdgeKindRepository
  + PropertyRepository
  + EnvironmentRepository
  + FindingRepository
  + RemediationRepository
  + KindResolver
  + SourceKindRegistry
{
}

impl<T> SchemaRepository for T where
  T: ExtensionRepository
    + NodeKindRepository
    + EdgeKindRepository
    + PropertyRepository
    + EnvironmentRepository
    + FindingRepository
    + RemediationRepository
    + KindResolver
    + SourceKindRegistry
{
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// One open transaction scope.
///
/// Dropping a scope without calling [`commit`](Self::commit) rolls it back.
/// A nested scope commits only into its parent: if the parent later rolls
/// back, so does everything the nested scope wrote. A nested scope that
/// rolls back fails its parent, whose `commit` then rolls back and errors.
pub trait SchemaTransaction: SchemaRepository {
  type Nested<'a>: SchemaTransaction
  where
    Self: 'a;

  fn nested(&mut self) -> Result<Self::Nested<'_>>;
  fn commit(self) -> Result<()>;
  fn rollback(self) -> Result<()>;
}

/// Opens root transaction scopes.
pub trait UnitOfWork {
  type Transaction<'a>: SchemaTransaction
  where
    Self: 'a;

  fn begin(&mut self) -> Result<Self::Transaction<'_>>;
}

// ─── Async facade ────────────────────────────────────────────────────────────

/// Abstraction over a graph schema store backend, as seen by the owning
/// service layer.
///
/// Every write runs in a single transaction: on error the store is left
/// exactly as it was before the call.
pub trait SchemaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Reconcile the stored extension named by `input` with `input`.
  ///
  /// Returns `true` when the extension already existed (update path) and
  /// `false` when it was created.
  fn upsert_graph_extension(
    &self,
    input: GraphExtensionInput,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove an extension and everything that references it.
  fn delete_schema_extension(
    &self,
    extension_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the environment for `(environment kind, source kind)` and its
  /// principal kind set, binding it to `extension_id`.
  fn upsert_schema_environment(
    &self,
    extension_id: i64,
    input: EnvironmentInput,
  ) -> impl Future<Output = Result<Environment, Self::Error>> + Send + '_;

  /// Replace the finding named by `input` and update or create its
  /// remediation.
  fn upsert_finding(
    &self,
    extension_id: i64,
    input: FindingInput,
  ) -> impl Future<Output = Result<RelationshipFinding, Self::Error>> + Send + '_;

  // ── Seeding ───────────────────────────────────────────────────────────

  /// Install a built-in extension if no extension has its name yet.
  /// Returns `false` when the name was already taken and nothing changed.
  fn seed_builtin_extension(
    &self,
    input: GraphExtensionInput,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn register_kind(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Kind, Self::Error>> + Send + '_;

  fn register_source_kind(
    &self,
    name: String,
  ) -> impl Future<Output = Result<SourceKind, Self::Error>> + Send + '_;

  fn deactivate_source_kind(
    &self,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_extension_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<SchemaExtension, Self::Error>> + Send + '_;

  fn list_extensions(
    &self,
  ) -> impl Future<Output = Result<Vec<SchemaExtension>, Self::Error>> + Send + '_;

  /// Materialise an extension with everything it owns.
  fn get_graph_schema(
    &self,
    name: String,
  ) -> impl Future<Output = Result<GraphSchema, Self::Error>> + Send + '_;

  fn get_finding_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<RelationshipFinding, Self::Error>> + Send + '_;

  fn get_remediation(
    &self,
    finding_id: i64,
  ) -> impl Future<Output = Result<Remediation, Self::Error>> + Send + '_;

  fn principal_kinds_by_environment(
    &self,
    environment_id: i64,
  ) -> impl Future<Output = Result<Vec<PrincipalKind>, Self::Error>> + Send + '_;
}
