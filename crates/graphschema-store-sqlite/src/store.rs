//! [`SqliteStore`]: the SQLite implementation of [`SchemaStore`].

use std::path::Path;

use graphschema_core::{
  engine,
  input::{EnvironmentInput, FindingInput, GraphExtensionInput},
  model::{
    Environment, GraphSchema, Kind, PrincipalKind, RelationshipFinding,
    Remediation, SchemaExtension, SourceKind,
  },
  store::{
    EnvironmentRepository, ExtensionRepository, FindingRepository,
    KindResolver, RemediationRepository, SchemaStore, SourceKindRegistry,
  },
};
use tracing::debug;

use crate::{
  Result,
  schema::SCHEMA,
  tx::{SqliteTx, SqliteUnitOfWork, run_in_transaction},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A graph schema store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection, so writes are serialised on its thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("graph schema store initialised");
    Ok(())
  }

  /// Run `f` against one root transaction, committing when it succeeds.
  pub(crate) async fn within<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&SqliteTx<'_>) -> graphschema_core::Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| Ok(run_in_transaction(conn, f)))
      .await?;
    Ok(outcome?)
  }

  /// Run an engine entry point that manages its own transactions.
  async fn with_unit_of_work<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteUnitOfWork<'_>) -> graphschema_core::Result<T>
      + Send
      + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| Ok(f(&mut SqliteUnitOfWork::new(conn))))
      .await?;
    Ok(outcome?)
  }
}

// ─── SchemaStore impl ────────────────────────────────────────────────────────

impl SchemaStore for SqliteStore {
  type Error = crate::Error;

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn upsert_graph_extension(&self, input: GraphExtensionInput) -> Result<bool> {
    self
      .with_unit_of_work(move |uow| engine::upsert_graph_extension(uow, &input))
      .await
  }

  async fn delete_schema_extension(&self, extension_id: i64) -> Result<()> {
    self
      .with_unit_of_work(move |uow| engine::delete_schema_extension(uow, extension_id))
      .await
  }

  async fn upsert_schema_environment(
    &self,
    extension_id: i64,
    input: EnvironmentInput,
  ) -> Result<Environment> {
    self
      .within(move |tx| {
        engine::extension::mutable_extension(tx, extension_id)?;
        engine::upsert_environment(
          tx,
          extension_id,
          &input.environment_kind_name,
          &input.source_kind_name,
          &input.principal_kinds,
        )
      })
      .await
  }

  async fn upsert_finding(
    &self,
    extension_id: i64,
    input: FindingInput,
  ) -> Result<RelationshipFinding> {
    self
      .within(move |tx| {
        engine::extension::mutable_extension(tx, extension_id)?;
        let finding = engine::upsert_finding(
          tx,
          extension_id,
          &input.source_kind_name,
          &input.relationship_kind_name,
          &input.environment_kind_name,
          &input.name,
          &input.display_name,
        )?;
        engine::upsert_remediation(tx, finding.id, &input.remediation)?;
        Ok(finding)
      })
      .await
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  async fn seed_builtin_extension(&self, input: GraphExtensionInput) -> Result<bool> {
    self
      .with_unit_of_work(move |uow| engine::seed_builtin_extension(uow, &input))
      .await
  }

  async fn register_kind(&self, name: String) -> Result<Kind> {
    self.within(move |tx| tx.register_kind(&name)).await
  }

  async fn register_source_kind(&self, name: String) -> Result<SourceKind> {
    self.within(move |tx| tx.register_source_kind(&name)).await
  }

  async fn deactivate_source_kind(&self, name: String) -> Result<()> {
    self.within(move |tx| tx.deactivate_source_kind(&name)).await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_extension_by_name(&self, name: String) -> Result<SchemaExtension> {
    self.within(move |tx| tx.get_extension_by_name(&name)).await
  }

  async fn list_extensions(&self) -> Result<Vec<SchemaExtension>> {
    self.within(|tx| tx.list_extensions()).await
  }

  async fn get_graph_schema(&self, name: String) -> Result<GraphSchema> {
    self
      .within(move |tx| engine::load_graph_schema(tx, &name))
      .await
  }

  async fn get_finding_by_name(&self, name: String) -> Result<RelationshipFinding> {
    self.within(move |tx| tx.get_finding_by_name(&name)).await
  }

  async fn get_remediation(&self, finding_id: i64) -> Result<Remediation> {
    self.within(move |tx| tx.get_remediation(finding_id)).await
  }

  async fn principal_kinds_by_environment(
    &self,
    environment_id: i64,
  ) -> Result<Vec<PrincipalKind>> {
    self
      .within(move |tx| tx.principal_kinds_by_environment(environment_id))
      .await
  }
}
