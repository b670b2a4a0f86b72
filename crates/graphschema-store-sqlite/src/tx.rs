//! [`SqliteTx`]: the repositories of `graphschema-core`, bound to one open
//! SQLite transaction or savepoint.
//!
//! These types are synchronous and borrow a `rusqlite::Connection`; they are
//! meant to be driven from inside `tokio_rusqlite::Connection::call`, which
//! is exactly what [`SqliteStore`](crate::SqliteStore) does.

use std::{cell::Cell, ops::Deref};

use chrono::Utc;
use graphschema_core::{
  Entity, Error, Result,
  input::{
    EdgeKindInput, ExtensionInput, NodeKindInput, PropertyInput,
    RemediationInput,
  },
  model::{
    EdgeKind, Environment, Kind, NodeKind, PrincipalKind, Property,
    RelationshipFinding, Remediation, SchemaExtension, SourceKind,
  },
  store::{
    EdgeKindRepository, EnvironmentRepository, ExtensionRepository,
    FindingRepository, KindResolver, NodeKindRepository, PropertyRepository,
    RemediationRepository, SchemaTransaction, SourceKindRegistry, UnitOfWork,
  },
};
use rusqlite::{
  Connection, OptionalExtension as _, Row, Savepoint, Transaction,
  TransactionBehavior, ffi, params,
};

use crate::encode::{
  EDGE_KIND_COLUMNS, ENVIRONMENT_COLUMNS, EXTENSION_COLUMNS, FINDING_COLUMNS,
  NODE_KIND_COLUMNS, PROPERTY_COLUMNS, REMEDIATION_COLUMNS, RawEdgeKind,
  RawEnvironment, RawExtension, RawFinding, RawNodeKind, RawProperty,
  RawRemediation, encode_dt, kind_from_row, principal_kind_from_row,
  source_kind_from_row,
};

// ─── Error mapping ───────────────────────────────────────────────────────────

fn store_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
  move |e| Error::store(context, e)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Unique violations become `DuplicateName`; anything else is a store error.
fn insert_err(
  entity: Entity,
  name: impl Into<String>,
  context: &'static str,
) -> impl FnOnce(rusqlite::Error) -> Error {
  let name = name.into();
  move |e| {
    if is_unique_violation(&e) {
      Error::duplicate(entity, name)
    } else {
      Error::store(context, e)
    }
  }
}

/// An empty result becomes `NotFound`; anything else is a store error.
fn lookup_err(
  entity: Entity,
  key: impl ToString,
  context: &'static str,
) -> impl FnOnce(rusqlite::Error) -> Error {
  let key = key.to_string();
  move |e| match e {
    rusqlite::Error::QueryReturnedNoRows => Error::not_found(entity, key),
    e => Error::store(context, e),
  }
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Opens `BEGIN IMMEDIATE` transactions on a borrowed connection.
pub struct SqliteUnitOfWork<'c> {
  conn: &'c mut Connection,
}

impl<'c> SqliteUnitOfWork<'c> {
  pub fn new(conn: &'c mut Connection) -> Self { Self { conn } }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
  type Transaction<'a>
    = SqliteTx<'a>
  where
    Self: 'a;

  fn begin(&mut self) -> Result<SqliteTx<'_>> {
    let tx = self
      .conn
      .transaction_with_behavior(TransactionBehavior::Immediate)
      .map_err(store_err("error beginning transaction"))?;
    Ok(SqliteTx::new(Scope::Root(tx), None))
  }
}

/// Run `f` inside one root transaction on `conn`, committing on success and
/// rolling back on error.
pub fn run_in_transaction<T>(
  conn: &mut Connection,
  f: impl FnOnce(&SqliteTx<'_>) -> Result<T>,
) -> Result<T> {
  let mut uow = SqliteUnitOfWork::new(conn);
  let tx = uow.begin()?;
  let value = f(&tx)?;
  tx.commit()?;
  Ok(value)
}

// ─── Transaction scope ───────────────────────────────────────────────────────

enum Scope<'c> {
  Root(Transaction<'c>),
  Nested(Savepoint<'c>),
}

impl Deref for Scope<'_> {
  type Target = Connection;

  fn deref(&self) -> &Connection {
    match self {
      Self::Root(tx) => &**tx,
      Self::Nested(sp) => &**sp,
    }
  }
}

/// Marks the parent scope failed when dropped, unless released by a
/// successful commit.
struct ParentLink<'c>(Option<&'c Cell<bool>>);

impl ParentLink<'_> {
  fn release(mut self) { self.0 = None; }
}

impl Drop for ParentLink<'_> {
  fn drop(&mut self) {
    if let Some(parent) = self.0 {
      parent.set(true);
    }
  }
}

/// One open transaction scope. Dropping it uncommitted rolls it back.
///
/// A nested scope that is rolled back, or dropped without committing, fails
/// its parent: the parent's `commit` then rolls back and returns an error.
pub struct SqliteTx<'c> {
  scope:  Scope<'c>,
  failed: Cell<bool>,
  parent: ParentLink<'c>,
}

impl<'c> SqliteTx<'c> {
  fn new(scope: Scope<'c>, parent: Option<&'c Cell<bool>>) -> Self {
    Self { scope, failed: Cell::new(false), parent: ParentLink(parent) }
  }
}

fn rollback_scope(scope: Scope<'_>) -> Result<()> {
  match scope {
    Scope::Root(tx) => tx.rollback(),
    Scope::Nested(mut sp) => sp.rollback(),
  }
  .map_err(store_err("error rolling back transaction"))
}

impl SchemaTransaction for SqliteTx<'_> {
  type Nested<'a>
    = SqliteTx<'a>
  where
    Self: 'a;

  fn nested(&mut self) -> Result<SqliteTx<'_>> {
    let Self { scope, failed, .. } = self;
    let savepoint = match scope {
      Scope::Root(tx) => tx.savepoint(),
      Scope::Nested(sp) => sp.savepoint(),
    }
    .map_err(store_err("error opening nested transaction scope"))?;
    Ok(SqliteTx::new(Scope::Nested(savepoint), Some(&*failed)))
  }

  fn commit(self) -> Result<()> {
    let Self { scope, failed, parent } = self;
    if failed.get() {
      rollback_scope(scope)?;
      return Err(Error::store(
        "error committing transaction",
        "a nested transaction scope failed",
      ));
    }
    match scope {
      Scope::Root(tx) => tx.commit(),
      Scope::Nested(sp) => sp.commit(),
    }
    .map_err(store_err("error committing transaction"))?;
    parent.release();
    Ok(())
  }

  fn rollback(self) -> Result<()> { rollback_scope(self.scope) }
}

impl SqliteTx<'_> {
  fn conn(&self) -> &Connection { &self.scope }

  fn list<R, T>(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
    decode: fn(R) -> Result<T>,
    context: &'static str,
  ) -> Result<Vec<T>> {
    let mut stmt = self.conn().prepare(sql).map_err(store_err(context))?;
    let raws = stmt
      .query_map(params, read)
      .map_err(store_err(context))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(store_err(context))?;
    raws.into_iter().map(decode).collect()
  }

  /// Delete by surrogate id, reporting `NotFound` when nothing matched.
  fn delete_by_id(
    &self,
    sql: &str,
    id: i64,
    entity: Entity,
    context: &'static str,
  ) -> Result<()> {
    let deleted = self.conn().execute(sql, [id]).map_err(store_err(context))?;
    if deleted == 0 {
      return Err(Error::not_found(entity, id));
    }
    Ok(())
  }
}

// ─── Extensions ──────────────────────────────────────────────────────────────

impl ExtensionRepository for SqliteTx<'_> {
  fn create_extension(
    &self,
    input: &ExtensionInput,
    is_builtin: bool,
  ) -> Result<SchemaExtension> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_extensions
             (name, display_name, version, namespace, is_builtin, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
           RETURNING {EXTENSION_COLUMNS}"
        ),
        params![
          input.name,
          input.display_name,
          input.version,
          input.namespace,
          is_builtin,
          now
        ],
        RawExtension::from_row,
      )
      .map_err(insert_err(
        Entity::Extension,
        &input.name,
        "error creating graph schema extension",
      ))?
      .into_extension()
  }

  fn get_extension_by_id(&self, id: i64) -> Result<SchemaExtension> {
    self
      .conn()
      .query_row(
        &format!("SELECT {EXTENSION_COLUMNS} FROM schema_extensions WHERE id = ?1"),
        [id],
        RawExtension::from_row,
      )
      .map_err(lookup_err(
        Entity::Extension,
        id,
        "error getting graph schema extension",
      ))?
      .into_extension()
  }

  fn get_extension_by_name(&self, name: &str) -> Result<SchemaExtension> {
    self
      .conn()
      .query_row(
        &format!("SELECT {EXTENSION_COLUMNS} FROM schema_extensions WHERE name = ?1"),
        [name],
        RawExtension::from_row,
      )
      .map_err(lookup_err(
        Entity::Extension,
        name,
        "error getting graph schema extension",
      ))?
      .into_extension()
  }

  fn list_extensions(&self) -> Result<Vec<SchemaExtension>> {
    self.list(
      &format!("SELECT {EXTENSION_COLUMNS} FROM schema_extensions ORDER BY name"),
      [],
      RawExtension::from_row,
      RawExtension::into_extension,
      "error listing graph schema extensions",
    )
  }

  fn update_extension(&self, extension: &SchemaExtension) -> Result<SchemaExtension> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "UPDATE schema_extensions
              SET display_name = ?2, version = ?3, namespace = ?4, updated_at = ?5
            WHERE id = ?1
           RETURNING {EXTENSION_COLUMNS}"
        ),
        params![
          extension.id,
          extension.display_name,
          extension.version,
          extension.namespace,
          now
        ],
        RawExtension::from_row,
      )
      .map_err(lookup_err(
        Entity::Extension,
        extension.id,
        "error updating graph schema extension",
      ))?
      .into_extension()
  }

  fn delete_extension(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_extensions WHERE id = ?1",
      id,
      Entity::Extension,
      "error deleting graph schema extension",
    )
  }
}

// ─── Node kinds ──────────────────────────────────────────────────────────────

impl NodeKindRepository for SqliteTx<'_> {
  fn create_node_kind(
    &self,
    extension_id: i64,
    input: &NodeKindInput,
  ) -> Result<NodeKind> {
    self.register_kind(&input.name)?;

    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_node_kinds
             (schema_extension_id, name, display_name, description,
              is_display_kind, icon, icon_color, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
           RETURNING {NODE_KIND_COLUMNS}"
        ),
        params![
          extension_id,
          input.name,
          input.display_name,
          input.description,
          input.is_display_kind,
          input.icon,
          input.icon_color,
          now
        ],
        RawNodeKind::from_row,
      )
      .map_err(insert_err(
        Entity::NodeKind,
        &input.name,
        "error creating schema node kind",
      ))?
      .into_node_kind()
  }

  fn get_node_kind_by_id(&self, id: i64) -> Result<NodeKind> {
    self
      .conn()
      .query_row(
        &format!("SELECT {NODE_KIND_COLUMNS} FROM schema_node_kinds WHERE id = ?1"),
        [id],
        RawNodeKind::from_row,
      )
      .map_err(lookup_err(Entity::NodeKind, id, "error getting schema node kind"))?
      .into_node_kind()
  }

  fn node_kinds_by_extension(&self, extension_id: i64) -> Result<Vec<NodeKind>> {
    self.list(
      &format!(
        "SELECT {NODE_KIND_COLUMNS} FROM schema_node_kinds
          WHERE schema_extension_id = ?1 ORDER BY id"
      ),
      [extension_id],
      RawNodeKind::from_row,
      RawNodeKind::into_node_kind,
      "error listing schema node kinds",
    )
  }

  fn delete_node_kind(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_node_kinds WHERE id = ?1",
      id,
      Entity::NodeKind,
      "error deleting schema node kind",
    )
  }
}

// ─── Relationship kinds ──────────────────────────────────────────────────────

impl EdgeKindRepository for SqliteTx<'_> {
  fn create_edge_kind(
    &self,
    extension_id: i64,
    input: &EdgeKindInput,
  ) -> Result<EdgeKind> {
    self.register_kind(&input.name)?;

    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_relationship_kinds
             (schema_extension_id, name, description, is_traversable,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           RETURNING {EDGE_KIND_COLUMNS}"
        ),
        params![
          extension_id,
          input.name,
          input.description,
          input.is_traversable,
          now
        ],
        RawEdgeKind::from_row,
      )
      .map_err(insert_err(
        Entity::EdgeKind,
        &input.name,
        "error creating schema relationship kind",
      ))?
      .into_edge_kind()
  }

  fn get_edge_kind_by_id(&self, id: i64) -> Result<EdgeKind> {
    self
      .conn()
      .query_row(
        &format!(
          "SELECT {EDGE_KIND_COLUMNS} FROM schema_relationship_kinds WHERE id = ?1"
        ),
        [id],
        RawEdgeKind::from_row,
      )
      .map_err(lookup_err(
        Entity::EdgeKind,
        id,
        "error getting schema relationship kind",
      ))?
      .into_edge_kind()
  }

  fn edge_kinds_by_extension(&self, extension_id: i64) -> Result<Vec<EdgeKind>> {
    self.list(
      &format!(
        "SELECT {EDGE_KIND_COLUMNS} FROM schema_relationship_kinds
          WHERE schema_extension_id = ?1 ORDER BY id"
      ),
      [extension_id],
      RawEdgeKind::from_row,
      RawEdgeKind::into_edge_kind,
      "error listing schema relationship kinds",
    )
  }

  fn delete_edge_kind(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_relationship_kinds WHERE id = ?1",
      id,
      Entity::EdgeKind,
      "error deleting schema relationship kind",
    )
  }
}

// ─── Properties ──────────────────────────────────────────────────────────────

impl PropertyRepository for SqliteTx<'_> {
  fn create_property(
    &self,
    extension_id: i64,
    input: &PropertyInput,
  ) -> Result<Property> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_properties
             (schema_extension_id, name, display_name, data_type, description,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
           RETURNING {PROPERTY_COLUMNS}"
        ),
        params![
          extension_id,
          input.name,
          input.display_name,
          input.data_type,
          input.description,
          now
        ],
        RawProperty::from_row,
      )
      .map_err(insert_err(
        Entity::Property,
        &input.name,
        "error creating schema property",
      ))?
      .into_property()
  }

  fn get_property_by_id(&self, id: i64) -> Result<Property> {
    self
      .conn()
      .query_row(
        &format!("SELECT {PROPERTY_COLUMNS} FROM schema_properties WHERE id = ?1"),
        [id],
        RawProperty::from_row,
      )
      .map_err(lookup_err(Entity::Property, id, "error getting schema property"))?
      .into_property()
  }

  fn properties_by_extension(&self, extension_id: i64) -> Result<Vec<Property>> {
    self.list(
      &format!(
        "SELECT {PROPERTY_COLUMNS} FROM schema_properties
          WHERE schema_extension_id = ?1 ORDER BY id"
      ),
      [extension_id],
      RawProperty::from_row,
      RawProperty::into_property,
      "error listing schema properties",
    )
  }

  fn delete_property(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_properties WHERE id = ?1",
      id,
      Entity::Property,
      "error deleting schema property",
    )
  }
}

// ─── Environments ────────────────────────────────────────────────────────────

impl EnvironmentRepository for SqliteTx<'_> {
  fn create_environment(
    &self,
    extension_id: i64,
    environment_kind_id: i64,
    source_kind_id: i64,
  ) -> Result<Environment> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_environments
             (schema_extension_id, environment_kind_id, source_kind_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           RETURNING {ENVIRONMENT_COLUMNS}"
        ),
        params![extension_id, environment_kind_id, source_kind_id, now],
        RawEnvironment::from_row,
      )
      .map_err(insert_err(
        Entity::Environment,
        format!("({environment_kind_id}, {source_kind_id})"),
        "error creating schema environment",
      ))?
      .into_environment()
  }

  fn get_environment_by_id(&self, id: i64) -> Result<Environment> {
    self
      .conn()
      .query_row(
        &format!("SELECT {ENVIRONMENT_COLUMNS} FROM schema_environments WHERE id = ?1"),
        [id],
        RawEnvironment::from_row,
      )
      .map_err(lookup_err(
        Entity::Environment,
        id,
        "error getting schema environment",
      ))?
      .into_environment()
  }

  fn get_environment_by_kinds(
    &self,
    environment_kind_id: i64,
    source_kind_id: i64,
  ) -> Result<Environment> {
    self
      .conn()
      .query_row(
        &format!(
          "SELECT {ENVIRONMENT_COLUMNS} FROM schema_environments
            WHERE environment_kind_id = ?1 AND source_kind_id = ?2"
        ),
        [environment_kind_id, source_kind_id],
        RawEnvironment::from_row,
      )
      .map_err(lookup_err(
        Entity::Environment,
        format!("({environment_kind_id}, {source_kind_id})"),
        "error getting schema environment",
      ))?
      .into_environment()
  }

  fn environments_by_extension(&self, extension_id: i64) -> Result<Vec<Environment>> {
    self.list(
      &format!(
        "SELECT {ENVIRONMENT_COLUMNS} FROM schema_environments
          WHERE schema_extension_id = ?1 ORDER BY id"
      ),
      [extension_id],
      RawEnvironment::from_row,
      RawEnvironment::into_environment,
      "error listing schema environments",
    )
  }

  fn delete_environment(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_environments WHERE id = ?1",
      id,
      Entity::Environment,
      "error deleting schema environment",
    )
  }

  fn create_principal_kind(
    &self,
    environment_id: i64,
    principal_kind: i64,
  ) -> Result<PrincipalKind> {
    self
      .conn()
      .execute(
        "INSERT INTO schema_environment_principal_kinds (environment_id, principal_kind)
         VALUES (?1, ?2)",
        [environment_id, principal_kind],
      )
      .map_err(insert_err(
        Entity::PrincipalKind,
        format!("({environment_id}, {principal_kind})"),
        "error creating schema environment principal kind",
      ))?;
    Ok(PrincipalKind { environment_id, principal_kind })
  }

  fn principal_kinds_by_environment(
    &self,
    environment_id: i64,
  ) -> Result<Vec<PrincipalKind>> {
    self.list(
      "SELECT environment_id, principal_kind FROM schema_environment_principal_kinds
        WHERE environment_id = ?1 ORDER BY principal_kind",
      [environment_id],
      principal_kind_from_row,
      Ok,
      "error listing schema environment principal kinds",
    )
  }

  fn delete_principal_kinds(&self, environment_id: i64) -> Result<()> {
    self
      .conn()
      .execute(
        "DELETE FROM schema_environment_principal_kinds WHERE environment_id = ?1",
        [environment_id],
      )
      .map_err(store_err("error deleting schema environment principal kinds"))?;
    Ok(())
  }
}

// ─── Findings ────────────────────────────────────────────────────────────────

impl FindingRepository for SqliteTx<'_> {
  fn create_finding(
    &self,
    extension_id: i64,
    relationship_kind_id: i64,
    environment_id: i64,
    name: &str,
    display_name: &str,
  ) -> Result<RelationshipFinding> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_relationship_findings
             (schema_extension_id, relationship_kind_id, environment_id, name,
              display_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           RETURNING {FINDING_COLUMNS}"
        ),
        params![
          extension_id,
          relationship_kind_id,
          environment_id,
          name,
          display_name,
          now
        ],
        RawFinding::from_row,
      )
      .map_err(insert_err(
        Entity::Finding,
        name,
        "error creating schema relationship finding",
      ))?
      .into_finding()
  }

  fn get_finding_by_id(&self, id: i64) -> Result<RelationshipFinding> {
    self
      .conn()
      .query_row(
        &format!(
          "SELECT {FINDING_COLUMNS} FROM schema_relationship_findings WHERE id = ?1"
        ),
        [id],
        RawFinding::from_row,
      )
      .map_err(lookup_err(
        Entity::Finding,
        id,
        "error getting schema relationship finding",
      ))?
      .into_finding()
  }

  fn get_finding_by_name(&self, name: &str) -> Result<RelationshipFinding> {
    self
      .conn()
      .query_row(
        &format!(
          "SELECT {FINDING_COLUMNS} FROM schema_relationship_findings WHERE name = ?1"
        ),
        [name],
        RawFinding::from_row,
      )
      .map_err(lookup_err(
        Entity::Finding,
        name,
        "error getting schema relationship finding",
      ))?
      .into_finding()
  }

  fn findings_by_extension(
    &self,
    extension_id: i64,
  ) -> Result<Vec<RelationshipFinding>> {
    self.list(
      &format!(
        "SELECT {FINDING_COLUMNS} FROM schema_relationship_findings
          WHERE schema_extension_id = ?1 ORDER BY id"
      ),
      [extension_id],
      RawFinding::from_row,
      RawFinding::into_finding,
      "error listing schema relationship findings",
    )
  }

  fn findings_by_environment(
    &self,
    environment_id: i64,
  ) -> Result<Vec<RelationshipFinding>> {
    self.list(
      &format!(
        "SELECT {FINDING_COLUMNS} FROM schema_relationship_findings
          WHERE environment_id = ?1 ORDER BY id"
      ),
      [environment_id],
      RawFinding::from_row,
      RawFinding::into_finding,
      "error listing schema relationship findings",
    )
  }

  fn delete_finding(&self, id: i64) -> Result<()> {
    self.delete_by_id(
      "DELETE FROM schema_relationship_findings WHERE id = ?1",
      id,
      Entity::Finding,
      "error deleting schema relationship finding",
    )
  }
}

// ─── Remediations ────────────────────────────────────────────────────────────

impl RemediationRepository for SqliteTx<'_> {
  fn create_remediation(
    &self,
    finding_id: i64,
    input: &RemediationInput,
  ) -> Result<Remediation> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "INSERT INTO schema_remediations
             (finding_id, short_description, long_description,
              short_remediation, long_remediation, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           RETURNING {REMEDIATION_COLUMNS}"
        ),
        params![
          finding_id,
          input.short_description,
          input.long_description,
          input.short_remediation,
          input.long_remediation,
          now
        ],
        RawRemediation::from_row,
      )
      .map_err(insert_err(
        Entity::Remediation,
        finding_id.to_string(),
        "error creating schema remediation",
      ))?
      .into_remediation()
  }

  fn get_remediation(&self, finding_id: i64) -> Result<Remediation> {
    self
      .conn()
      .query_row(
        &format!(
          "SELECT {REMEDIATION_COLUMNS} FROM schema_remediations WHERE finding_id = ?1"
        ),
        [finding_id],
        RawRemediation::from_row,
      )
      .map_err(lookup_err(
        Entity::Remediation,
        finding_id,
        "error getting schema remediation",
      ))?
      .into_remediation()
  }

  fn update_remediation(
    &self,
    finding_id: i64,
    input: &RemediationInput,
  ) -> Result<Remediation> {
    let now = encode_dt(Utc::now());
    self
      .conn()
      .query_row(
        &format!(
          "UPDATE schema_remediations
              SET short_description = ?2, long_description = ?3,
                  short_remediation = ?4, long_remediation = ?5, updated_at = ?6
            WHERE finding_id = ?1
           RETURNING {REMEDIATION_COLUMNS}"
        ),
        params![
          finding_id,
          input.short_description,
          input.long_description,
          input.short_remediation,
          input.long_remediation,
          now
        ],
        RawRemediation::from_row,
      )
      .map_err(lookup_err(
        Entity::Remediation,
        finding_id,
        "error updating schema remediation",
      ))?
      .into_remediation()
  }

  fn delete_remediation(&self, finding_id: i64) -> Result<()> {
    self
      .conn()
      .execute(
        "DELETE FROM schema_remediations WHERE finding_id = ?1",
        [finding_id],
      )
      .map_err(store_err("error deleting schema remediation"))?;
    Ok(())
  }
}

// ─── Kind tables ─────────────────────────────────────────────────────────────

impl KindResolver for SqliteTx<'_> {
  fn resolve_kind(&self, name: &str) -> Result<Option<Kind>> {
    self
      .conn()
      .query_row("SELECT id, name FROM kinds WHERE name = ?1", [name], kind_from_row)
      .optional()
      .map_err(store_err("error resolving kind"))
  }

  fn register_kind(&self, name: &str) -> Result<Kind> {
    self
      .conn()
      .execute(
        "INSERT INTO kinds (name) VALUES (?1) ON CONFLICT (name) DO NOTHING",
        [name],
      )
      .map_err(store_err("error registering kind"))?;
    self
      .resolve_kind(name)?
      .ok_or_else(|| Error::not_found(Entity::Kind, name))
  }

  fn get_kind_by_id(&self, id: i64) -> Result<Kind> {
    self
      .conn()
      .query_row("SELECT id, name FROM kinds WHERE id = ?1", [id], kind_from_row)
      .map_err(lookup_err(Entity::Kind, id, "error getting kind"))
  }
}

impl SourceKindRegistry for SqliteTx<'_> {
  fn resolve_source_kind(&self, name: &str) -> Result<Option<SourceKind>> {
    self
      .conn()
      .query_row(
        "SELECT id, name, active FROM source_kinds WHERE name = ?1 AND active = 1",
        [name],
        source_kind_from_row,
      )
      .optional()
      .map_err(store_err("error resolving source kind"))
  }

  fn register_source_kind(&self, name: &str) -> Result<SourceKind> {
    self
      .conn()
      .query_row(
        "INSERT INTO source_kinds (name, active) VALUES (?1, 1)
         ON CONFLICT (name) DO UPDATE SET active = 1
         RETURNING id, name, active",
        [name],
        source_kind_from_row,
      )
      .map_err(store_err("error registering source kind"))
  }

  fn get_source_kind_by_id(&self, id: i64) -> Result<SourceKind> {
    self
      .conn()
      .query_row(
        "SELECT id, name, active FROM source_kinds WHERE id = ?1",
        [id],
        source_kind_from_row,
      )
      .map_err(lookup_err(Entity::SourceKind, id, "error getting source kind"))
  }

  fn deactivate_source_kind(&self, name: &str) -> Result<()> {
    let updated = self
      .conn()
      .execute("UPDATE source_kinds SET active = 0 WHERE name = ?1", [name])
      .map_err(store_err("error deactivating source kind"))?;
    if updated == 0 {
      return Err(Error::not_found(Entity::SourceKind, name));
    }
    Ok(())
  }
}
