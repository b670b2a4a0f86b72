//! Whole-extension operations: upsert, seeding and deletion.
//!
//! Each entry point opens its own root transaction from a [`UnitOfWork`].
//! The `_in` variants run inside a transaction the caller already holds; the
//! upsert nests a scope, and a failed nested scope fails its parent too.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  input::GraphExtensionInput,
  model::SchemaExtension,
  reconcile::{diff, reconcile},
  store::{
    EdgeKindRepository, ExtensionRepository, NodeKindRepository,
    PropertyRepository, SchemaRepository, SchemaTransaction, UnitOfWork,
  },
};

use super::{
  environment::{delete_environment_cascade, upsert_environment},
  finding::{delete_finding_cascade, upsert_finding, upsert_remediation},
  optional,
  validate::validate_graph_extension,
};

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// Make the stored extension named by `input` match `input`, atomically.
///
/// Returns `true` when the extension already existed and `false` when it was
/// created. On error nothing is written.
pub fn upsert_graph_extension<U>(uow: &mut U, input: &GraphExtensionInput) -> Result<bool>
where
  U: UnitOfWork,
{
  let mut tx = uow.begin()?;
  let existed = upsert_graph_extension_in(&mut tx, input)?;
  tx.commit()?;

  info!(
    extension = %input.extension.name,
    existed,
    node_kinds = input.node_kinds.len(),
    edge_kinds = input.edge_kinds.len(),
    properties = input.properties.len(),
    environments = input.environments.len(),
    findings = input.findings.len(),
    "graph extension upserted"
  );
  Ok(existed)
}

/// [`upsert_graph_extension`] inside a caller-owned transaction.
pub fn upsert_graph_extension_in<T>(tx: &mut T, input: &GraphExtensionInput) -> Result<bool>
where
  T: SchemaTransaction,
{
  let scope = tx.nested()?;
  let existed = apply_graph_extension(&scope, input)?;
  scope.commit()?;
  Ok(existed)
}

fn apply_graph_extension<R>(repo: &R, input: &GraphExtensionInput) -> Result<bool>
where
  R: SchemaRepository,
{
  let name = input.extension.name.as_str();
  let existing = optional(repo.get_extension_by_name(name))?;
  if existing.as_ref().is_some_and(|existing| existing.is_builtin) {
    warn!(extension = name, "refusing to modify built-in graph extension");
    return Err(Error::BuiltInImmutable(name.to_owned()));
  }

  validate_graph_extension(input)?;

  let (extension, existed) = match existing {
    None => {
      debug!(extension = name, "creating graph extension");
      (repo.create_extension(&input.extension, false)?, false)
    }
    Some(existing) => {
      debug!(extension = name, extension_id = existing.id, "updating graph extension");
      let updated = SchemaExtension {
        display_name: input.extension.display_name.clone(),
        version: input.extension.version.clone(),
        namespace: input.extension.namespace.clone(),
        ..existing
      };
      (repo.update_extension(&updated)?, true)
    }
  };
  let extension_id = extension.id;

  if existed {
    remove_stale_findings(repo, extension_id, input)?;
    remove_stale_environments(repo, extension_id, input)?;
  }

  let existing_node_kinds = repo.node_kinds_by_extension(extension_id)?;
  let node_kinds = reconcile(
    &input.node_kinds,
    &existing_node_kinds,
    |desired| desired.name.as_str(),
    |stored| stored.name.as_str(),
    |stale| repo.delete_node_kind(stale.id),
    |desired| repo.create_node_kind(extension_id, desired),
  )?;

  let existing_edge_kinds = repo.edge_kinds_by_extension(extension_id)?;
  let edge_kinds = reconcile(
    &input.edge_kinds,
    &existing_edge_kinds,
    |desired| desired.name.as_str(),
    |stored| stored.name.as_str(),
    |stale| repo.delete_edge_kind(stale.id),
    |desired| repo.create_edge_kind(extension_id, desired),
  )?;

  let existing_properties = repo.properties_by_extension(extension_id)?;
  let properties = reconcile(
    &input.properties,
    &existing_properties,
    |desired| desired.name.as_str(),
    |stored| stored.name.as_str(),
    |stale| repo.delete_property(stale.id),
    |desired| repo.create_property(extension_id, desired),
  )?;

  debug!(
    extension_id,
    node_kinds = node_kinds.len(),
    edge_kinds = edge_kinds.len(),
    properties = properties.len(),
    "kinds and properties reconciled"
  );

  for env in &input.environments {
    upsert_environment(
      repo,
      extension_id,
      &env.environment_kind_name,
      &env.source_kind_name,
      &env.principal_kinds,
    )?;
  }

  for finding in &input.findings {
    let stored = upsert_finding(
      repo,
      extension_id,
      &finding.source_kind_name,
      &finding.relationship_kind_name,
      &finding.environment_kind_name,
      &finding.name,
      &finding.display_name,
    )?;
    upsert_remediation(repo, stored.id, &finding.remediation)?;
  }

  Ok(existed)
}

/// Delete the extension's findings whose names are no longer desired.
fn remove_stale_findings<R>(
  repo: &R,
  extension_id: i64,
  input: &GraphExtensionInput,
) -> Result<()>
where
  R: SchemaRepository,
{
  let existing = repo.findings_by_extension(extension_id)?;
  let plan = diff(
    &input.findings,
    &existing,
    |desired| desired.name.as_str(),
    |stored| stored.name.as_str(),
  );
  for stale in plan.stale {
    debug!(finding = %stale.name, "removing stale finding");
    delete_finding_cascade(repo, stale)?;
  }
  Ok(())
}

/// Delete the extension's environments whose pairing is no longer desired.
///
/// Desired pairings are resolved without registering anything: a pairing
/// that names an unknown kind cannot match a stored environment, and the
/// later environment upsert reports it properly.
fn remove_stale_environments<R>(
  repo: &R,
  extension_id: i64,
  input: &GraphExtensionInput,
) -> Result<()>
where
  R: SchemaRepository,
{
  let desired = input
    .environments
    .iter()
    .map(|env| {
      let environment_kind = repo.resolve_kind(&env.environment_kind_name)?;
      let source_kind = repo.resolve_source_kind(&env.source_kind_name)?;
      Ok(environment_kind.zip(source_kind).map(|(e, s)| (e.id, s.id)))
    })
    .collect::<Result<Vec<_>>>()?;

  let existing = repo.environments_by_extension(extension_id)?;
  let plan = diff(
    &desired,
    &existing,
    |key| *key,
    |stored| Some((stored.environment_kind_id, stored.source_kind_id)),
  );
  for stale in plan.stale {
    debug!(environment_id = stale.id, "removing stale environment");
    delete_environment_cascade(repo, stale)?;
  }
  Ok(())
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// Install `input` as a built-in extension unless its name is already taken.
///
/// Returns `false`, writing nothing, when an extension with the name exists.
pub fn seed_builtin_extension<U>(uow: &mut U, input: &GraphExtensionInput) -> Result<bool>
where
  U: UnitOfWork,
{
  validate_graph_extension(input)?;

  let tx = uow.begin()?;
  let name = input.extension.name.as_str();
  if optional(tx.get_extension_by_name(name))?.is_some() {
    debug!(extension = name, "built-in extension already present");
    tx.rollback()?;
    return Ok(false);
  }

  let extension = tx.create_extension(&input.extension, true)?;
  for node_kind in &input.node_kinds {
    tx.create_node_kind(extension.id, node_kind)?;
  }
  for edge_kind in &input.edge_kinds {
    tx.create_edge_kind(extension.id, edge_kind)?;
  }
  for property in &input.properties {
    tx.create_property(extension.id, property)?;
  }
  for env in &input.environments {
    upsert_environment(
      &tx,
      extension.id,
      &env.environment_kind_name,
      &env.source_kind_name,
      &env.principal_kinds,
    )?;
  }
  for finding in &input.findings {
    let stored = upsert_finding(
      &tx,
      extension.id,
      &finding.source_kind_name,
      &finding.relationship_kind_name,
      &finding.environment_kind_name,
      &finding.name,
      &finding.display_name,
    )?;
    upsert_remediation(&tx, stored.id, &finding.remediation)?;
  }
  tx.commit()?;

  info!(extension = name, extension_id = extension.id, "built-in extension seeded");
  Ok(true)
}

// ─── Deletion ────────────────────────────────────────────────────────────────

/// Remove an extension and every row that references it.
///
/// Built-in extensions cannot be deleted.
pub fn delete_schema_extension<U>(uow: &mut U, extension_id: i64) -> Result<()>
where
  U: UnitOfWork,
{
  let tx = uow.begin()?;
  delete_schema_extension_in(&tx, extension_id)?;
  tx.commit()?;
  info!(extension_id, "graph extension deleted");
  Ok(())
}

/// [`delete_schema_extension`] inside a caller-owned transaction.
pub fn delete_schema_extension_in<R>(repo: &R, extension_id: i64) -> Result<()>
where
  R: SchemaRepository,
{
  mutable_extension(repo, extension_id)?;

  for finding in repo.findings_by_extension(extension_id)? {
    delete_finding_cascade(repo, &finding)?;
  }
  for environment in repo.environments_by_extension(extension_id)? {
    delete_environment_cascade(repo, &environment)?;
  }
  for property in repo.properties_by_extension(extension_id)? {
    repo.delete_property(property.id)?;
  }
  for edge_kind in repo.edge_kinds_by_extension(extension_id)? {
    repo.delete_edge_kind(edge_kind.id)?;
  }
  for node_kind in repo.node_kinds_by_extension(extension_id)? {
    repo.delete_node_kind(node_kind.id)?;
  }
  repo.delete_extension(extension_id)
}

/// Load an extension that callers are allowed to change.
///
/// Fails with `BuiltInImmutable` for built-in extensions.
pub fn mutable_extension<R>(repo: &R, extension_id: i64) -> Result<SchemaExtension>
where
  R: ExtensionRepository + ?Sized,
{
  let extension = repo.get_extension_by_id(extension_id)?;
  if extension.is_builtin {
    warn!(extension = %extension.name, "refusing to modify built-in graph extension");
    return Err(Error::BuiltInImmutable(extension.name));
  }
  Ok(extension)
}
