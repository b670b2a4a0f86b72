//! Environment reconciliation.
//!
//! An environment is identified by its `(environment kind, source kind)`
//! pairing. Upserting one never edits fields: the previous environment for
//! the pairing is deleted with everything hanging off it and a new one is
//! created, followed by its complete principal kind set. A pairing held by
//! another extension is never taken over.

use tracing::debug;

use crate::{
  Entity, Error, Result,
  model::{Environment, SourceKind},
  store::{
    EnvironmentRepository, ExtensionRepository, FindingRepository,
    KindResolver, RemediationRepository, SourceKindRegistry,
  },
};

use super::{ensure_owned_by, finding::delete_finding_cascade, optional};

/// Replace the environment for `(environment_kind_name, source_kind_name)`
/// and bind it to `extension_id` with exactly `principal_kind_names` as its
/// principal kinds.
///
/// Environment kinds and principal kinds must already be registered. Source
/// kinds are registered on first use. All names are resolved before the
/// first write. Fails with `BuiltInImmutable` or `DuplicateName` when the
/// pairing belongs to another extension.
pub fn upsert_environment<R>(
  repo: &R,
  extension_id: i64,
  environment_kind_name: &str,
  source_kind_name: &str,
  principal_kind_names: &[String],
) -> Result<Environment>
where
  R: ExtensionRepository
    + EnvironmentRepository
    + FindingRepository
    + RemediationRepository
    + KindResolver
    + SourceKindRegistry,
{
  let environment_kind = repo
    .resolve_kind(environment_kind_name)?
    .ok_or_else(|| Error::EnvironmentKindNotFound(environment_kind_name.to_owned()))?;

  let source_kind = resolve_or_register_source_kind(repo, source_kind_name)?;

  let principal_kind_ids = principal_kind_names
    .iter()
    .map(|name| {
      repo
        .resolve_kind(name)?
        .map(|kind| kind.id)
        .ok_or_else(|| Error::PrincipalKindNotFound(name.clone()))
    })
    .collect::<Result<Vec<_>>>()?;

  if let Some(existing) = optional(
    repo.get_environment_by_kinds(environment_kind.id, source_kind.id),
  )? {
    ensure_owned_by(
      repo,
      existing.schema_extension_id,
      extension_id,
      Entity::Environment,
      &format!("{environment_kind_name}/{source_kind_name}"),
    )?;
    debug!(
      environment_id = existing.id,
      environment_kind = environment_kind_name,
      source_kind = source_kind_name,
      "replacing existing environment"
    );
    delete_environment_cascade(repo, &existing)?;
  }

  let environment =
    repo.create_environment(extension_id, environment_kind.id, source_kind.id)?;

  repo.delete_principal_kinds(environment.id)?;
  for principal_kind in principal_kind_ids {
    repo.create_principal_kind(environment.id, principal_kind)?;
  }

  debug!(
    environment_id = environment.id,
    extension_id,
    principal_kinds = principal_kind_names.len(),
    "environment upserted"
  );
  Ok(environment)
}

/// Resolve a source kind by name, registering it first when it is unknown
/// or inactive.
pub fn resolve_or_register_source_kind<R>(repo: &R, name: &str) -> Result<SourceKind>
where
  R: SourceKindRegistry + ?Sized,
{
  if let Some(source_kind) = repo.resolve_source_kind(name)? {
    return Ok(source_kind);
  }

  debug!(source_kind = name, "registering source kind");
  repo.register_source_kind(name)?;
  repo
    .resolve_source_kind(name)?
    .ok_or_else(|| Error::SourceKindNotFound(name.to_owned()))
}

/// Delete an environment along with its principal kinds and every finding
/// (and remediation) bound to it. Findings of other extensions are never
/// removed this way.
pub(crate) fn delete_environment_cascade<R>(
  repo: &R,
  environment: &Environment,
) -> Result<()>
where
  R: ExtensionRepository
    + EnvironmentRepository
    + FindingRepository
    + RemediationRepository
    + ?Sized,
{
  let findings = repo.findings_by_environment(environment.id)?;
  for finding in &findings {
    ensure_owned_by(
      repo,
      finding.schema_extension_id,
      environment.schema_extension_id,
      Entity::Finding,
      &finding.name,
    )?;
  }
  for finding in &findings {
    delete_finding_cascade(repo, finding)?;
  }
  repo.delete_principal_kinds(environment.id)?;
  repo.delete_environment(environment.id)
}
