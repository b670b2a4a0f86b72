//! Finding and remediation reconciliation.

use tracing::debug;

use crate::{
  Entity, Error, Result,
  input::RemediationInput,
  model::{RelationshipFinding, Remediation},
  store::{
    EnvironmentRepository, ExtensionRepository, FindingRepository,
    KindResolver, RemediationRepository, SourceKindRegistry,
  },
};

use super::{
  ensure_owned_by, environment::resolve_or_register_source_kind, optional,
};

/// Replace the finding called `name`, binding it to the environment for
/// `(environment_kind_name, source_kind_name)` and to the relationship kind.
///
/// An existing finding of the same name is deleted (remediation first) and
/// created again, so the returned finding always carries a new id. The
/// environment must already exist and belong to `extension_id`. A finding
/// name held by another extension is never taken over.
pub fn upsert_finding<R>(
  repo: &R,
  extension_id: i64,
  source_kind_name: &str,
  relationship_kind_name: &str,
  environment_kind_name: &str,
  name: &str,
  display_name: &str,
) -> Result<RelationshipFinding>
where
  R: ExtensionRepository
    + EnvironmentRepository
    + FindingRepository
    + RemediationRepository
    + KindResolver
    + SourceKindRegistry,
{
  let relationship_kind = repo.resolve_kind(relationship_kind_name)?.ok_or_else(|| {
    Error::RelationshipKindNotFound(relationship_kind_name.to_owned())
  })?;

  let environment_kind = repo
    .resolve_kind(environment_kind_name)?
    .ok_or_else(|| Error::EnvironmentKindNotFound(environment_kind_name.to_owned()))?;

  let source_kind = resolve_or_register_source_kind(repo, source_kind_name)?;

  let existing = optional(repo.get_finding_by_name(name))?;
  if let Some(existing) = &existing {
    ensure_owned_by(
      repo,
      existing.schema_extension_id,
      extension_id,
      Entity::Finding,
      name,
    )?;
  }

  let environment = optional(
    repo.get_environment_by_kinds(environment_kind.id, source_kind.id),
  )?
  .filter(|environment| environment.schema_extension_id == extension_id)
  .ok_or_else(|| Error::EnvironmentNotFound {
    environment_kind: environment_kind_name.to_owned(),
    source_kind:      source_kind_name.to_owned(),
  })?;

  if let Some(existing) = existing {
    debug!(finding_id = existing.id, finding = name, "replacing existing finding");
    delete_finding_cascade(repo, &existing)?;
  }

  let finding = repo.create_finding(
    extension_id,
    relationship_kind.id,
    environment.id,
    name,
    display_name,
  )?;

  debug!(finding_id = finding.id, finding = name, extension_id, "finding upserted");
  Ok(finding)
}

/// Update the remediation of `finding_id` in place, or create it when the
/// finding has none yet.
pub fn upsert_remediation<R>(
  repo: &R,
  finding_id: i64,
  input: &RemediationInput,
) -> Result<Remediation>
where
  R: RemediationRepository + ?Sized,
{
  match optional(repo.get_remediation(finding_id))? {
    Some(_) => repo.update_remediation(finding_id, input),
    None => repo.create_remediation(finding_id, input),
  }
}

pub(crate) fn delete_finding_cascade<R>(
  repo: &R,
  finding: &RelationshipFinding,
) -> Result<()>
where
  R: FindingRepository + RemediationRepository + ?Sized,
{
  repo.delete_remediation(finding.id)?;
  repo.delete_finding(finding.id)
}
