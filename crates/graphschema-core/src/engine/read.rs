//! Assembling the [`GraphSchema`] read model.

use crate::{
  Result,
  model::{EnvironmentView, FindingView, GraphSchema},
  store::SchemaRepository,
};

use super::optional;

/// Load the extension called `name` with every row it owns.
pub fn load_graph_schema<R>(repo: &R, name: &str) -> Result<GraphSchema>
where
  R: SchemaRepository + ?Sized,
{
  let extension = repo.get_extension_by_name(name)?;

  let environments = repo
    .environments_by_extension(extension.id)?
    .into_iter()
    .map(|environment| {
      let principal_kinds = repo.principal_kinds_by_environment(environment.id)?;
      Ok(EnvironmentView { environment, principal_kinds })
    })
    .collect::<Result<Vec<_>>>()?;

  let findings = repo
    .findings_by_extension(extension.id)?
    .into_iter()
    .map(|finding| {
      let remediation = optional(repo.get_remediation(finding.id))?;
      Ok(FindingView { finding, remediation })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(GraphSchema {
    node_kinds: repo.node_kinds_by_extension(extension.id)?,
    edge_kinds: repo.edge_kinds_by_extension(extension.id)?,
    properties: repo.properties_by_extension(extension.id)?,
    environments,
    findings,
    extension,
  })
}
