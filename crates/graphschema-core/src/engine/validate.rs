//! Structural checks on a [`GraphExtensionInput`], run before any write.

use crate::{Error, Result, input::GraphExtensionInput, reconcile::first_duplicate};

/// Reject inputs that could never reconcile cleanly: a blank extension name,
/// blank member names, or keys repeated within one collection.
pub fn validate_graph_extension(input: &GraphExtensionInput) -> Result<()> {
  if input.extension.name.trim().is_empty() {
    return Err(Error::Validation("graph schema extension name is required".into()));
  }

  require_names("node kind", input.node_kinds.iter().map(|n| n.name.as_str()))?;
  require_names("edge kind", input.edge_kinds.iter().map(|e| e.name.as_str()))?;
  require_names("property", input.properties.iter().map(|p| p.name.as_str()))?;
  require_names("finding", input.findings.iter().map(|f| f.name.as_str()))?;

  if let Some(name) = first_duplicate(&input.node_kinds, |n| n.name.as_str()) {
    return Err(duplicate("node kind", name));
  }
  if let Some(name) = first_duplicate(&input.edge_kinds, |e| e.name.as_str()) {
    return Err(duplicate("edge kind", name));
  }
  if let Some(name) = first_duplicate(&input.properties, |p| p.name.as_str()) {
    return Err(duplicate("property", name));
  }
  if let Some(name) = first_duplicate(&input.findings, |f| f.name.as_str()) {
    return Err(duplicate("finding", name));
  }

  if let Some((environment_kind, source_kind)) =
    first_duplicate(&input.environments, |env| {
      (env.environment_kind_name.as_str(), env.source_kind_name.as_str())
    })
  {
    return Err(Error::Validation(format!(
      "duplicate environment for environment kind '{environment_kind}' and \
       source kind '{source_kind}'"
    )));
  }

  for env in &input.environments {
    if let Some(name) = first_duplicate(&env.principal_kinds, |p| p.as_str()) {
      return Err(Error::Validation(format!(
        "duplicate principal kind '{name}' for environment kind '{}'",
        env.environment_kind_name
      )));
    }
  }

  Ok(())
}

fn require_names<'a>(
  what: &str,
  mut names: impl Iterator<Item = &'a str>,
) -> Result<()> {
  if names.any(|name| name.trim().is_empty()) {
    return Err(Error::Validation(format!("{what} name is required")));
  }
  Ok(())
}

fn duplicate(what: &str, name: &str) -> Error {
  Error::Validation(format!("duplicate {what} name '{name}'"))
}
