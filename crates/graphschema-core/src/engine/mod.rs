//! The synchronous reconciliation engine.
//!
//! Everything here runs against repositories bound to a single transaction
//! and performs its store calls strictly in sequence. Callers that hold a
//! [`UnitOfWork`](crate::store::UnitOfWork) use the entry points in
//! [`extension`]; the per-environment and per-finding operations expect the
//! caller to own the transaction.

pub mod environment;
pub mod extension;
pub mod finding;
pub mod read;
pub mod validate;

pub use environment::upsert_environment;
pub use extension::{
  delete_schema_extension, seed_builtin_extension, upsert_graph_extension,
};
pub use finding::{upsert_finding, upsert_remediation};
pub use read::load_graph_schema;

use tracing::warn;

use crate::{Entity, Error, Result, store::ExtensionRepository};

/// Turn a `NotFound` lookup into `None`, passing every other error through.
pub(crate) fn optional<T>(result: Result<T>) -> Result<Option<T>> {
  match result {
    Ok(value) => Ok(Some(value)),
    Err(Error::NotFound { .. }) => Ok(None),
    Err(e) => Err(e),
  }
}

/// Fail unless a row owned by `owner_id` may be replaced on behalf of
/// `extension_id`.
///
/// Environment pairings and finding names are unique platform-wide, so a
/// collision with another extension's row is a duplicate, and one with a
/// built-in extension's row is an attempt to modify that extension.
pub(crate) fn ensure_owned_by<R>(
  repo: &R,
  owner_id: i64,
  extension_id: i64,
  entity: Entity,
  name: &str,
) -> Result<()>
where
  R: ExtensionRepository + ?Sized,
{
  if owner_id == extension_id {
    return Ok(());
  }
  let owner = repo.get_extension_by_id(owner_id)?;
  if owner.is_builtin {
    warn!(
      extension = %owner.name,
      %entity,
      name,
      "refusing to replace a row owned by a built-in graph extension"
    );
    return Err(Error::BuiltInImmutable(owner.name));
  }
  Err(Error::duplicate(entity, name))
}
