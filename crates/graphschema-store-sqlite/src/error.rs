//! Error type for `graphschema-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] graphschema_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

impl Error {
  /// The engine-level error, when there is one.
  pub fn as_core(&self) -> Option<&graphschema_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      Self::Database(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
