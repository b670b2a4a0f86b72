//! SQLite backend for the graph schema extension store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on the connection's
//! dedicated thread without blocking the async runtime. Each write runs the
//! synchronous engine from [`graphschema_core::engine`] inside one
//! `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod tx;

pub use error::{Error, Result};
pub use store::SqliteStore;
pub use tx::{SqliteTx, SqliteUnitOfWork};

#[cfg(test)]
mod tests;
