//! Core types and trait definitions for the graph schema extension store.
//!
//! Owns the domain model, the repository and unit-of-work seams, and the
//! synchronous reconciliation engine that brings stored schema state in line
//! with a caller-supplied extension. No database code lives here; storage
//! backends such as `graphschema-store-sqlite` implement the traits in
//! [`store`].

pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod reconcile;
pub mod store;

pub use error::{Entity, Error, Result};
