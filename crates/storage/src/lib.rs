//! Case store abstraction and implementations for caseforge.
//!
//! This crate provides a trait-based case store interface with a SQLite
//! reference implementation backed by sqlx.

#![warn(missing_docs)]

pub mod seed;
pub mod sqlite_store;
pub mod trait_;

pub use sqlite_store::SqliteCaseStore;
pub use trait_::{CaseStore, Result, StorageError};
