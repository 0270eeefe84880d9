//! Transactional storage for Warbler.
//!
//! The store holds four tables (accounts, posts, follow edges, like edges) and
//! enforces the relational constraints a database would: primary keys,
//! not-null and check constraints, uniqueness of account handle and contact,
//! and foreign keys from posts and edges to live rows.
//!
//! All writes happen inside a [`Transaction`]. Constraints that a relational
//! store checks when it flushes (nulls, duplicates, dangling references) are
//! reported by [`Transaction::commit`] as [`StoreError::ConstraintViolation`],
//! and a failed commit leaves the store exactly as it was.
//!
//! # Modules
//!
//! - [`error`]: Error types for store operations
//! - [`traits`]: The [`Store`], [`ReadView`], and [`Transaction`] interfaces
//! - [`tables`]: The table set shared by every in-process backend
//! - [`constraints`]: Commit-time constraint checking
//! - [`memory`]: [`InMemoryStore`], optionally persisted as a JSON snapshot

pub mod constraints;
pub mod error;
pub mod memory;
pub mod tables;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use tables::Tables;
pub use traits::{ReadView, Store, Transaction};
