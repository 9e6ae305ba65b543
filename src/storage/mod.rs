//! Variable store layer.
//!
//! The reconciliation engine talks to the [`VariableStore`] trait; the
//! shipped implementation is SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Audit events for history
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite storage implementation
//! - [`store`] - The store trait

pub mod events;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use sqlite::{CollectionInfo, MutationContext, SqliteStorage};
pub use store::VariableStore;
