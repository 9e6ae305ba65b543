//! Variable store trait.
//!
//! Defines the operations the reconciliation engine performs against the
//! target store. Methods are async so remote stores can implement them;
//! the engine is single-threaded and never requires `Send` futures.

use std::future::Future;

use crate::error::Result;
use crate::model::{Collection, Entry, StoreValue, TokenType};

/// Typed, alias-aware key/value store grouped into collections.
pub trait VariableStore {
    /// Find a collection by exact name.
    fn find_collection(&mut self, name: &str) -> impl Future<Output = Result<Option<Collection>>>;

    /// Create an empty collection.
    fn create_collection(&mut self, name: &str) -> impl Future<Output = Result<Collection>>;

    /// All entries of a collection.
    fn list_entries(&mut self, collection_id: &str) -> impl Future<Output = Result<Vec<Entry>>>;

    /// Create an entry with no value.
    fn create_entry(
        &mut self,
        collection_id: &str,
        full_name: &str,
        entry_type: TokenType,
    ) -> impl Future<Output = Result<Entry>>;

    /// Write an entry's value, returning the updated entry.
    ///
    /// Implementations reject values that do not fit the entry's type and
    /// aliases whose target is missing or of a different type.
    fn set_value(&mut self, entry: &Entry, value: &StoreValue) -> impl Future<Output = Result<Entry>>;

    /// Replace an entry's description.
    fn set_description(
        &mut self,
        entry: &Entry,
        description: Option<&str>,
    ) -> impl Future<Output = Result<()>>;

    /// Delete an entry.
    fn delete_entry(&mut self, entry: &Entry) -> impl Future<Output = Result<()>>;
}
