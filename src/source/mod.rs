//! Document sources.
//!
//! The engine reads upstream records through the [`DocumentSource`] trait:
//!
//! - [`NotionSource`] - Notion-compatible HTTP API (directly or via a proxy)
//! - [`FileSource`] - a JSON dump of pages on disk
//!
//! Pagination, authentication and transport live entirely in the
//! implementations; callers always receive a fully materialized list.

mod file;
mod notion;

pub use file::FileSource;
pub use notion::{NotionConfig, NotionSource};

use serde_json::Value;
use std::future::Future;

use crate::error::Result;
use crate::model::Record;

/// Which records to load, and in what order.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub database_id: String,
    /// Source-native filter object, passed through untouched.
    pub filter: Option<Value>,
    /// Source-native sort objects, applied in order.
    pub sorts: Vec<Value>,
}

impl RecordQuery {
    #[must_use]
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            ..Self::default()
        }
    }

    /// Sort ascending by a property name.
    #[must_use]
    pub fn sorted_by(mut self, property: &str) -> Self {
        self.sorts.push(serde_json::json!({
            "property": property,
            "direction": "ascending",
        }));
        self
    }
}

/// Read access to the external document database.
///
/// The engine is single-threaded, so the returned futures need not be `Send`.
pub trait DocumentSource {
    /// Load every record matching the query, in order.
    fn query_records(&self, query: &RecordQuery) -> impl Future<Output = Result<Vec<Record>>>;

    /// Load one record by id.
    fn fetch_record(&self, id: &str) -> impl Future<Output = Result<Record>>;
}
