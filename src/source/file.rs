//! Document source backed by a JSON export on disk.
//!
//! Accepts either a bare array of pages or a query response object with a
//! `results` array, so a saved API response can be replayed as-is.

use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{DocumentSource, RecordQuery};
use crate::error::{Error, Result};
use crate::model::Record;
use crate::tokens::extract::extract;

#[derive(Deserialize)]
#[serde(untagged)]
enum Dump {
    Pages(Vec<Record>),
    Response { results: Vec<Record> },
}

/// All records of one JSON file, held in memory.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    records: Vec<Record>,
}

impl FileSource {
    /// Load records from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not a page dump.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut source = Self::from_json(&content)?;
        source.path = path.to_path_buf();
        Ok(source)
    }

    /// Parse records from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a page array or query response.
    pub fn from_json(content: &str) -> Result<Self> {
        let records = match serde_json::from_str(content)? {
            Dump::Pages(records) | Dump::Response { results: records } => records,
        };
        Ok(Self {
            path: PathBuf::new(),
            records,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DocumentSource for FileSource {
    async fn query_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        if query.filter.is_some() {
            debug!("File source ignores query filters");
        }

        let keys: Vec<(&str, bool)> = query
            .sorts
            .iter()
            .filter_map(|sort| {
                let property = sort.get("property")?.as_str()?;
                let descending = sort.get("direction").and_then(Value::as_str) == Some("descending");
                Some((property, descending))
            })
            .collect();

        let mut keyed: Vec<(Vec<String>, &Record)> = self
            .records
            .iter()
            .map(|r| (keys.iter().map(|(p, _)| extract(r, p)).collect(), r))
            .collect();
        // Stable, so records equal on every key keep file order
        keyed.sort_by(|(a, _), (b, _)| {
            keys.iter()
                .zip(a.iter().zip(b))
                .map(|((_, descending), (x, y))| if *descending { y.cmp(x) } else { x.cmp(y) })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let records = keyed.into_iter().map(|(_, r)| r.clone()).collect();
        Ok(records)
    }

    async fn fetch_record(&self, id: &str) -> Result<Record> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })
    }
}
