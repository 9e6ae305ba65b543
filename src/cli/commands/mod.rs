//! Command implementations.

pub mod collections;
pub mod completions;
pub mod export;
pub mod list;
pub mod sync;
pub mod version;

use crate::config::{default_actor, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// Open the store at the resolved database path, creating it if needed.
pub(crate) fn open_storage(db_path: Option<&PathBuf>, actor: Option<&str>) -> Result<SqliteStorage> {
    let path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine database location".into()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let actor = actor.map_or_else(default_actor, ToString::to_string);
    Ok(SqliteStorage::open(&path)?.with_actor(&actor))
}
