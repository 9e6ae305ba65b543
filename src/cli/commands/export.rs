//! Export command implementation.
//!
//! Writes a collection as a nested `$type`/`$value` token document, either to
//! stdout or atomically to a file.

use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::open_storage;
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::sync::{atomic_write, Exporter};

/// Execute the export command.
///
/// # Errors
///
/// Returns `Error::CollectionNotFound` if the collection does not exist, or
/// an I/O error if the output file cannot be written.
pub fn execute(
    collection: Option<&str>,
    output: Option<&PathBuf>,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let name = load_config()?.collection(collection);
    let storage = open_storage(db_path, actor)?;

    let found = storage
        .get_collection_by_name(&name)?
        .ok_or_else(|| Error::CollectionNotFound { name: name.clone() })?;
    let entries = storage.get_variables(&found.id)?;
    let document = serde_json::to_string_pretty(&Exporter::new(&entries).to_json())?;

    let Some(path) = output else {
        println!("{document}");
        return Ok(());
    };

    atomic_write(path, &document)?;
    info!(path = %path.display(), entries = entries.len(), "Exported collection");

    if json {
        let output = serde_json::json!({
            "success": true,
            "collection": name,
            "output": path.display().to_string(),
            "count": entries.len(),
        });
        println!("{output}");
    } else {
        println!(
            "{} Exported {} entries from '{name}' to {}",
            "✓".green(),
            entries.len(),
            path.display()
        );
    }

    Ok(())
}
