//! List command implementation.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::open_storage;
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::model::TokenType;
use crate::sync::Exporter;

#[derive(Serialize)]
struct EntryRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    entry_type: TokenType,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    collection: &'a str,
    count: usize,
    entries: Vec<EntryRow<'a>>,
}

/// Execute the list command.
///
/// # Errors
///
/// Returns `Error::CollectionNotFound` if the collection does not exist.
pub fn execute(
    collection: Option<&str>,
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
    let exporter = Exporter::new(&entries);

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: &e.id,
            name: &e.full_name,
            entry_type: e.entry_type,
            value: exporter.display_value(e),
            description: e.description.as_deref(),
        })
        .collect();

    if crate::is_csv() {
        println!("name,type,value,description");
        for row in &rows {
            println!(
                "{},{},{},{}",
                crate::csv_escape(row.name),
                row.entry_type,
                crate::csv_escape(&row.value),
                crate::csv_escape(row.description.unwrap_or_default())
            );
        }
    } else if json {
        let output = ListOutput {
            collection: &name,
            count: rows.len(),
            entries: rows,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if rows.is_empty() {
        println!("Collection '{name}' is empty.");
    } else {
        println!("{} ({} entries):", name.bold(), rows.len());
        println!();
        for row in &rows {
            let value = if row.value.is_empty() {
                "(unset)".dimmed().to_string()
            } else if row.value.starts_with('{') {
                row.value.cyan().to_string()
            } else {
                row.value.clone()
            };
            println!("  {:<40} {:<8} {value}", row.name, row.entry_type.as_str().dimmed());
            if let Some(desc) = row.description {
                println!("  {}", desc.dimmed());
            }
        }
    }

    Ok(())
}
