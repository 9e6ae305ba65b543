//! Collections command implementation.

use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::PathBuf;

use super::open_storage;
use crate::error::Result;

/// Execute the collections command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or queried.
pub fn execute(db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, actor)?;
    let collections = storage.list_collections()?;

    if crate::is_csv() {
        println!("id,name,entries,created_at");
        for c in &collections {
            println!("{},{},{},{}", c.id, crate::csv_escape(&c.name), c.entries, c.created_at);
        }
    } else if json {
        let output = serde_json::json!({
            "count": collections.len(),
            "collections": collections,
        });
        println!("{output}");
    } else if collections.is_empty() {
        println!("No collections yet. Run `tokensync sync` to create one.");
    } else {
        println!("Collections ({}):", collections.len());
        println!();
        for c in &collections {
            let created = DateTime::<Utc>::from_timestamp_millis(c.created_at)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!(
                "  {:<30} {:>5} entries  {}",
                c.name.bold(),
                c.entries,
                created.dimmed()
            );
        }
    }

    Ok(())
}
