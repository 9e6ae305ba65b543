//! Configuration management.
//!
//! Locates the tokensync home directory, resolves the database path, and
//! loads the optional settings file.
//!
//! # Layout
//!
//! - **Database**: `~/.tokensync/data/tokens.db`
//! - **Settings**: `~/.tokensync/config.json`

mod settings;

pub use settings::{load_config, load_config_from, Settings, DEFAULT_COLLECTION};

use std::path::{Path, PathBuf};

/// Get the global tokensync directory (`~/.tokensync/`).
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tokensync"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `TOKENSYNC_DB` environment variable
/// 3. Global location: `~/.tokensync/data/tokens.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("TOKENSYNC_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_dir().map(|dir| dir.join("data").join("tokens.db"))
}

/// Get the actor recorded on store audit events.
///
/// Priority:
/// 1. `TOKENSYNC_ACTOR` environment variable
/// 2. System username
/// 3. "tokensync"
#[must_use]
pub fn default_actor() -> String {
    ["TOKENSYNC_ACTOR", "USER", "USERNAME"]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "tokensync".to_string())
}
