//! Entry → design-token JSON export.
//!
//! Writes a collection as nested groups with `$type` / `$value` leaves:
//!
//! ```json
//! {"Color": {"Primary": {"$type": "color", "$value": "#ff0000"}}}
//! ```
//!
//! Aliases are written as `"{Group/Name}"` using the target's path. The
//! export never resolves an alias to its referent's value.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::model::{Entry, StoreValue};
use crate::tokens::{color, path};

/// Serializer for one collection's entries.
pub struct Exporter<'a> {
    entries: &'a [Entry],
    by_id: HashMap<&'a str, &'a Entry>,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub fn new(entries: &'a [Entry]) -> Self {
        Self {
            entries,
            by_id: entries.iter().map(|e| (e.id.as_str(), e)).collect(),
        }
    }

    /// Text form of an entry's value; aliases render as `{target path}`.
    #[must_use]
    pub fn display_value(&self, entry: &Entry) -> String {
        match &entry.value {
            None => String::new(),
            Some(StoreValue::Alias { id }) => self
                .by_id
                .get(id.as_str())
                .map_or_else(|| format!("{{{id}}}"), |t| format!("{{{}}}", t.full_name)),
            Some(value) => value.to_string(),
        }
    }

    /// Build the nested token document.
    ///
    /// Entries whose path collides with an existing leaf or group are
    /// skipped with a warning.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();

        for entry in self.entries {
            let segments = path::normalize_path(&entry.full_name);
            let Some((leaf, groups)) = segments.split_last() else {
                continue;
            };

            let Some(parent) = descend(&mut root, groups) else {
                warn!(name = %entry.full_name, "Path passes through a token, skipping");
                continue;
            };
            if parent.contains_key(leaf) {
                warn!(name = %entry.full_name, "Path already exported, skipping");
                continue;
            }
            parent.insert(leaf.clone(), self.leaf(entry));
        }

        Value::Object(root)
    }

    fn leaf(&self, entry: &Entry) -> Value {
        let value = match &entry.value {
            None => Value::Null,
            Some(StoreValue::Color(rgba)) => Value::String(color::format(rgba)),
            Some(StoreValue::Number { value }) => serde_json::Number::from_f64(*value)
                .map_or(Value::Null, Value::Number),
            Some(StoreValue::Boolean { value }) => Value::Bool(*value),
            Some(StoreValue::String { value }) => Value::String(value.clone()),
            Some(StoreValue::Alias { .. }) => Value::String(self.display_value(entry)),
        };

        let mut leaf = Map::new();
        leaf.insert("$type".into(), Value::String(entry.entry_type.as_str().into()));
        leaf.insert("$value".into(), value);
        if let Some(description) = &entry.description {
            leaf.insert("$description".into(), Value::String(description.clone()));
        }
        Value::Object(leaf)
    }
}

/// Walk (creating as needed) the group objects for `groups`.
///
/// Returns `None` if a segment is already a token leaf.
fn descend<'m>(root: &'m mut Map<String, Value>, groups: &[String]) -> Option<&'m mut Map<String, Value>> {
    let mut node = root;
    for group in groups {
        let child = node
            .entry(group.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match child {
            Value::Object(map) if !map.contains_key("$value") => node = map,
            _ => return None,
        }
    }
    Some(node)
}

/// Write content to a file atomically.
///
/// Writes to a temporary file alongside the target, syncs it, then renames.
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rgba, TokenType};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(id: &str, name: &str, entry_type: TokenType, value: Option<StoreValue>) -> Entry {
        Entry {
            id: id.into(),
            collection_id: "coll_1".into(),
            full_name: name.into(),
            entry_type,
            value,
            description: None,
        }
    }

    #[test]
    fn test_nested_export_with_alias() {
        let mut gap = entry("v3", "Spacing/Gap", TokenType::Number, Some(StoreValue::Number { value: 8.0 }));
        gap.description = Some("Gutter".into());
        let entries = vec![
            entry(
                "v1",
                "Color/Primary",
                TokenType::Color,
                Some(StoreValue::Color(Rgba::new(1.0, 0.0, 0.0, 1.0))),
            ),
            entry("v2", "Color/Link", TokenType::Color, Some(StoreValue::Alias { id: "v1".into() })),
            gap,
            entry("v4", "Flag", TokenType::Boolean, Some(StoreValue::Boolean { value: false })),
        ];

        let json = Exporter::new(&entries).to_json();
        assert_eq!(
            json,
            json!({
                "Color": {
                    "Primary": {"$type": "color", "$value": "#ff0000"},
                    "Link": {"$type": "color", "$value": "{Color/Primary}"}
                },
                "Spacing": {
                    "Gap": {"$type": "number", "$value": 8.0, "$description": "Gutter"}
                },
                "Flag": {"$type": "boolean", "$value": false}
            })
        );
    }

    #[test]
    fn test_collisions_are_skipped() {
        let entries = vec![
            entry("v1", "Color", TokenType::String, Some(StoreValue::String { value: "x".into() })),
            entry("v2", "Color/Red", TokenType::String, Some(StoreValue::String { value: "y".into() })),
        ];
        let json = Exporter::new(&entries).to_json();
        assert_eq!(json, json!({"Color": {"$type": "string", "$value": "x"}}));
    }

    #[test]
    fn test_display_value() {
        let entries = vec![
            entry("v1", "Base", TokenType::String, Some(StoreValue::String { value: "a".into() })),
            entry("v2", "Ref", TokenType::String, Some(StoreValue::Alias { id: "v1".into() })),
            entry("v3", "Empty", TokenType::String, None),
            entry("v4", "Lost", TokenType::String, Some(StoreValue::Alias { id: "var_gone".into() })),
        ];
        let exporter = Exporter::new(&entries);
        assert_eq!(exporter.display_value(&entries[0]), "a");
        assert_eq!(exporter.display_value(&entries[1]), "{Base}");
        assert_eq!(exporter.display_value(&entries[2]), "");
        assert_eq!(exporter.display_value(&entries[3]), "{var_gone}");
    }

    #[test]
    fn test_atomic_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("tokens.json");
        atomic_write(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
