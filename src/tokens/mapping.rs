//! Token property → record field name mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Which record field feeds each token property.
///
/// Every property has a default field name; a caller-supplied table only
/// needs to name the fields that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub name: String,
    pub group: String,
    /// Directly mapped value field; may be a relation to another record.
    pub value: String,
    /// Rollup of the related record's value, checked before `value`.
    pub resolved: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub description: String,
    pub unit: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            group: "Group".to_string(),
            value: "Value".to_string(),
            resolved: "Resolved Value".to_string(),
            token_type: "Type".to_string(),
            description: "Description".to_string(),
            unit: "Unit".to_string(),
        }
    }
}

impl FieldMapping {
    /// Point one token property at a different field.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an unknown property name.
    pub fn set(&mut self, property: &str, field: &str) -> Result<()> {
        let slot = match property.trim().to_lowercase().as_str() {
            "name" => &mut self.name,
            "group" => &mut self.group,
            "value" => &mut self.value,
            "resolved" | "resolved_value" => &mut self.resolved,
            "type" => &mut self.token_type,
            "description" => &mut self.description,
            "unit" => &mut self.unit,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown mapping property '{other}'"
                )))
            }
        };
        *slot = field.trim().to_string();
        Ok(())
    }

    /// Apply a table of overrides on top of this mapping.
    ///
    /// # Errors
    ///
    /// Returns the first unknown property name.
    pub fn apply(&mut self, overrides: &HashMap<String, String>) -> Result<()> {
        for (property, field) in overrides {
            self.set(property, field)?;
        }
        Ok(())
    }
}

/// Parse a `property=Field Name` override.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` when there is no `=` or either side is empty.
pub fn parse_override(spec: &str) -> Result<(String, String)> {
    let (property, field) = spec
        .split_once('=')
        .ok_or_else(|| Error::InvalidArgument(format!("mapping '{spec}' must be property=Field")))?;
    if property.trim().is_empty() || field.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "mapping '{spec}' has an empty side"
        )));
    }
    Ok((property.trim().to_string(), field.trim().to_string()))
}
