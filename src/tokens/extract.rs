//! Field extraction from loosely-typed records.
//!
//! Each property carries its own `type` discriminator; extraction dispatches
//! on it and always produces a string. Missing fields, null payloads and
//! unknown kinds all yield `""`.

use serde_json::Value;

use crate::model::Record;

/// Declared kind of a record property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Formula,
    Rollup,
    Relation,
    Date,
    Unknown,
}

impl FieldKind {
    #[must_use]
    pub fn of(property: &Value) -> Self {
        match property.get("type").and_then(Value::as_str) {
            Some("title") => Self::Title,
            Some("rich_text") => Self::RichText,
            Some("number") => Self::Number,
            Some("select") => Self::Select,
            Some("multi_select") => Self::MultiSelect,
            Some("formula") => Self::Formula,
            Some("rollup") => Self::Rollup,
            Some("relation") => Self::Relation,
            Some("date") => Self::Date,
            _ => Self::Unknown,
        }
    }
}

/// Extract the named field of `record` as text.
///
/// An empty field name yields `""`.
#[must_use]
pub fn extract(record: &Record, field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    record.property(field).map(extract_property).unwrap_or_default()
}

/// Kind of the named field, if the record has it.
#[must_use]
pub fn field_kind(record: &Record, field: &str) -> Option<FieldKind> {
    record.property(field).map(FieldKind::of)
}

/// Target record ids of a relation field, in order.
///
/// Returns an empty list when the field is missing or not a relation.
#[must_use]
pub fn relation_ids(record: &Record, field: &str) -> Vec<String> {
    record
        .property(field)
        .filter(|p| FieldKind::of(p) == FieldKind::Relation)
        .and_then(|p| p.get("relation"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract a single property value.
#[must_use]
pub fn extract_property(property: &Value) -> String {
    let payload = |key: &str| property.get(key).filter(|v| !v.is_null());

    match FieldKind::of(property) {
        FieldKind::Title => payload("title").map(rich_text).unwrap_or_default(),
        FieldKind::RichText => payload("rich_text").map(rich_text).unwrap_or_default(),
        FieldKind::Number => payload("number").map(number_text).unwrap_or_default(),
        FieldKind::Select => payload("select").map(option_name).unwrap_or_default(),
        FieldKind::MultiSelect => payload("multi_select")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .map(option_name)
                    .filter(|n| !n.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
        FieldKind::Formula => payload("formula").map(formula_text).unwrap_or_default(),
        FieldKind::Rollup => payload("rollup").map(rollup_text).unwrap_or_default(),
        FieldKind::Date => payload("date").map(date_start).unwrap_or_default(),
        FieldKind::Relation | FieldKind::Unknown => String::new(),
    }
}

/// Concatenate the plain text of every run, no separator.
fn rich_text(runs: &Value) -> String {
    let Some(runs) = runs.as_array() else {
        return String::new();
    };
    runs.iter()
        .filter_map(|run| {
            run.get("plain_text")
                .and_then(Value::as_str)
                .or_else(|| run.pointer("/text/content").and_then(Value::as_str))
        })
        .collect()
}

fn number_text(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn option_name(option: &Value) -> String {
    option
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn date_start(date: &Value) -> String {
    date.get("start")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn formula_text(formula: &Value) -> String {
    let result = |key: &str| formula.get(key).filter(|v| !v.is_null());
    match formula.get("type").and_then(Value::as_str) {
        Some("string") => result("string")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some("number") => result("number").map(number_text).unwrap_or_default(),
        Some("boolean") => result("boolean")
            .and_then(Value::as_bool)
            .map(|b| b.to_string())
            .unwrap_or_default(),
        Some("date") => result("date").map(date_start).unwrap_or_default(),
        _ => String::new(),
    }
}

fn rollup_text(rollup: &Value) -> String {
    let result = |key: &str| rollup.get(key).filter(|v| !v.is_null());
    match rollup.get("type").and_then(Value::as_str) {
        Some("number") => result("number").map(number_text).unwrap_or_default(),
        Some("date") => result("date").map(date_start).unwrap_or_default(),
        Some("rich_text") => result("rich_text").map(rich_text).unwrap_or_default(),
        Some("title") => result("title").map(rich_text).unwrap_or_default(),
        Some("array") => result("array")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .map(array_element_text)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Text of the first element of an aggregated rollup.
///
/// Tries `plain_text`, `rich_text`, `title`, then `name`, then falls back to
/// a generic rendering of the element.
fn array_element_text(element: &Value) -> String {
    if let Some(text) = element.get("plain_text").and_then(Value::as_str) {
        return text.to_string();
    }
    for key in ["rich_text", "title"] {
        if let Some(runs) = element.get(key).filter(|v| v.is_array()) {
            return rich_text(runs);
        }
    }
    if let Some(name) = element.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    if FieldKind::of(element) != FieldKind::Unknown {
        return extract_property(element);
    }
    match element {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(properties: Value) -> Record {
        Record {
            id: "page-1".into(),
            properties: properties.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_title_joins_runs() {
        let rec = record(json!({
            "Name": {"type": "title", "title": [
                {"plain_text": "Primary "}, {"plain_text": "Blue"}
            ]}
        }));
        assert_eq!(extract(&rec, "Name"), "Primary Blue");
    }

    #[test]
    fn test_rich_text_falls_back_to_content() {
        let rec = record(json!({
            "Desc": {"type": "rich_text", "rich_text": [{"text": {"content": "hi"}}]}
        }));
        assert_eq!(extract(&rec, "Desc"), "hi");
    }

    #[test]
    fn test_number_select_multi_select() {
        let rec = record(json!({
            "Size": {"type": "number", "number": 16},
            "Empty": {"type": "number", "number": null},
            "Group": {"type": "select", "select": {"name": "Spacing"}},
            "NoGroup": {"type": "select", "select": null},
            "Tags": {"type": "multi_select", "multi_select": [{"name": "a"}, {"name": "b"}]}
        }));
        assert_eq!(extract(&rec, "Size"), "16");
        assert_eq!(extract(&rec, "Empty"), "");
        assert_eq!(extract(&rec, "Group"), "Spacing");
        assert_eq!(extract(&rec, "NoGroup"), "");
        assert_eq!(extract(&rec, "Tags"), "a, b");
    }

    #[test]
    fn test_formula_kinds() {
        let rec = record(json!({
            "S": {"type": "formula", "formula": {"type": "string", "string": "#fff"}},
            "N": {"type": "formula", "formula": {"type": "number", "number": 1.5}},
            "B": {"type": "formula", "formula": {"type": "boolean", "boolean": false}},
            "D": {"type": "formula", "formula": {"type": "date", "date": {"start": "2024-01-01"}}}
        }));
        assert_eq!(extract(&rec, "S"), "#fff");
        assert_eq!(extract(&rec, "N"), "1.5");
        assert_eq!(extract(&rec, "B"), "false");
        assert_eq!(extract(&rec, "D"), "2024-01-01");
    }

    #[test]
    fn test_rollup_array_takes_first_element() {
        let rec = record(json!({
            "Resolved": {"type": "rollup", "rollup": {"type": "array", "array": [
                {"type": "rich_text", "rich_text": [{"plain_text": "{Color/Primary}"}]},
                {"type": "rich_text", "rich_text": [{"plain_text": "ignored"}]}
            ]}},
            "Named": {"type": "rollup", "rollup": {"type": "array", "array": [{"name": "opt"}]}},
            "Num": {"type": "rollup", "rollup": {"type": "array", "array": [{"type": "number", "number": 4}]}},
            "Raw": {"type": "rollup", "rollup": {"type": "array", "array": [7]}},
            "Total": {"type": "rollup", "rollup": {"type": "number", "number": 3}}
        }));
        assert_eq!(extract(&rec, "Resolved"), "{Color/Primary}");
        assert_eq!(extract(&rec, "Named"), "opt");
        assert_eq!(extract(&rec, "Num"), "4");
        assert_eq!(extract(&rec, "Raw"), "7");
        assert_eq!(extract(&rec, "Total"), "3");
    }

    #[test]
    fn test_date_and_unknown_kinds() {
        let rec = record(json!({
            "When": {"type": "date", "date": {"start": "2024-05-01", "end": null}},
            "Who": {"type": "people", "people": []},
            "Nothing": null
        }));
        assert_eq!(extract(&rec, "When"), "2024-05-01");
        assert_eq!(extract(&rec, "Who"), "");
        assert_eq!(extract(&rec, "Nothing"), "");
        assert_eq!(extract(&rec, "Missing"), "");
        assert_eq!(extract(&rec, ""), "");
    }

    #[test]
    fn test_relation_ids() {
        let rec = record(json!({
            "Ref": {"type": "relation", "relation": [{"id": "a"}, {"id": "b"}]},
            "Name": {"type": "title", "title": []}
        }));
        assert_eq!(relation_ids(&rec, "Ref"), vec!["a", "b"]);
        assert_eq!(extract(&rec, "Ref"), "");
        assert!(relation_ids(&rec, "Name").is_empty());
        assert_eq!(field_kind(&rec, "Ref"), Some(FieldKind::Relation));
        assert_eq!(field_kind(&rec, "Missing"), None);
    }
}
