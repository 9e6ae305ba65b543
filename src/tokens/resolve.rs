//! Cross-reference resolution.
//!
//! A record's value may point at another record, either as alias-shaped
//! rollup text (`{Color/Primary}`) or as a relation field. Targets are looked
//! up in the current batch first, then fetched from the document source.
//!
//! All lookup state lives in a [`ResolveContext`] owned by one run; nothing
//! is shared between runs.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::extract::{extract, field_kind, relation_ids, FieldKind};
use super::mapping::FieldMapping;
use super::{color, path};
use crate::model::{Record, Scalar, TokenValue};
use crate::source::DocumentSource;

/// What is known about an alias target.
#[derive(Debug, Clone, PartialEq)]
struct Target {
    /// Canonical path, when the target has a name.
    path: Option<String>,
    /// The target's own direct value, normalized.
    scalar: String,
}

/// Per-run lookup state.
pub struct ResolveContext<'a> {
    mapping: &'a FieldMapping,
    /// record id → (record, canonical path), built once over the batch.
    batch: HashMap<&'a str, (&'a Record, Option<String>)>,
    /// record id → fetched record; `None` caches a failed fetch.
    fetched: HashMap<String, Option<Record>>,
    fetch_count: usize,
}

impl<'a> ResolveContext<'a> {
    /// Index every record of the batch by id.
    #[must_use]
    pub fn new(records: &'a [Record], mapping: &'a FieldMapping) -> Self {
        let batch = records
            .iter()
            .map(|r| (r.id.as_str(), (r, record_path(r, mapping))))
            .collect();
        Self {
            mapping,
            batch,
            fetched: HashMap::new(),
            fetch_count: 0,
        }
    }

    /// Number of records fetched from the source so far.
    #[must_use]
    pub const fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Canonical path of a batch record, if it has a name.
    #[must_use]
    pub fn batch_path(&self, id: &str) -> Option<&str> {
        self.batch.get(id).and_then(|(_, p)| p.as_deref())
    }

    /// Resolve the value of `record`.
    ///
    /// Never fails: unresolvable references degrade to the best available
    /// literal or to an alias without fallback, with a warning logged.
    pub async fn resolve<S: DocumentSource>(&mut self, record: &Record, source: &S) -> TokenValue {
        let mapping = self.mapping;
        let primary = extract(record, &mapping.resolved);
        let secondary_is_relation =
            field_kind(record, &mapping.value) == Some(FieldKind::Relation);

        let parsed = TokenValue::parse(&primary);
        if parsed.is_alias() {
            return self
                .resolve_alias_text(record, parsed, secondary_is_relation, source)
                .await;
        }

        if primary.trim().is_empty() && secondary_is_relation {
            return self.resolve_relation(record, source).await;
        }

        let raw = if primary.trim().is_empty() {
            extract(record, &mapping.value)
        } else {
            primary
        };
        TokenValue::parse(&raw)
    }

    /// Alias-shaped rollup text: attach a fallback from the related record.
    async fn resolve_alias_text<S: DocumentSource>(
        &mut self,
        record: &Record,
        parsed: TokenValue,
        secondary_is_relation: bool,
        source: &S,
    ) -> TokenValue {
        let target_id = if secondary_is_relation {
            relation_ids(record, &self.mapping.value).into_iter().next()
        } else {
            None
        };

        let Some(target_id) = target_id else {
            debug!(record = %record.id, value = %parsed, "Alias without relation, keeping text");
            return parsed;
        };

        match self.lookup(&target_id, source).await {
            Some(Target {
                path: Some(path),
                scalar,
            }) => {
                if scalar.is_empty() {
                    TokenValue::Alias { target: path }
                } else {
                    TokenValue::AliasWithFallback {
                        target: path,
                        fallback: Scalar::Text(scalar),
                    }
                }
            }
            _ => {
                warn!(
                    record = %record.id,
                    target = %target_id,
                    "Alias target could not be resolved, keeping alias without fallback"
                );
                parsed
            }
        }
    }

    /// Empty rollup, relation value: alias the related record directly.
    async fn resolve_relation<S: DocumentSource>(&mut self, record: &Record, source: &S) -> TokenValue {
        let Some(target_id) = relation_ids(record, &self.mapping.value).into_iter().next() else {
            debug!(record = %record.id, "Empty relation value");
            return TokenValue::text("");
        };

        match self.lookup(&target_id, source).await {
            Some(Target {
                path: Some(path), ..
            }) => TokenValue::Alias { target: path },
            Some(Target { path: None, scalar }) => {
                warn!(
                    record = %record.id,
                    target = %target_id,
                    "Related record has no name, using its value"
                );
                TokenValue::text(scalar)
            }
            None => {
                warn!(
                    record = %record.id,
                    target = %target_id,
                    "Related record could not be loaded"
                );
                TokenValue::text("")
            }
        }
    }

    /// Find a target in the batch, the fetch cache, or the source.
    async fn lookup<S: DocumentSource>(&mut self, id: &str, source: &S) -> Option<Target> {
        if let Some((record, path)) = self.batch.get(id) {
            return Some(Target {
                path: path.clone(),
                scalar: direct_scalar(record, self.mapping),
            });
        }

        if !self.fetched.contains_key(id) {
            self.fetch_count += 1;
            let fetched = match source.fetch_record(id).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(id, error = %e, "Failed to fetch related record");
                    None
                }
            };
            self.fetched.insert(id.to_string(), fetched);
        }

        self.fetched.get(id)?.as_ref().map(|record| Target {
            path: record_path(record, self.mapping),
            scalar: direct_scalar(record, self.mapping),
        })
    }
}

/// Canonical `group/name` path of a record, `None` when it has no name.
fn record_path(record: &Record, mapping: &FieldMapping) -> Option<String> {
    let name = path::normalize_name(&extract(record, &mapping.name));
    if name.is_empty() {
        return None;
    }
    let group = path::normalize_path(&extract(record, &mapping.group));
    Some(path::join(&group, &name))
}

/// A record's own literal value, ignoring anything alias-shaped.
fn direct_scalar(record: &Record, mapping: &FieldMapping) -> String {
    let literal = [&mapping.resolved, &mapping.value]
        .into_iter()
        .map(|field| extract(record, field))
        .find(|text| !text.trim().is_empty() && !TokenValue::parse(text).is_alias())
        .unwrap_or_default();

    let literal = literal.trim();
    if color::looks_like_color(literal) {
        color::normalize(literal)
    } else {
        literal.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::source::RecordQuery;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// Serves records from memory and counts fetches per id.
    #[derive(Default)]
    struct StubSource {
        records: Vec<Record>,
        fetches: RefCell<Vec<String>>,
    }

    impl DocumentSource for StubSource {
        async fn query_records(&self, _query: &RecordQuery) -> Result<Vec<Record>> {
            Ok(self.records.clone())
        }

        async fn fetch_record(&self, id: &str) -> Result<Record> {
            self.fetches.borrow_mut().push(id.to_string());
            self.records
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })
        }
    }

    fn page(id: &str, props: Value) -> Record {
        Record {
            id: id.into(),
            properties: props.as_object().cloned().unwrap_or_default(),
        }
    }

    fn title(s: &str) -> Value {
        json!({"type": "title", "title": [{"plain_text": s}]})
    }

    fn text(s: &str) -> Value {
        json!({"type": "rich_text", "rich_text": [{"plain_text": s}]})
    }

    fn relation(id: &str) -> Value {
        json!({"type": "relation", "relation": [{"id": id}]})
    }

    fn rollup(s: &str) -> Value {
        json!({"type": "rollup", "rollup": {"type": "array", "array": [
            {"type": "rich_text", "rich_text": [{"plain_text": s}]}
        ]}})
    }

    fn primary_blue() -> Record {
        page(
            "blue",
            json!({"Name": title("Blue"), "Group": text("Color/Primary"), "Value": text("#0000FF")}),
        )
    }

    #[tokio::test]
    async fn test_plain_value_passes_through() {
        let records = vec![primary_blue()];
        let mapping = FieldMapping::default();
        let source = StubSource::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        let value = ctx.resolve(&records[0], &source).await;
        assert_eq!(value, TokenValue::text("#0000FF"));
    }

    #[tokio::test]
    async fn test_alias_text_gets_fallback_from_batch() {
        let records = vec![
            page(
                "link",
                json!({"Name": title("Link"), "Resolved Value": rollup("{Color/Primary/Blue}"), "Value": relation("blue")}),
            ),
            primary_blue(),
        ];
        let mapping = FieldMapping::default();
        let source = StubSource::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        let value = ctx.resolve(&records[0], &source).await;
        assert_eq!(
            value,
            TokenValue::AliasWithFallback {
                target: "Color/Primary/Blue".into(),
                fallback: Scalar::Text("#0000ff".into()),
            }
        );
        assert!(source.fetches.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_alias_text_gets_fallback_from_fetched_record() {
        let records = vec![
            page(
                "link",
                json!({"Name": title("Link"), "Resolved Value": rollup("{Color/Brand}"), "Value": relation("remote")}),
            ),
            page(
                "hover",
                json!({"Name": title("Hover"), "Resolved Value": rollup("{Color/Brand}"), "Value": relation("remote")}),
            ),
        ];
        let source = StubSource {
            records: vec![page(
                "remote",
                json!({"Name": title("Brand"), "Group": text("Color"), "Value": text("rgb(255, 136, 0)")}),
            )],
            ..StubSource::default()
        };
        let mapping = FieldMapping::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        for record in &records {
            let value = ctx.resolve(record, &source).await;
            assert_eq!(
                value,
                TokenValue::AliasWithFallback {
                    target: "Color/Brand".into(),
                    fallback: Scalar::Text("#ff8800".into()),
                }
            );
        }
        assert_eq!(*source.fetches.borrow(), vec!["remote".to_string()]);
        assert_eq!(ctx.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_relation_fetched_once() {
        let records = vec![
            page("a", json!({"Name": title("A"), "Value": relation("remote")})),
            page("b", json!({"Name": title("B"), "Value": relation("remote")})),
        ];
        let source = StubSource {
            records: vec![page(
                "remote",
                json!({"Name": title("Base"), "Group": text("Space"), "Value": text("8")}),
            )],
            ..StubSource::default()
        };
        let mapping = FieldMapping::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        for record in &records {
            let value = ctx.resolve(record, &source).await;
            assert_eq!(
                value,
                TokenValue::Alias {
                    target: "Space/Base".into()
                }
            );
        }
        assert_eq!(*source.fetches.borrow(), vec!["remote".to_string()]);
        assert_eq!(ctx.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_cached() {
        let records = vec![
            page("a", json!({"Name": title("A"), "Value": relation("gone")})),
            page("b", json!({"Name": title("B"), "Value": relation("gone")})),
        ];
        let mapping = FieldMapping::default();
        let source = StubSource::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        for record in &records {
            assert_eq!(ctx.resolve(record, &source).await, TokenValue::text(""));
        }
        assert_eq!(source.fetches.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_nameless_target_falls_back_to_scalar() {
        let records = vec![
            page("a", json!({"Name": title("A"), "Value": relation("anon")})),
            page("anon", json!({"Value": text("rgb(255, 0, 0)")})),
        ];
        let mapping = FieldMapping::default();
        let source = StubSource::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        let value = ctx.resolve(&records[0], &source).await;
        assert_eq!(value, TokenValue::text("#ff0000"));
    }

    #[tokio::test]
    async fn test_unresolvable_alias_keeps_text_without_fallback() {
        let records = vec![page(
            "a",
            json!({"Name": title("A"), "Resolved Value": rollup("{Color / Missing}"), "Value": relation("gone")}),
        )];
        let mapping = FieldMapping::default();
        let source = StubSource::default();
        let mut ctx = ResolveContext::new(&records, &mapping);

        let value = ctx.resolve(&records[0], &source).await;
        assert_eq!(
            value,
            TokenValue::Alias {
                target: "Color/Missing".into()
            }
        );
    }

    #[test]
    fn test_batch_paths_are_canonical() {
        let records = vec![primary_blue()];
        let mapping = FieldMapping::default();
        let ctx = ResolveContext::new(&records, &mapping);
        assert_eq!(ctx.batch_path("blue"), Some("Color/Primary/Blue"));
        assert_eq!(ctx.batch_path("nope"), None);
    }
}
