//! Token → store reconciliation.
//!
//! A run works against a snapshot of the collection taken once at the start
//! and applies three passes:
//!
//! 1. **Write**: create, overwrite or skip each token in batch order. Aliases
//!    whose target is already known with the same type are linked
//!    immediately. Otherwise a bare alias is left unset and an alias with a
//!    fallback writes the fallback.
//! 2. **Alias**: re-resolve every alias token written in pass 1 against all
//!    entries known after pass 1, so forward references link up.
//! 3. **Prune** (optional): delete snapshot entries whose name is absent from
//!    the batch.
//!
//! Per-item failures are folded into the [`SyncSummary`]; only batch-level
//! preconditions are returned as errors. Entries are keyed by full name, so
//! re-running after an interruption is safe.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::types::{ItemError, Progress, ProgressSink, Stage, SyncOptions, SyncSummary};
use crate::error::{Error, Result};
use crate::model::{Collection, Entry, StoreValue, Token, TokenValue};
use crate::storage::VariableStore;
use crate::tokens::path;

/// Per-token result of the write and alias passes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Created,
    Overwritten,
    Skipped,
    Failed(String),
}

impl Outcome {
    const fn is_write(&self) -> bool {
        matches!(self, Self::Created | Self::Overwritten)
    }
}

/// Synchronize a batch into the named collection, creating it if needed.
///
/// # Errors
///
/// Returns `EmptyBatch` if `tokens` is empty, or `CollectionUnavailable` if
/// the collection cannot be found, created, or listed. Nothing is written
/// in either case.
pub async fn sync_collection<V: VariableStore, P: ProgressSink>(
    store: &mut V,
    collection_name: &str,
    tokens: &[Token],
    options: &SyncOptions,
    sink: &mut P,
) -> Result<SyncSummary> {
    if tokens.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let collection = obtain_collection(store, collection_name).await?;
    let existing = store
        .list_entries(&collection.id)
        .await
        .map_err(|e| unavailable(collection_name, &e))?;

    reconcile(store, &collection.id, tokens, &existing, options, sink).await
}

/// Reconcile a batch against a snapshot of an existing collection.
///
/// # Errors
///
/// Returns `EmptyBatch` if `tokens` is empty.
pub async fn reconcile<V: VariableStore, P: ProgressSink>(
    store: &mut V,
    collection_id: &str,
    tokens: &[Token],
    existing: &[Entry],
    options: &SyncOptions,
    sink: &mut P,
) -> Result<SyncSummary> {
    if tokens.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let names: Vec<String> = tokens.iter().map(Token::full_name).collect();
    let warnings = duplicate_warnings(&names);

    let mut run = Reconciler {
        store,
        collection_id,
        options,
        sink,
        snapshot: existing
            .iter()
            .map(|e| path::canonical(&e.full_name))
            .collect(),
        known: existing
            .iter()
            .map(|e| (path::canonical(&e.full_name), e.clone()))
            .collect(),
        written: HashSet::new(),
        outcomes: Vec::with_capacity(tokens.len()),
        deleted: 0,
        prune_errors: Vec::new(),
    };

    info!(tokens = tokens.len(), existing = existing.len(), "Reconciling batch");
    run.write_pass(tokens, &names).await;
    run.alias_pass(tokens, &names).await;
    if options.prune_unmatched {
        run.prune_pass(&names, existing).await;
    }

    let summary = run.finish(&names, warnings);
    info!(
        created = summary.created,
        overwritten = summary.overwritten,
        skipped = summary.skipped,
        deleted = summary.deleted,
        failed = summary.failed,
        "Reconciliation complete"
    );
    Ok(summary)
}

async fn obtain_collection<V: VariableStore>(store: &mut V, name: &str) -> Result<Collection> {
    match store.find_collection(name).await {
        Ok(Some(collection)) => Ok(collection),
        Ok(None) => {
            let collection = store
                .create_collection(name)
                .await
                .map_err(|e| unavailable(name, &e))?;
            info!(name, id = %collection.id, "Created collection");
            Ok(collection)
        }
        Err(e) => Err(unavailable(name, &e)),
    }
}

fn unavailable(name: &str, cause: &Error) -> Error {
    Error::CollectionUnavailable {
        name: name.to_string(),
        reason: cause.to_string(),
    }
}

fn duplicate_warnings(names: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    for name in names {
        let count = counts[name.as_str()];
        if count > 1 && seen.insert(name.as_str()) {
            warn!(name = %name, count, "Duplicate token name, last one wins");
            warnings.push(format!(
                "Duplicate token name '{name}' ({count} occurrences); the last one wins"
            ));
        }
    }
    warnings
}

struct Reconciler<'a, V, P> {
    store: &'a mut V,
    collection_id: &'a str,
    options: &'a SyncOptions,
    sink: &'a mut P,
    /// Canonical names present when the run started.
    snapshot: HashSet<String>,
    /// Current view of the collection by canonical name.
    known: HashMap<String, Entry>,
    /// Names written earlier in this run.
    written: HashSet<String>,
    outcomes: Vec<Outcome>,
    deleted: usize,
    prune_errors: Vec<ItemError>,
}

impl<V: VariableStore, P: ProgressSink> Reconciler<'_, V, P> {
    async fn write_pass(&mut self, tokens: &[Token], names: &[String]) {
        let total = tokens.len();
        for (i, (token, name)) in tokens.iter().zip(names).enumerate() {
            let outcome = match self.write_token(name, token).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(name = %name, error = %e, "Failed to write token");
                    Outcome::Failed(e.to_string())
                }
            };
            debug!(name = %name, outcome = ?outcome, "Wrote token");
            self.outcomes.push(outcome);
            self.report(Stage::Writing, i + 1, total);
        }
    }

    async fn write_token(&mut self, name: &str, token: &Token) -> Result<Outcome> {
        let current = self.known.get(name).cloned();
        let (entry, outcome) = match current {
            Some(_)
                if !self.options.overwrite_existing
                    && self.snapshot.contains(name)
                    && !self.written.contains(name) =>
            {
                return Ok(Outcome::Skipped);
            }
            Some(entry) if entry.entry_type != token.token_type => {
                debug!(
                    name,
                    from = %entry.entry_type,
                    to = %token.token_type,
                    "Type changed, recreating entry"
                );
                self.store.delete_entry(&entry).await?;
                self.known.remove(name);
                let entry = self
                    .store
                    .create_entry(self.collection_id, name, token.token_type)
                    .await?;
                (entry, Outcome::Overwritten)
            }
            Some(entry) => (entry, Outcome::Overwritten),
            None => {
                let entry = self
                    .store
                    .create_entry(self.collection_id, name, token.token_type)
                    .await?;
                (entry, Outcome::Created)
            }
        };

        self.written.insert(name.to_string());
        self.known.insert(name.to_string(), entry.clone());

        let entry = self.write_value(entry, &token.value).await?;
        self.store
            .set_description(&entry, token.description.as_deref())
            .await?;
        self.known.insert(name.to_string(), entry);

        Ok(outcome)
    }

    async fn write_value(&mut self, entry: Entry, value: &TokenValue) -> Result<Entry> {
        let store_value = match value {
            TokenValue::Scalar(scalar) => StoreValue::from_scalar(scalar, entry.entry_type)?,
            TokenValue::Alias { target } => match self.linkable(target, &entry) {
                Some(value) => value,
                None => {
                    debug!(name = %entry.full_name, target = %target, "Alias target not yet linkable, deferring");
                    return Ok(entry);
                }
            },
            TokenValue::AliasWithFallback { target, fallback } => {
                match self.linkable(target, &entry) {
                    Some(value) => value,
                    None => {
                        debug!(name = %entry.full_name, target = %target, "Alias target not yet known, writing fallback");
                        StoreValue::from_scalar(fallback, entry.entry_type)?
                    }
                }
            }
        };

        self.store.set_value(&entry, &store_value).await
    }

    /// Alias value for `target` if it is known and has the entry's type.
    fn linkable(&self, target: &str, entry: &Entry) -> Option<StoreValue> {
        self.known
            .get(target)
            .filter(|t| t.entry_type == entry.entry_type)
            .map(|t| StoreValue::Alias { id: t.id.clone() })
    }

    async fn alias_pass(&mut self, tokens: &[Token], names: &[String]) {
        // Only the last token of a duplicated name decides its final value
        let last: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let pending: Vec<usize> = (0..tokens.len())
            .filter(|&i| {
                tokens[i].value.is_alias()
                    && self.outcomes[i].is_write()
                    && last.get(names[i].as_str()) == Some(&i)
            })
            .collect();

        info!(aliases = pending.len(), "Re-resolving aliases");
        let total = pending.len();
        for (n, i) in pending.into_iter().enumerate() {
            let token = &tokens[i];
            let name = &names[i];
            if let Err(e) = self.relink(name, &token.value).await {
                match token.value {
                    TokenValue::AliasWithFallback { .. } => {
                        warn!(name = %name, error = %e, "Alias unresolved, keeping fallback");
                    }
                    _ => {
                        warn!(name = %name, error = %e, "Alias unresolved");
                        self.outcomes[i] = Outcome::Failed(e.to_string());
                    }
                }
            }
            self.report(Stage::Aliasing, n + 1, total);
        }
    }

    async fn relink(&mut self, name: &str, value: &TokenValue) -> Result<()> {
        let Some(target) = value.target() else {
            return Ok(());
        };
        let entry = self
            .known
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound {
                id: name.to_string(),
            })?;

        let link = match value {
            TokenValue::AliasWithFallback { .. } => self.linkable(target, &entry),
            _ => self.known.get(target).map(|t| StoreValue::Alias { id: t.id.clone() }),
        };
        let Some(link) = link else {
            return Err(Error::AliasTargetNotFound {
                target: target.to_string(),
            });
        };

        if entry.value.as_ref() == Some(&link) {
            return Ok(());
        }
        let updated = self.store.set_value(&entry, &link).await?;
        debug!(name, target, "Linked alias");
        self.known.insert(name.to_string(), updated);
        Ok(())
    }

    async fn prune_pass(&mut self, names: &[String], existing: &[Entry]) {
        let keep: HashSet<&str> = names.iter().map(String::as_str).collect();
        let stale: Vec<&Entry> = existing
            .iter()
            .filter(|e| !keep.contains(path::canonical(&e.full_name).as_str()))
            .collect();

        info!(stale = stale.len(), "Pruning unmatched entries");
        let total = stale.len();
        for (n, entry) in stale.into_iter().enumerate() {
            match self.store.delete_entry(entry).await {
                Ok(()) => {
                    debug!(name = %entry.full_name, "Deleted entry");
                    self.deleted += 1;
                }
                Err(e) => {
                    warn!(name = %entry.full_name, error = %e, "Failed to delete entry");
                    self.prune_errors.push(ItemError {
                        name: entry.full_name.clone(),
                        reason: format!("delete failed: {e}"),
                    });
                }
            }
            self.report(Stage::Pruning, n + 1, total);
        }
    }

    fn report(&mut self, stage: Stage, done: usize, total: usize) {
        let every = self.options.progress_interval.max(1);
        if done % every == 0 || done == total {
            self.sink.on_progress(Progress { stage, done, total });
        }
    }

    fn finish(self, names: &[String], warnings: Vec<String>) -> SyncSummary {
        let mut summary = SyncSummary {
            deleted: self.deleted,
            warnings,
            ..SyncSummary::default()
        };

        for (outcome, name) in self.outcomes.into_iter().zip(names) {
            match outcome {
                Outcome::Created => summary.created += 1,
                Outcome::Overwritten => summary.overwritten += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed(reason) => {
                    summary.failed += 1;
                    summary.errors.push(ItemError {
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }

        summary.failed += self.prune_errors.len();
        summary.errors.extend(self.prune_errors);
        summary
    }
}
