//! SQLite storage implementation.
//!
//! Provides the shipped variable store backend. Every write goes through
//! [`SqliteStorage::mutate`], which wraps the change in an immediate
//! transaction and records audit events before commit.

use crate::error::{Error, Result};
use crate::model::{Collection, Entry, StoreValue, TokenType};
use crate::storage::events::{insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use crate::storage::store::VariableStore;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Actor recorded on events when none is configured.
pub const DEFAULT_ACTOR: &str = "tokensync";

const VARIABLE_COLUMNS: &str = "id, collection_id, name, resolved_type, value, description";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    actor: String,
}

/// Context for a mutation operation.
///
/// Passed to mutation closures to collect audit events, which are written
/// in the same transaction as the change itself.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity_type, entity_id, event_type, &self.actor));
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value),
        );
    }
}

/// A collection with its entry count.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
    pub entries: usize,
    pub created_at: i64,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Default 5 second timeout
        let timeout = timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis);
        conn.busy_timeout(timeout)?;

        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// Set the actor recorded on audit events written through [`VariableStore`].
    #[must_use]
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        Ok(result)
    }

    // =====================
    // Collection Operations
    // =====================

    /// Create a new, empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the insert fails.
    pub fn insert_collection(&mut self, name: &str, actor: &str) -> Result<Collection> {
        let id = format!("coll_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("create_collection", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO collections (id, name, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, name, now],
            )?;

            ctx.record_event("collection", &id, EventType::CollectionCreated);

            Ok(Collection {
                id: id.clone(),
                name: name.to_string(),
            })
        })
    }

    /// Get a collection by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_collection_by_name(&self, name: &str) -> Result<Option<Collection>> {
        let collection = self
            .conn
            .query_row(
                "SELECT id, name FROM collections WHERE name = ?1",
                [name],
                |row| {
                    Ok(Collection {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(collection)
    }

    /// List all collections with entry counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.created_at, COUNT(v.id)
             FROM collections c
             LEFT JOIN variables v ON v.collection_id = c.id
             GROUP BY c.id
             ORDER BY c.name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CollectionInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                entries: row.get::<_, i64>(3)?.try_into().unwrap_or(0),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // ===================
    // Variable Operations
    // ===================

    /// Create a variable with no value.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist, the name is taken
    /// in the collection, or the insert fails.
    pub fn insert_variable(
        &mut self,
        collection_id: &str,
        name: &str,
        entry_type: TokenType,
        actor: &str,
    ) -> Result<Entry> {
        let id = format!("var_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("create_entry", actor, |tx, ctx| {
            let exists: bool = tx
                .query_row(
                    "SELECT 1 FROM collections WHERE id = ?1",
                    [collection_id],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if !exists {
                return Err(Error::CollectionNotFound {
                    name: collection_id.to_string(),
                });
            }

            tx.execute(
                "INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, collection_id, name, entry_type.as_str(), now],
            )?;

            ctx.record_change(
                "variable",
                &id,
                EventType::VariableCreated,
                None,
                Some(format!("{name}: {entry_type}")),
            );

            Ok(Entry {
                id: id.clone(),
                collection_id: collection_id.to_string(),
                full_name: name.to_string(),
                entry_type,
                value: None,
                description: None,
            })
        })
    }

    /// Get a variable by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_variable(&self, id: &str) -> Result<Option<Entry>> {
        select_variable(&self.conn, id)
    }

    /// Get a variable by name within a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_variable_by_name(&self, collection_id: &str, name: &str) -> Result<Option<Entry>> {
        let sql = format!(
            "SELECT {VARIABLE_COLUMNS} FROM variables WHERE collection_id = ?1 AND name = ?2"
        );
        let entry = self
            .conn
            .query_row(&sql, [collection_id, name], map_entry)
            .optional()?;
        Ok(entry)
    }

    /// List the variables of a collection, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_variables(&self, collection_id: &str) -> Result<Vec<Entry>> {
        let sql =
            format!("SELECT {VARIABLE_COLUMNS} FROM variables WHERE collection_id = ?1 ORDER BY name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([collection_id], map_entry)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Write a variable's value.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the variable or an alias target is missing,
    /// `TypeMismatch` if the value or alias target has a different type, or
    /// a database error if the update fails.
    pub fn update_variable_value(
        &mut self,
        id: &str,
        value: &StoreValue,
        actor: &str,
    ) -> Result<Entry> {
        let json = serde_json::to_string(value)?;
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("set_value", actor, |tx, ctx| {
            let entry = select_variable(tx, id)?.ok_or_else(|| Error::EntryNotFound {
                id: id.to_string(),
            })?;
            check_value(tx, &entry, value)?;

            tx.execute(
                "UPDATE variables SET value = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![json, now, id],
            )?;

            let old = entry.value.as_ref().map(serde_json::to_string).transpose()?;
            ctx.record_change("variable", id, EventType::VariableUpdated, old, Some(json.clone()));

            Ok(Entry {
                value: Some(value.clone()),
                ..entry
            })
        })
    }

    /// Replace a variable's description.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the variable is missing, or a database error.
    pub fn update_variable_description(
        &mut self,
        id: &str,
        description: Option<&str>,
        actor: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("set_description", actor, |tx, ctx| {
            let old: Option<Option<String>> = tx
                .query_row("SELECT description FROM variables WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(old) = old else {
                return Err(Error::EntryNotFound { id: id.to_string() });
            };

            if old.as_deref() == description {
                return Ok(());
            }

            tx.execute(
                "UPDATE variables SET description = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![description, now, id],
            )?;
            ctx.record_change(
                "variable",
                id,
                EventType::VariableUpdated,
                old,
                description.map(ToString::to_string),
            );
            Ok(())
        })
    }

    /// Delete a variable.
    ///
    /// Aliases pointing at the deleted variable are left without a value.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the variable is missing, or a database error.
    pub fn delete_variable(&mut self, id: &str, actor: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("delete_entry", actor, |tx, ctx| {
            let deleted = tx.execute("DELETE FROM variables WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(Error::EntryNotFound { id: id.to_string() });
            }

            let mut stmt = tx.prepare(
                "SELECT id FROM variables
                 WHERE json_extract(value, '$.kind') = 'alias' AND json_extract(value, '$.id') = ?1",
            )?;
            let dangling = stmt
                .query_map([id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for alias_id in &dangling {
                tx.execute(
                    "UPDATE variables SET value = NULL, updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, alias_id],
                )?;
                ctx.record_change("variable", alias_id, EventType::VariableUpdated, None, None);
            }

            ctx.record_event("variable", id, EventType::VariableDeleted);
            Ok(())
        })
    }
}

impl VariableStore for SqliteStorage {
    async fn find_collection(&mut self, name: &str) -> Result<Option<Collection>> {
        self.get_collection_by_name(name)
    }

    async fn create_collection(&mut self, name: &str) -> Result<Collection> {
        let actor = self.actor.clone();
        self.insert_collection(name, &actor)
    }

    async fn list_entries(&mut self, collection_id: &str) -> Result<Vec<Entry>> {
        self.get_variables(collection_id)
    }

    async fn create_entry(
        &mut self,
        collection_id: &str,
        full_name: &str,
        entry_type: TokenType,
    ) -> Result<Entry> {
        let actor = self.actor.clone();
        self.insert_variable(collection_id, full_name, entry_type, &actor)
    }

    async fn set_value(&mut self, entry: &Entry, value: &StoreValue) -> Result<Entry> {
        let actor = self.actor.clone();
        self.update_variable_value(&entry.id, value, &actor)
    }

    async fn set_description(&mut self, entry: &Entry, description: Option<&str>) -> Result<()> {
        let actor = self.actor.clone();
        self.update_variable_description(&entry.id, description, &actor)
    }

    async fn delete_entry(&mut self, entry: &Entry) -> Result<()> {
        let actor = self.actor.clone();
        self.delete_variable(&entry.id, &actor)
    }
}

fn select_variable(conn: &Connection, id: &str) -> Result<Option<Entry>> {
    let sql = format!("SELECT {VARIABLE_COLUMNS} FROM variables WHERE id = ?1");
    let entry = conn.query_row(&sql, [id], map_entry).optional()?;
    Ok(entry)
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let entry_type = row
        .get::<_, String>(3)?
        .parse::<TokenType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    let value = row
        .get::<_, Option<String>>(4)?
        .map(|json| serde_json::from_str::<StoreValue>(&json))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Entry {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        full_name: row.get(2)?,
        entry_type,
        value,
        description: row.get(5)?,
    })
}

/// Validate a value against the variable it is written to.
fn check_value(conn: &Connection, entry: &Entry, value: &StoreValue) -> Result<()> {
    let mismatch = |value_type: TokenType| Error::TypeMismatch {
        name: entry.full_name.clone(),
        expected: value_type.to_string(),
        actual: entry.entry_type.to_string(),
    };

    match value {
        StoreValue::Alias { id } if *id == entry.id => Err(Error::InvalidArgument(format!(
            "'{}' cannot alias itself",
            entry.full_name
        ))),
        StoreValue::Alias { id } => {
            let target = select_variable(conn, id)?
                .ok_or_else(|| Error::EntryNotFound { id: id.clone() })?;
            if target.entry_type == entry.entry_type {
                Ok(())
            } else {
                Err(mismatch(target.entry_type))
            }
        }
        literal if literal.fits(entry.entry_type) => Ok(()),
        literal => Err(mismatch(literal.literal_type().unwrap_or(entry.entry_type))),
    }
}
