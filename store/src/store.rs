//! `TodoStore`: connection-per-operation access to the `todos` table.
//!
//! # Design
//! Every public method goes through `with_connection`, which opens a fresh
//! connection, hands it to the operation, and drops it on every exit path.
//! Writes run in an immediate transaction so the write lock is taken up
//! front and SQLite's busy handler bounds the wait. A transaction that is
//! dropped without `commit` rolls back, so a failing write never leaves a
//! partial row behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::Deserialize;

use crate::clock::{Clock, LocalClock};
use crate::error::StorageFault;
use crate::types::{NewTodo, Todo, TodoPatch, TodoStats};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        due_date TEXT,
        completed BOOLEAN DEFAULT FALSE,
        created_at TEXT NOT NULL
    )";

const INSERT: &str =
    "INSERT INTO todos (title, description, due_date, created_at) VALUES (?1, ?2, ?3, ?4)";

const SELECT_ALL: &str = "
    SELECT id, title, description, due_date, completed, created_at
    FROM todos
    ORDER BY created_at DESC, id DESC";

const SELECT_ONE: &str = "
    SELECT id, title, description, due_date, completed, created_at
    FROM todos
    WHERE id = ?1";

// Each column has a presence flag and a value; unset columns keep their
// current value.
const UPDATE: &str = "
    UPDATE todos SET
        title = CASE WHEN ?1 THEN ?2 ELSE title END,
        description = CASE WHEN ?3 THEN ?4 ELSE description END,
        due_date = CASE WHEN ?5 THEN ?6 ELSE due_date END,
        completed = CASE WHEN ?7 THEN ?8 ELSE completed END
    WHERE id = ?9";

const DELETE: &str = "DELETE FROM todos WHERE id = ?1";

const STATS: &str = "
    SELECT COUNT(*), COALESCE(SUM(CASE WHEN completed THEN 1 ELSE 0 END), 0)
    FROM todos";

/// Where the database lives and how long a write may wait for the lock.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the SQLite database file. Created on first use.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Durable store of todo records.
///
/// Holds no connection between calls, so one instance can be shared behind
/// an `Arc` by any number of threads.
#[derive(Debug, Clone)]
pub struct TodoStore {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl TodoStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(LocalClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Create the `todos` table if it does not exist. Safe to call on every
    /// start; an existing table is left untouched.
    pub fn initialize(&self) -> Result<(), StorageFault> {
        self.with_connection("initialize", |conn| conn.execute_batch(CREATE_TABLE))?;
        log::info!("todo store initialized at {}", self.config.path.display());
        Ok(())
    }

    /// Insert a new, not yet completed record and return it as stored.
    pub fn create(&self, input: &NewTodo) -> Result<Todo, StorageFault> {
        let todo = self.with_connection("create", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            // Read under the write lock: created_at order follows commit order.
            let created_at = self.clock.now();
            tx.execute(
                INSERT,
                params![input.title, input.description, input.due_date, created_at],
            )?;
            let id = tx.last_insert_rowid();
            let todo = tx.query_row(SELECT_ONE, [id], row_to_todo)?;
            tx.commit()?;
            Ok(todo)
        })?;
        log::info!("created todo with id: {}", todo.id);
        Ok(todo)
    }

    /// Every record, newest first.
    pub fn list_all(&self) -> Result<Vec<Todo>, StorageFault> {
        let todos = self.with_connection("list_all", |conn| {
            let mut stmt = conn.prepare(SELECT_ALL)?;
            let rows = stmt.query_map([], row_to_todo)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        log::debug!("retrieved {} todos", todos.len());
        Ok(todos)
    }

    pub fn get(&self, id: i64) -> Result<Option<Todo>, StorageFault> {
        let todo = self.with_connection("get", |conn| {
            conn.query_row(SELECT_ONE, [id], row_to_todo).optional()
        })?;
        if todo.is_none() {
            log::debug!("todo not found with id: {id}");
        }
        Ok(todo)
    }

    /// Apply `patch` to record `id` and return the record as committed.
    ///
    /// Returns `None` when no record has that id. An empty patch writes
    /// nothing and returns the current record.
    pub fn update(&self, id: i64, patch: &TodoPatch) -> Result<Option<Todo>, StorageFault> {
        if patch.is_empty() {
            log::debug!("no fields to update for todo {id}");
            return self.with_connection("update", |conn| {
                conn.query_row(SELECT_ONE, [id], row_to_todo).optional()
            });
        }

        let updated = self.with_connection("update", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                UPDATE,
                params![
                    patch.title.is_set(),
                    patch.title.as_ref().into_option(),
                    patch.description.is_set(),
                    patch.description.as_ref().into_option().and_then(|d| d.as_deref()),
                    patch.due_date.is_set(),
                    patch.due_date.as_ref().into_option().and_then(|d| d.as_deref()),
                    patch.completed.is_set(),
                    patch.completed.as_ref().into_option(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let todo = tx.query_row(SELECT_ONE, [id], row_to_todo)?;
            tx.commit()?;
            Ok(Some(todo))
        })?;

        match &updated {
            Some(_) => log::info!("updated todo with id: {id}"),
            None => log::warn!("todo not found for update: {id}"),
        }
        Ok(updated)
    }

    /// Remove record `id`. Returns whether a record was actually removed.
    pub fn delete(&self, id: i64) -> Result<bool, StorageFault> {
        let deleted = self.with_connection("delete", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let removed = tx.execute(DELETE, [id])?;
            tx.commit()?;
            Ok(removed > 0)
        })?;

        if deleted {
            log::info!("deleted todo with id: {id}");
        } else {
            log::warn!("todo not found for deletion: {id}");
        }
        Ok(deleted)
    }

    /// Total, completed and pending counts from one read transaction.
    pub fn stats(&self) -> Result<TodoStats, StorageFault> {
        self.with_connection("stats", |conn| {
            let tx = conn.transaction()?;
            let (total, completed) = tx.query_row(STATS, [], |row| {
                Ok((count_column(row, 0)?, count_column(row, 1)?))
            })?;
            tx.commit()?;
            Ok(TodoStats::from_counts(total, completed))
        })
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.config.path)?;
        conn.busy_timeout(self.config.busy_timeout())?;
        Ok(conn)
    }

    /// Run `f` on a fresh connection. The connection is closed when this
    /// returns, whatever the outcome.
    fn with_connection<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageFault> {
        let result = self.connect().and_then(|mut conn| f(&mut conn));
        result.map_err(|source| {
            log::error!(
                "{operation} failed on {}: {source}",
                self.config.path.display()
            );
            StorageFault::new(operation, source)
        })
    }
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        completed: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        created_at: row.get(5)?,
    })
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}
