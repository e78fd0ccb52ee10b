//! The single error type of the record store.
//!
//! # Design
//! Callers only ever need to tell "the store worked" from "the store broke".
//! Absent records are reported through `Option` / `bool` returns, so this
//! type has no not-found case. The underlying `rusqlite::Error` is kept as
//! the `source` for diagnostics.

use thiserror::Error;

/// A failure to open, read, write or commit against the backing database.
#[derive(Debug, Error)]
#[error("storage fault during {operation}: {source}")]
pub struct StorageFault {
    operation: &'static str,
    #[source]
    source: rusqlite::Error,
}

impl StorageFault {
    pub(crate) fn new(operation: &'static str, source: rusqlite::Error) -> Self {
        Self { operation, source }
    }

    /// Name of the store operation that failed (`"create"`, `"stats"`, ...).
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// True when the database stayed locked past the busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.source.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}
