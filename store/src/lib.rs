//! SQLite-backed record store for the todo service.
//!
//! # Overview
//! `TodoStore` owns the `todos` table and exposes create, list, get, update,
//! delete and stats operations. Every call opens its own connection, runs as
//! one transaction, and closes the connection before returning, so the store
//! keeps no state between calls besides its configuration.
//!
//! # Design
//! - "Not found" is part of the return type (`Option` / `bool`), never an
//!   error. The only error is `StorageFault`.
//! - Partial updates go through `TodoPatch`, whose fields are tri-state
//!   (`Field::Unset` vs `Field::Set`), so "leave alone" and "set to null"
//!   cannot be confused.
//! - The store is synchronous. Async callers should run it on a blocking
//!   thread.

pub mod clock;
pub mod error;
pub mod store;
pub mod types;

pub use clock::{Clock, LocalClock};
pub use error::StorageFault;
pub use store::{StoreConfig, TodoStore};
pub use types::{Field, NewTodo, Todo, TodoPatch, TodoStats};
