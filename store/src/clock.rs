//! Timestamp source for `created_at`.

use std::fmt;

/// ISO-8601 layout used for every stored timestamp. Fixed width, so the
/// lexical order of two values matches their chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Produces the `created_at` value for new records.
///
/// One deployment must stick to one clock; mixing clocks with different
/// offsets breaks the newest-first ordering of `list_all`.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> String;
}

/// Local wall-clock time with microsecond precision.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> String {
        chrono::Local::now()
            .naive_local()
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}
