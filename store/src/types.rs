//! Record, input and patch types owned by the store.

use serde::{Deserialize, Serialize};

/// A persisted todo record. Always an owned copy; mutating it does not touch
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: bool,
    pub created_at: String,
}

/// Input for `TodoStore::create`. New records always start not completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// One field of a partial update: either left alone or set to a value.
///
/// For nullable columns the value is itself an `Option`, so
/// `Field::Set(None)` clears the column while `Field::Unset` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Field::Set(_))
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Unset => Field::Unset,
            Field::Set(value) => Field::Set(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Unset => None,
            Field::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    /// `None` means "not supplied", not "set to null".
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Unset, Field::Set)
    }
}

/// A partial update. Only `Field::Set` entries are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Field<String>,
    pub description: Field<Option<String>>,
    pub due_date: Field<Option<String>>,
    pub completed: Field<bool>,
}

impl TodoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Field::Set(title.into());
        self
    }

    /// `None` clears the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Field::Set(description);
        self
    }

    /// `None` clears the due date.
    pub fn due_date(mut self, due_date: Option<String>) -> Self {
        self.due_date = Field::Set(due_date);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Field::Set(completed);
        self
    }

    /// True when no field is set; applying it changes nothing.
    pub fn is_empty(&self) -> bool {
        !(self.title.is_set()
            || self.description.is_set()
            || self.due_date.is_set()
            || self.completed.is_set())
    }
}

/// Aggregate counts taken from one snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
}

impl TodoStats {
    pub fn from_counts(total: u64, completed: u64) -> Self {
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patch_is_empty() {
        assert!(TodoPatch::new().is_empty());
    }

    #[test]
    fn clearing_a_nullable_field_is_not_empty() {
        let patch = TodoPatch::new().description(None);
        assert!(!patch.is_empty());
        assert_eq!(patch.description, Field::Set(None));
        assert_eq!(patch.title, Field::Unset);
    }

    #[test]
    fn setting_completed_false_is_not_empty() {
        let patch = TodoPatch::new().completed(false);
        assert!(!patch.is_empty());
        assert_eq!(patch.completed, Field::Set(false));
    }

    #[test]
    fn field_from_option_treats_none_as_unset() {
        assert_eq!(Field::<bool>::from(None), Field::Unset);
        assert_eq!(Field::from(Some(true)), Field::Set(true));
    }

    #[test]
    fn stats_pending_is_total_minus_completed() {
        let stats = TodoStats::from_counts(3, 1);
        assert_eq!(stats, TodoStats { total: 3, completed: 1, pending: 2 });
    }

    #[test]
    fn todo_serializes_nulls_explicitly() {
        let todo = Todo {
            id: 1,
            title: "Buy milk".to_string(),
            description: None,
            due_date: None,
            completed: false,
            created_at: "2025-09-01T12:00:00.000000".to_string(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["description"].is_null());
        assert!(json["due_date"].is_null());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn new_todo_builder_sets_optional_fields() {
        let input = NewTodo::new("Pay rent").description("March").due_date("2025-03-01");
        assert_eq!(input.title, "Pay rent");
        assert_eq!(input.description.as_deref(), Some("March"));
        assert_eq!(input.due_date.as_deref(), Some("2025-03-01"));
    }
}
