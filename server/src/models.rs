//! Request payloads and their validation.

use serde::{Deserialize, Deserializer};
use todo_store::{Field, NewTodo, TodoPatch};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

impl CreateTodo {
    pub fn into_new_todo(self) -> Result<NewTodo, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
        Ok(NewTodo {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
        })
    }
}

/// Update payload. The outer `Option` records whether the key was present in
/// the JSON at all; the inner one whether its value was `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Option<bool>>,
}

impl UpdateTodo {
    pub fn into_patch(self) -> Result<TodoPatch, ApiError> {
        let title = match self.title {
            None => Field::Unset,
            Some(Some(title)) if !title.trim().is_empty() => Field::Set(title),
            Some(_) => return Err(ApiError::Validation("Title cannot be empty".to_string())),
        };
        let completed = match self.completed {
            None => Field::Unset,
            Some(Some(completed)) => Field::Set(completed),
            Some(None) => {
                return Err(ApiError::Validation("Completed cannot be null".to_string()))
            }
        };
        Ok(TodoPatch {
            title,
            description: self.description.into(),
            due_date: self.due_date.into(),
            completed,
        })
    }
}

/// Only called when the key is present, so wrapping in `Some` marks presence.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(json: &str) -> Result<TodoPatch, ApiError> {
        serde_json::from_str::<UpdateTodo>(json).unwrap().into_patch()
    }

    #[test]
    fn create_requires_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"description":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_rejects_blank_title() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        assert!(matches!(input.into_new_todo(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_optional_fields_default_to_none() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        let new_todo = input.into_new_todo().unwrap();
        assert_eq!(new_todo, NewTodo::new("Buy milk"));
    }

    #[test]
    fn empty_update_is_empty_patch() {
        assert!(patch("{}").unwrap().is_empty());
    }

    #[test]
    fn absent_and_null_are_distinguished() {
        let p = patch(r#"{"description":null}"#).unwrap();
        assert_eq!(p.description, Field::Set(None));
        assert_eq!(p.due_date, Field::Unset);
        assert_eq!(p.title, Field::Unset);
    }

    #[test]
    fn explicit_false_is_set() {
        let p = patch(r#"{"completed":false}"#).unwrap();
        assert_eq!(p.completed, Field::Set(false));
    }

    #[test]
    fn null_title_is_rejected() {
        assert!(matches!(patch(r#"{"title":null}"#), Err(ApiError::Validation(_))));
        assert!(matches!(patch(r#"{"title":""}"#), Err(ApiError::Validation(_))));
    }

    #[test]
    fn null_completed_is_rejected() {
        assert!(matches!(patch(r#"{"completed":null}"#), Err(ApiError::Validation(_))));
    }

    #[test]
    fn full_update() {
        let p = patch(r#"{"title":"New","description":"d","due_date":"2025-01-01","completed":true}"#)
            .unwrap();
        assert_eq!(
            p,
            TodoPatch::new()
                .title("New")
                .description(Some("d".to_string()))
                .due_date(Some("2025-01-01".to_string()))
                .completed(true)
        );
    }
}
