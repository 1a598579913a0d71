use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum TodoError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no to-do exists with the given id")]
    NotFound,
}

/// One task entry. Serialized with camelCase keys and an RFC 3339
/// `createdAt` timestamp in UTC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Creation input. Every field is optional at the wire level; [`TodoStore::create`]
/// rejects the request unless all three are present per [`present`].
///
/// Wrong-typed values deserialize as absent instead of failing the request,
/// so a numeric `title` fails validation rather than body parsing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    #[serde(default, deserialize_with = "string_or_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub due_date: Option<String>,
}

/// Update input. Absent, empty, and wrong-typed fields leave the stored
/// value untouched; in particular `completed` only changes when the body
/// carried a JSON boolean (the string `"false"` is ignored). Empty input
/// does not clear a field — there is no way to blank a text field here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, deserialize_with = "string_or_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "bool_or_none")]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub due_date: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn bool_or_none<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

/// A text field counts as present when it is non-null and non-empty after
/// trimming. The stored value keeps the caller's original text.
fn present(field: Option<&String>) -> Option<&String> {
    field.filter(|value| !value.trim().is_empty())
}

/// The in-memory collection and its id counter. Insertion order is the
/// list order. Ids are never reused: the counter moves forward exactly
/// once per successful create and never resets, deletes included.
#[derive(Debug, Clone)]
pub struct TodoStore {
    todos: Vec<Todo>,
    next_id: u64,
}

impl TodoStore {
    #[must_use]
    pub fn new() -> Self {
        Self { todos: Vec::new(), next_id: 1 }
    }

    /// The startup collection: one seed record, counter at 2.
    #[must_use]
    pub fn seeded() -> Self {
        let seed = Todo {
            id: 1,
            title: "Plan the cloud deployment".to_string(),
            description: "Draft the deployment checklist for the course project".to_string(),
            completed: false,
            due_date: "2025-06-25".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        Self { todos: vec![seed], next_id: 2 }
    }

    #[must_use]
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Append a new record with the next id and a fresh UTC timestamp.
    ///
    /// # Errors
    /// Returns `TodoError::Validation` when `title`, `description`, or
    /// `dueDate` is missing or empty; the collection and counter are left
    /// unchanged in that case.
    pub fn create(&mut self, input: NewTodo) -> Result<Todo, TodoError> {
        let mut missing = Vec::new();
        if present(input.title.as_ref()).is_none() {
            missing.push("title");
        }
        if present(input.description.as_ref()).is_none() {
            missing.push("description");
        }
        if present(input.due_date.as_ref()).is_none() {
            missing.push("dueDate");
        }
        if !missing.is_empty() {
            return Err(TodoError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let todo = Todo {
            id: self.next_id,
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            completed: false,
            due_date: input.due_date.unwrap_or_default(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.next_id += 1;
        self.todos.push(todo.clone());
        Ok(todo)
    }

    /// # Errors
    /// Returns `TodoError::NotFound` when no record carries `id`.
    pub fn get(&self, id: u64) -> Result<&Todo, TodoError> {
        self.todos.iter().find(|todo| todo.id == id).ok_or(TodoError::NotFound)
    }

    /// Merge `patch` into the record with `id`, in place. `id` and
    /// `createdAt` are never altered.
    ///
    /// # Errors
    /// Returns `TodoError::NotFound` when no record carries `id`.
    pub fn update(&mut self, id: u64, patch: TodoPatch) -> Result<Todo, TodoError> {
        let todo =
            self.todos.iter_mut().find(|todo| todo.id == id).ok_or(TodoError::NotFound)?;
        if let Some(title) = present(patch.title.as_ref()) {
            todo.title = title.clone();
        }
        if let Some(description) = present(patch.description.as_ref()) {
            todo.description = description.clone();
        }
        if let Some(due_date) = present(patch.due_date.as_ref()) {
            todo.due_date = due_date.clone();
        }
        if let Some(completed) = patch.completed {
            todo.completed = completed;
        }
        Ok(todo.clone())
    }

    /// Remove the record with `id` permanently; remaining records keep
    /// their relative order. The id is never handed out again.
    ///
    /// # Errors
    /// Returns `TodoError::NotFound` when no record carries `id`.
    pub fn delete(&mut self, id: u64) -> Result<(), TodoError> {
        let index =
            self.todos.iter().position(|todo| todo.id == id).ok_or(TodoError::NotFound)?;
        self.todos.remove(index);
        Ok(())
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}
