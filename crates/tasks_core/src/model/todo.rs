use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a todo, milliseconds since the Unix epoch at creation time.
///
/// Stored ids are any JSON integer that fits in an `i64`, negative included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<i64>()
            .map(TodoId)
            .map_err(|_| AppError::invalid_input(format!("id must be an integer, got '{raw}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
}

/// Ordered todo list together with its cached counters.
///
/// The counters mirror the persisted layout. They are only written by the
/// reducer and by deserialization, so callers read them through accessors.
/// A loaded state may carry counters that disagree with `todos`; `len` and
/// `is_empty` always look at `todos` itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    todos: Vec<Todo>,
    length: i64,
    completed: i64,
    pending: i64,
}

/// Converts a collection size into a persisted counter.
pub(crate) fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl TaskState {
    /// Builds a state whose counters are recounted from `todos`.
    pub fn from_todos(todos: Vec<Todo>) -> Self {
        let length = count(todos.len());
        let completed = count(todos.iter().filter(|todo| todo.completed).count());
        Self {
            todos,
            length,
            completed,
            pending: length - completed,
        }
    }

    pub(crate) fn with_counters(todos: Vec<Todo>, length: i64, completed: i64, pending: i64) -> Self {
        Self {
            todos,
            length,
            completed,
            pending,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Stored `length` counter.
    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn completed(&self) -> i64 {
        self.completed
    }

    pub fn pending(&self) -> i64 {
        self.pending
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn max_id(&self) -> Option<TodoId> {
        self.todos.iter().map(|todo| todo.id).max()
    }

    /// True when the cached counters agree with the todo list.
    pub fn counters_consistent(&self) -> bool {
        let completed = count(self.todos.iter().filter(|todo| todo.completed).count());
        self.length == count(self.todos.len())
            && self.completed == completed
            && self.pending == self.length - completed
    }
}
