//! Pure state transitions for the task list.
//!
//! [`reduce`] never touches its input: every branch builds a fresh
//! [`TaskState`] owning its own todo vector.

use crate::error::AppError;
use crate::model::{TaskState, Todo, TodoId, count};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    AddTodo(String),
    ToggleTodo(TodoId),
    DeleteTodo(TodoId),
    /// An action kind this reducer does not know. Passed through unchanged.
    Unknown(String),
}

impl TaskAction {
    pub fn kind(&self) -> &str {
        match self {
            Self::AddTodo(_) => "ADD_TODO",
            Self::ToggleTodo(_) => "TOGGLE_TODO",
            Self::DeleteTodo(_) => "DELETE_TODO",
            Self::Unknown(kind) => kind,
        }
    }

    /// Decodes `{"type": "...", "payload": ...}`.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| AppError::invalid_input(format!("action is not valid JSON: {err}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::invalid_input("action requires a string 'type'"))?;
        let payload = value.get("payload").unwrap_or(&Value::Null);

        match kind {
            "ADD_TODO" => payload
                .as_str()
                .map(|text| Self::AddTodo(text.to_string()))
                .ok_or_else(|| AppError::invalid_input("ADD_TODO payload must be a string")),
            "TOGGLE_TODO" => id_payload(kind, payload).map(Self::ToggleTodo),
            "DELETE_TODO" => id_payload(kind, payload).map(Self::DeleteTodo),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::AddTodo(text) => serde_json::json!({ "type": self.kind(), "payload": text }),
            Self::ToggleTodo(id) | Self::DeleteTodo(id) => {
                serde_json::json!({ "type": self.kind(), "payload": id.0 })
            }
            Self::Unknown(kind) => serde_json::json!({ "type": kind }),
        }
    }
}

fn id_payload(kind: &str, payload: &Value) -> Result<TodoId, AppError> {
    payload
        .as_i64()
        .map(TodoId)
        .ok_or_else(|| AppError::invalid_input(format!("{kind} payload must be an integer id")))
}

/// Source of wall-clock time for id generation.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).unwrap_or(i64::MAX)
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[derive(Clone)]
pub struct TaskEnvironment {
    pub clock: Arc<dyn Clock>,
}

impl TaskEnvironment {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Id for a todo appended to `state`: the clock reading, bumped past
    /// every id already present. When the largest id is `i64::MAX` the
    /// smallest free non-negative id is used instead.
    pub fn next_id(&self, state: &TaskState) -> TodoId {
        let now = self.clock.now_millis();
        match state.max_id() {
            Some(TodoId(max)) if max >= now => max
                .checked_add(1)
                .map(TodoId)
                .unwrap_or_else(|| smallest_free_id(state)),
            _ => TodoId(now),
        }
    }
}

fn smallest_free_id(state: &TaskState) -> TodoId {
    let taken: BTreeSet<i64> = state
        .todos()
        .iter()
        .map(|todo| todo.id.0)
        .filter(|id| *id >= 0)
        .collect();

    let mut candidate = 0;
    for id in taken {
        if id != candidate {
            break;
        }
        candidate += 1;
    }
    TodoId(candidate)
}

impl Default for TaskEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for TaskEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEnvironment").finish_non_exhaustive()
    }
}

pub fn reduce(state: &TaskState, action: &TaskAction, env: &TaskEnvironment) -> TaskState {
    match action {
        TaskAction::AddTodo(text) => {
            let todo = Todo {
                id: env.next_id(state),
                text: text.clone(),
                completed: false,
            };
            let mut todos = Vec::with_capacity(state.todos().len() + 1);
            todos.extend_from_slice(state.todos());
            todos.push(todo);

            TaskState::with_counters(
                todos,
                count(state.todos().len()).saturating_add(1),
                state.completed(),
                state.pending().saturating_add(1),
            )
        }
        TaskAction::ToggleTodo(id) => {
            let todos = state
                .todos()
                .iter()
                .map(|todo| {
                    if todo.id == *id {
                        Todo {
                            completed: !todo.completed,
                            ..todo.clone()
                        }
                    } else {
                        todo.clone()
                    }
                })
                .collect::<Vec<_>>();
            let completed = count(todos.iter().filter(|todo| todo.completed).count());
            let pending = count(todos.len()) - completed;

            TaskState::with_counters(todos, state.length(), completed, pending)
        }
        TaskAction::DeleteTodo(id) => {
            let todos = state
                .todos()
                .iter()
                .filter(|todo| todo.id != *id)
                .cloned()
                .collect();
            TaskState::from_todos(todos)
        }
        TaskAction::Unknown(kind) => {
            tracing::debug!(kind = %kind, "ignoring unknown action");
            state.clone()
        }
    }
}

/// [`reduce`] against the system clock.
pub fn apply(state: &TaskState, action: &TaskAction) -> TaskState {
    reduce(state, action, &TaskEnvironment::default())
}
