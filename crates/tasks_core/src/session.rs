//! Owner of the live task state.
//!
//! A session loads the state once, runs every action through the reducer and
//! writes the result back to storage after each change.

use crate::error::AppError;
use crate::initial_state::load_initial_state_from;
use crate::model::TaskState;
use crate::reducer::{TaskAction, TaskEnvironment, reduce};
use crate::storage::{KeyValueStore, STATE_KEY};

#[derive(Debug)]
pub struct TaskSession<S: KeyValueStore> {
    storage: S,
    env: TaskEnvironment,
    state: TaskState,
}

impl<S: KeyValueStore> TaskSession<S> {
    pub fn open(storage: S, env: TaskEnvironment) -> Self {
        let state = load_initial_state_from(&storage);
        tracing::debug!(
            length = state.length(),
            completed = state.completed(),
            "task state loaded"
        );
        Self {
            storage,
            env,
            state,
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Applies `action` and persists the new state.
    ///
    /// The in-memory state advances even when the write fails; the error is
    /// still returned.
    pub fn dispatch(&mut self, action: &TaskAction) -> Result<&TaskState, AppError> {
        self.state = reduce(&self.state, action, &self.env);
        tracing::debug!(
            action = action.kind(),
            length = self.state.length(),
            pending = self.state.pending(),
            "action applied"
        );
        self.persist()?;
        Ok(&self.state)
    }

    pub fn persist(&mut self) -> Result<(), AppError> {
        let content = serde_json::to_string(&self.state)?;
        self.storage.set(STATE_KEY, &content)
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
