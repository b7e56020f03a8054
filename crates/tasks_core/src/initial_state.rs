use crate::error::AppError;
use crate::model::TaskState;
use crate::storage::{KeyValueStore, STATE_KEY};

/// Parses a persisted state blob and checks its shape.
///
/// All four top-level fields must be present with the right types. The
/// counters are taken as stored; they are not checked against `todos`.
pub fn validate_state(raw: &str) -> Result<TaskState, AppError> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::invalid_data(format!("persisted task state rejected: {err}")))
}

/// Initial state from a raw stored value, falling back to the empty state.
pub fn load_initial_state(raw: Option<&str>) -> TaskState {
    let Some(raw) = raw else {
        return TaskState::default();
    };

    match validate_state(raw) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(error = %err, "discarding persisted task state");
            TaskState::default()
        }
    }
}

/// Reads [`STATE_KEY`] from `storage` and loads it like [`load_initial_state`].
pub fn load_initial_state_from<S: KeyValueStore + ?Sized>(storage: &S) -> TaskState {
    match storage.get(STATE_KEY) {
        Ok(raw) => load_initial_state(raw.as_deref()),
        Err(err) => {
            tracing::warn!(error = %err, "could not read persisted task state");
            TaskState::default()
        }
    }
}
