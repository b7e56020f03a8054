//! Task list state: a pure reducer over [`model::TaskState`], a validated
//! load path from key-value storage, and a session that persists changes.

pub mod config;
pub mod error;
pub mod initial_state;
pub mod model;
pub mod reducer;
pub mod session;
pub mod storage;

pub use error::AppError;
pub use initial_state::{load_initial_state, load_initial_state_from, validate_state};
pub use model::{TaskState, Todo, TodoId};
pub use reducer::{Clock, FixedClock, SystemClock, TaskAction, TaskEnvironment, apply, reduce};
pub use session::TaskSession;
pub use storage::{FileStore, KeyValueStore, MemoryStore, STATE_KEY};
