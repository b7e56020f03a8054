mod todo;

pub(crate) use todo::count;
pub use todo::{TaskState, Todo, TodoId};
