//! Task Execution Bounded Context
//!
//! Task records, their lifecycle statuses, and the book that tracks them
//! from submission to terminal result.

pub mod book;
pub mod errors;
pub mod model;
pub mod value_objects;

pub use book::{ActiveTask, CompletedTask, QueuedTask, TaskBook, TaskLocation};
pub use errors::TaskError;
pub use model::{ExecutionTask, Parameters, TaskResult, TaskUpdate};
pub use value_objects::{TaskStatus, TaskType};
