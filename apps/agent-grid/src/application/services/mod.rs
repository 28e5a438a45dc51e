//! Application Services

mod routine_registry;

pub use routine_registry::RoutineRegistry;
