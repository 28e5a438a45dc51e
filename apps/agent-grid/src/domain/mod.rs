//! Domain Layer
//!
//! Pure business types and rules with no runtime or I/O dependencies.

pub mod market;
pub mod portfolio;
pub mod shared;
pub mod task;
