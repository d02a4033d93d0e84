//! Shared helpers and sample entity types for unit tests.
mod common;
mod entities;

pub use common::*;
pub use entities::*;
