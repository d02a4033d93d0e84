//! Staged, single-transaction creation of new elements.

mod value_creator;
pub use value_creator::*;
