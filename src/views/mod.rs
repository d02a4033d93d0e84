//! Live views derived from a config tree.
//!
//! Views subscribe at their root and keep their own state in sync while the
//! tree mutates. Their change notifications run on the mutating thread, after
//! the view has updated itself.

mod child_set;
mod descendant;
mod resolver;

pub use child_set::*;
pub use descendant::*;
pub(crate) use resolver::PathResolver;
