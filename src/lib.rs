//! # observe-config
//!
//! An in-process, observable, hierarchical configuration store.
//!
//! ## What this crate provides
//!
//! - **Config tree** - named nodes with an optional text value and ordered
//!   children, mutated under one reentrant tree lock
//! - **Causal events** - every mutation fires one event that bubbles to the
//!   root, tagged with the root cause of its transaction
//! - **Path queries** - `server/*{enabled=true}` style paths with wildcards,
//!   attribute predicates and multi-depth `**`
//! - **Live views** - single descendants, child sets and their typed values,
//!   kept in sync as the tree changes
//! - **Typed formats** - scalars, collections (diffed, not rebuilt) and
//!   declared entity types, with incremental re-parsing
//! - **Value creator** - stage an entity's fields and add it in one event
//!
//! ## Quick start
//!
//! ```ignore
//! let root = ConfigNode::new_root("config")?;
//! root.set("server/port", Some("8080"))?;
//!
//! let mut events = root.watch("server/*")?;
//! let port = TypedValue::<i32>::new(&root, "server/port", &FormatSet::new())?;
//! assert_eq!(port.get(), Some(8080));
//! ```
//!
//! Persistence is left to callers: anything that reads or writes files only
//! needs the mutation API, so its writes fire the same events as any other.

mod constants;
mod creator;
mod errors;
mod format;
pub mod metrics;
mod path;
mod settings;
mod tree;
mod types;
pub mod utils;
mod values;
mod views;

pub use constants::*;
pub use creator::*;
pub use errors::*;
pub use format::*;
pub use path::*;
pub use settings::*;
pub use tree::*;
pub use types::*;
pub use values::*;
pub use views::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
