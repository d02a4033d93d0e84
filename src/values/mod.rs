//! Typed live views: values parsed from the tree and kept in sync with it.
//!
//! ```text
//!   root ──subscribe──► TypedValue<T>   (literal path, one value)
//!     │
//!     └──► ChildSet ──► TypedValues<T>  (one value per member, cached
//!                                        per parse session on the node)
//! ```

mod typed_value;
mod typed_values;
pub use typed_value::*;
pub use typed_values::*;
