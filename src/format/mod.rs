//! Bidirectional mapping between config subtrees and typed values.
//!
//! A [`ConfigFormat`] writes a value into a node (`format`) and reads it back
//! (`parse`). Parsing may be incremental: given the previously parsed value
//! and the change event that invalidated it, a format re-reads only what the
//! event touched.

mod builtin;
mod collection;
mod entity;
mod optional;
mod registry;
mod scalar;
mod text;

pub use collection::CollectionFormat;
pub use entity::EntityFormat;
pub(crate) use entity::BoundField;
pub(crate) use entity::InheritedBound;
pub(crate) use entity::TypedBound;
pub use optional::OptionalFormat;
pub use registry::FormatSet;
pub use scalar::ScalarFormat;
pub use text::*;

use crate::ConfigEvent;
use crate::ConfigNode;
use crate::Result;

/// What a format parses from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext<'a> {
    /// Node holding the value; `None` when it does not exist
    pub config: Option<&'a ConfigNode>,
    /// Change that triggered the parse, as observed by `config`
    pub change: Option<&'a ConfigEvent>,
}

impl<'a> ParseContext<'a> {
    pub fn of(config: &'a ConfigNode) -> Self {
        ParseContext {
            config: Some(config),
            change: None,
        }
    }

    pub fn with_change(
        mut self,
        change: Option<&'a ConfigEvent>,
    ) -> Self {
        self.change = change;
        self
    }
}

pub trait ConfigFormat<T>: Send + Sync {
    /// Writes `value` into `config`; `None` is the null value. `previous` is
    /// the value `config` currently holds, when known.
    ///
    /// Implementations only write what differs, so formatting an unchanged
    /// value fires no events.
    fn format(
        &self,
        value: Option<&T>,
        previous: Option<&T>,
        config: &ConfigNode,
    ) -> Result<()>;

    /// Reads the value held by `context.config`; `Ok(None)` is the null value.
    ///
    /// With both `previous` and `context.change`, only the part of the value
    /// the change touched is re-read.
    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<T>,
    ) -> Result<Option<T>>;
}

#[cfg(test)]
mod text_test;
