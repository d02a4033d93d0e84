use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::ConfigFormat;
use crate::FormatSet;
use crate::Result;

/// Broad category of a configured value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Bool,
    Integer,
    Float,
    Duration,
    Instant,
    /// User scalar with its own text format
    Scalar,
    Optional,
    Collection,
    Entity,
}

/// Runtime description of a configured value type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    type_id: TypeId,
    name: &'static str,
    kind: ValueKind,
}

impl ValueType {
    pub fn of<T: 'static>(kind: ValueKind) -> Self {
        ValueType {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for ValueType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.kind)
    }
}

/// How elements of a collection are matched when it is re-formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Elements are the same when their values are equal
    Equality,
    /// No stable identity; the element at the same index is reused
    Positional,
}

/// A value type that can be stored in a config subtree.
pub trait ConfigType: Clone + PartialEq + Send + Sync + 'static {
    fn value_type() -> ValueType;

    /// Whether this value is stored as the absence of a node.
    fn is_null(&self) -> bool {
        false
    }

    fn identity() -> Identity {
        Identity::Equality
    }

    /// Format used when none is registered for this type; `config_name` is
    /// the name of the node values are stored under.
    fn default_format(
        formats: &FormatSet,
        config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<Self>>>;
}
