use std::fmt;
use std::sync::Arc;

use super::Cause;
use super::ConfigNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Set,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Remove => "remove",
            ChangeKind::Set => "set",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one tree mutation as seen from one node.
///
/// The relative path runs from the observing node (`config`) down to the
/// node the mutation happened to; it is empty when they are the same node.
/// Bubbling toward the root produces a new event one element longer.
#[derive(Clone)]
pub struct ConfigEvent {
    kind: ChangeKind,
    is_move: bool,
    config: ConfigNode,
    relative_path: Arc<[ConfigNode]>,
    old_name: String,
    old_value: Option<String>,
    cause: Cause,
}

impl ConfigEvent {
    pub(crate) fn new(
        kind: ChangeKind,
        is_move: bool,
        config: ConfigNode,
        relative_path: Vec<ConfigNode>,
        old_name: String,
        old_value: Option<String>,
        cause: Cause,
    ) -> Self {
        ConfigEvent {
            kind,
            is_move,
            config,
            relative_path: relative_path.into(),
            old_name,
            old_value,
            cause,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Whether this add or remove is one half of a move.
    pub fn is_move(&self) -> bool {
        self.is_move
    }

    /// The node observing this event.
    pub fn config(&self) -> &ConfigNode {
        &self.config
    }

    /// The node the mutation physically occurred at.
    pub fn target(&self) -> &ConfigNode {
        self.relative_path.last().unwrap_or(&self.config)
    }

    pub fn relative_path(&self) -> &[ConfigNode] {
        &self.relative_path
    }

    /// Name of the target before a rename, its current name otherwise.
    pub fn old_name(&self) -> &str {
        &self.old_name
    }

    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Root cause of the transaction that fired this event.
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    pub fn causes(&self) -> impl Iterator<Item = &Cause> {
        self.cause.chain()
    }

    /// The same event as observed by the parent of `config`.
    pub(crate) fn bubble(
        &self,
        parent: ConfigNode,
    ) -> ConfigEvent {
        let mut path = Vec::with_capacity(self.relative_path.len() + 1);
        path.push(self.config.clone());
        path.extend(self.relative_path.iter().cloned());
        ConfigEvent {
            config: parent,
            relative_path: path.into(),
            old_name: self.old_name.clone(),
            old_value: self.old_value.clone(),
            cause: self.cause.clone(),
            ..*self
        }
    }

    /// The same event as observed by the first node of the relative path.
    pub fn as_from_child(&self) -> Option<ConfigEvent> {
        self.rebased(1)
    }

    /// The same event as observed `levels` nodes further down the relative path.
    pub fn rebased(
        &self,
        levels: usize,
    ) -> Option<ConfigEvent> {
        if levels == 0 {
            return Some(self.clone());
        }
        if levels > self.relative_path.len() {
            return None;
        }
        Some(ConfigEvent {
            config: self.relative_path[levels - 1].clone(),
            relative_path: self.relative_path[levels..].to_vec().into(),
            old_name: self.old_name.clone(),
            old_value: self.old_value.clone(),
            cause: self.cause.clone(),
            ..*self
        })
    }

    pub(crate) fn is_completion(&self) -> bool {
        self.kind == ChangeKind::Remove && self.relative_path.is_empty()
    }
}

impl fmt::Display for ConfigEvent {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.config.name(), self.kind)?;
        if self.is_move {
            f.write_str("(move)")?;
        }
        if !self.relative_path.is_empty() {
            let names: Vec<String> = self.relative_path.iter().map(|n| n.name()).collect();
            write!(f, " {}", names.join("/"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConfigEvent {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ConfigEvent")
            .field("event", &format_args!("{}", self))
            .field("old_name", &self.old_name)
            .field("old_value", &self.old_value)
            .field("cause", &self.cause)
            .finish()
    }
}
