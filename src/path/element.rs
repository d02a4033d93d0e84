use std::fmt;

use indexmap::IndexMap;

use super::parser;
use super::parser::SegmentError;
use crate::constants::ANY_DEPTH;
use crate::constants::ANY_NAME;
use crate::errors::PathSyntaxError;
use crate::ChangeKind;
use crate::ConfigEvent;
use crate::ConfigNode;
use crate::Placement;
use crate::Result;

/// One segment of a [`ConfigPath`](super::ConfigPath).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    name: String,
    attributes: IndexMap<String, Option<String>>,
    multi: bool,
    multi_depth: bool,
}

impl PathElement {
    pub(crate) fn new(
        name: String,
        attributes: IndexMap<String, Option<String>>,
        multi: bool,
        multi_depth: bool,
    ) -> Self {
        PathElement {
            name,
            attributes,
            multi: multi || multi_depth,
            multi_depth,
        }
    }

    /// A literal segment with no predicate.
    pub fn named(name: &str) -> Self {
        Self::new(name.to_string(), IndexMap::new(), false, false)
    }

    pub fn parse(segment: &str) -> std::result::Result<Self, PathSyntaxError> {
        parser::parse_segment(segment).map_err(|err| match err {
            SegmentError::Empty => PathSyntaxError::EmptySegment {
                path: segment.to_string(),
                index: 0,
            },
            SegmentError::Syntax(err) => err,
        })
    }

    /// Literal name, or the name given to children created for a wildcard.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &IndexMap<String, Option<String>> {
        &self.attributes
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn is_multi_depth(&self) -> bool {
        self.multi_depth
    }

    /// Whether `config` satisfies this segment in its current state.
    pub fn matches(
        &self,
        config: &ConfigNode,
    ) -> bool {
        if !self.multi && !config.name_is(&self.name) {
            return false;
        }
        if self.attributes.is_empty() {
            return true;
        }
        let _tx = config.lock(false, None);
        let children = config.children();
        self.attributes
            .iter()
            .all(|(key, value)| children.iter().any(|child| attribute_matches(child, key, value.as_deref())))
    }

    /// Whether `config` satisfied this segment just before `change`.
    ///
    /// `change` is observed at the parent of `config`, so its relative path
    /// starts with `config`. The mutated node's state before the change is
    /// substituted for its live state.
    ///
    /// This is a query for observers that keep no membership of their own,
    /// typically to tell whether a child entered or left a segment from
    /// inside a listener. `ChildSet` tracks its members directly and does
    /// not need it.
    pub fn matched_before(
        &self,
        config: &ConfigNode,
        change: &ConfigEvent,
    ) -> bool {
        let path = change.relative_path();
        match path.len() {
            0 => self.matches(config),
            1 => {
                if change.kind() == ChangeKind::Add {
                    return false;
                }
                if !self.multi && change.old_name() != self.name {
                    return false;
                }
                self.attributes_match_with(config, None)
            }
            2 => {
                if !self.multi && !config.name_is(&self.name) {
                    return false;
                }
                self.attributes_match_with(config, Some(change))
            }
            _ => self.matches(config),
        }
    }

    /// Checks the predicate against `config`'s children, replacing the child
    /// changed by `change` with its former state.
    fn attributes_match_with(
        &self,
        config: &ConfigNode,
        change: Option<&ConfigEvent>,
    ) -> bool {
        if self.attributes.is_empty() {
            return true;
        }
        let _tx = config.lock(false, None);
        let changed = change.map(ConfigEvent::target);
        let children = config.children();
        self.attributes.iter().all(|(key, value)| {
            let expected = value.as_deref();
            if let Some(change) = change {
                if change.kind() != ChangeKind::Add
                    && change.old_name() == key.as_str()
                    && expected.map_or(true, |expected| change.old_value() == Some(expected))
                {
                    return true;
                }
            }
            children
                .iter()
                .filter(|child| Some(*child) != changed)
                .any(|child| attribute_matches(child, key, expected))
        })
    }

    /// Adds to `config` the attribute children this segment requires.
    pub fn populate(
        &self,
        config: &ConfigNode,
    ) -> Result<()> {
        for (key, value) in &self.attributes {
            if config.children().iter().any(|child| attribute_matches(child, key, value.as_deref())) {
                continue;
            }
            config.add_child(Placement::last(), key, |attribute| attribute.set_value(value.as_deref()))?;
        }
        Ok(())
    }
}

fn attribute_matches(
    child: &ConfigNode,
    key: &str,
    value: Option<&str>,
) -> bool {
    child.name_is(key) && value.map_or(true, |value| child.value_is(value))
}

impl fmt::Display for PathElement {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.multi_depth {
            f.write_str(ANY_DEPTH)?;
        } else if self.multi {
            f.write_str(ANY_NAME)?;
        }
        if !self.attributes.is_empty() {
            f.write_str("{")?;
            for (index, (key, value)) in self.attributes.iter().enumerate() {
                if index > 0 {
                    f.write_str(",")?;
                }
                f.write_str(key)?;
                if let Some(value) = value {
                    write!(f, "={}", value)?;
                }
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}
