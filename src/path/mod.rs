//! Path expressions over config trees.
//!
//! A path is a `/`-separated run of segments. Each segment is a literal
//! name, a name followed by `*` (any single child; the name is only used
//! when a matching child has to be created), or `**` (any number of levels,
//! final segment only). A segment may carry an attribute predicate,
//! `name{key=value,other}`, requiring children named `key` with value
//! `value` and `other` with any value.

mod builder;
mod element;
mod parser;

pub use builder::ConfigPathBuilder;
pub use element::PathElement;

use std::fmt;
use std::str::FromStr;

use crate::constants::PATH_SEPARATOR;
use crate::errors::PathSyntaxError;
use crate::ConfigNode;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigPath {
    elements: Vec<PathElement>,
}

impl ConfigPath {
    /// Parses a path string. The empty string is the empty path, which only
    /// matches the observing node itself.
    pub fn parse(path: &str) -> std::result::Result<Self, PathSyntaxError> {
        parser::parse_path(path)
    }

    /// Starts building a path whose first segment is `name`.
    pub fn build(name: &str) -> ConfigPathBuilder {
        ConfigPathBuilder::new(Vec::new(), name)
    }

    pub(crate) fn from_elements(elements: Vec<PathElement>) -> Self {
        ConfigPath { elements }
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether any segment can match more than one node.
    pub fn is_multi(&self) -> bool {
        self.elements.iter().any(PathElement::is_multi)
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Every segment but the last; `None` for paths of fewer than two segments.
    pub fn parent(&self) -> Option<ConfigPath> {
        if self.elements.len() < 2 {
            return None;
        }
        Some(ConfigPath::from_elements(self.elements[..self.elements.len() - 1].to_vec()))
    }

    /// This path extended by `element`.
    pub fn then(
        &self,
        element: PathElement,
    ) -> std::result::Result<ConfigPath, PathSyntaxError> {
        if self.elements.last().is_some_and(PathElement::is_multi_depth) {
            return Err(PathSyntaxError::MultiDepthNotLast {
                path: format!("{}{}{}", self, PATH_SEPARATOR, element),
            });
        }
        let mut elements = self.elements.clone();
        elements.push(element);
        Ok(ConfigPath::from_elements(elements))
    }

    /// Matches a node sequence, typically the relative path of an event.
    ///
    /// Segments pair with nodes one to one; a trailing `**` also accepts any
    /// number of remaining nodes, zero included.
    pub fn matches(
        &self,
        path: &[ConfigNode],
    ) -> bool {
        let mut nodes = path.iter();
        for element in &self.elements {
            match nodes.next() {
                Some(node) => {
                    if !element.matches(node) {
                        return false;
                    }
                }
                None => {
                    if !element.is_multi_depth() {
                        return false;
                    }
                }
            }
        }
        if nodes.next().is_none() {
            return true;
        }
        self.elements.last().is_some_and(PathElement::is_multi_depth)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

impl FromStr for ConfigPath {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConfigPath::parse(s)
    }
}

#[cfg(test)]
mod path_test;
