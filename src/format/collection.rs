use std::sync::Arc;

use tracing::trace;

use super::ConfigFormat;
use super::ParseContext;
use crate::utils::diff::diff;
use crate::utils::diff::DiffOp;
use crate::utils::naming::singularize;
use crate::ChangeKind;
use crate::ConfigEvent;
use crate::ConfigNode;
use crate::ConfigType;
use crate::ElementId;
use crate::FormatSet;
use crate::Identity;
use crate::Placement;
use crate::Result;

/// Stores a list as same-named element children of one node.
///
/// Re-formatting keeps the children whose elements survive: with
/// [`Identity::Equality`] elements are matched by value and only inserted or
/// removed elements touch the tree; with [`Identity::Positional`] the child
/// at each index is updated in place.
pub struct CollectionFormat<T> {
    element_name: String,
    element: Arc<dyn ConfigFormat<T>>,
    identity: Identity,
}

impl<T: ConfigType> CollectionFormat<T> {
    pub fn new(
        element_name: &str,
        element: Arc<dyn ConfigFormat<T>>,
        identity: Identity,
    ) -> Self {
        CollectionFormat {
            element_name: element_name.to_string(),
            element,
            identity,
        }
    }

    /// Collection stored under `config_name`, elements named after its
    /// singular form.
    pub fn for_collection(
        formats: &FormatSet,
        config_name: &str,
    ) -> Result<Self> {
        let element_name = singularize(config_name);
        let element = formats.format_for::<T>(&element_name)?;
        Ok(Self::new(&element_name, element, T::identity()))
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    fn format_by_equality(
        &self,
        items: &[T],
        config: &ConfigNode,
    ) -> Result<()> {
        let children = config.children_named(&self.element_name);
        let current: Vec<Option<T>> = children
            .iter()
            .map(|child| self.element.parse(ParseContext::of(child), None).ok().flatten())
            .collect();

        let mut anchor: Option<ElementId> = None;
        for op in diff(&current, items, |have, want| have.as_ref() == Some(want)) {
            match op {
                DiffOp::Keep { left, .. } => anchor = children[left].element_id(),
                DiffOp::Remove { left } => children[left].remove(),
                DiffOp::Insert { right } => {
                    let added = self.insert_element(config, anchor, &items[right])?;
                    anchor = added.element_id();
                }
            }
        }
        Ok(())
    }

    fn format_by_position(
        &self,
        items: &[T],
        previous: Option<&Vec<T>>,
        config: &ConfigNode,
    ) -> Result<()> {
        let children = config.children_named(&self.element_name);
        let mut anchor = children.last().and_then(ConfigNode::element_id);
        for (index, item) in items.iter().enumerate() {
            match children.get(index) {
                Some(child) => {
                    let previous = previous.and_then(|previous| previous.get(index));
                    self.element.format(Some(item), previous, child)?;
                }
                None => {
                    let added = self.insert_element(config, anchor, item)?;
                    anchor = added.element_id();
                }
            }
        }
        for child in children.iter().skip(items.len()) {
            child.remove();
        }
        Ok(())
    }

    /// Adds an element after `anchor`, or before the first element when
    /// there is none.
    fn insert_element(
        &self,
        config: &ConfigNode,
        anchor: Option<ElementId>,
        item: &T,
    ) -> Result<ConfigNode> {
        let placement = match anchor {
            Some(anchor) => Placement::after(anchor),
            None => config
                .child_named(&self.element_name)
                .and_then(|first| first.element_id())
                .map(Placement::before)
                .unwrap_or_else(Placement::last),
        };
        config.add_child(placement, &self.element_name, |child| {
            self.element.format(Some(item), None, child)
        })
    }

    /// `Ok(None)` asks for a full parse.
    fn parse_incremental(
        &self,
        children: &[ConfigNode],
        mut previous: Vec<T>,
        change: &ConfigEvent,
    ) -> Result<Option<Vec<T>>> {
        let path = change.relative_path();
        let Some(child) = path.first() else {
            return Ok(Some(previous));
        };
        let is_element = child.name_is(&self.element_name);
        if path.len() == 1 {
            match change.kind() {
                ChangeKind::Add | ChangeKind::Remove => {
                    return Ok(if is_element { None } else { Some(previous) });
                }
                ChangeKind::Set => {
                    let was_element = change.old_name() == self.element_name;
                    if is_element != was_element {
                        return Ok(None);
                    }
                }
            }
        }
        if !is_element {
            return Ok(Some(previous));
        }
        if previous.len() != children.len() {
            return Ok(None);
        }
        let Some(index) = children.iter().position(|candidate| candidate == child) else {
            return Ok(None);
        };
        let element_change = change.as_from_child();
        let context = ParseContext::of(child).with_change(element_change.as_ref());
        let item = previous.remove(index);
        match self.element.parse(context, Some(item))? {
            Some(item) => {
                trace!(config = %child.path_string(), index, "Collection element re-parsed");
                previous.insert(index, item);
                Ok(Some(previous))
            }
            None => Ok(None),
        }
    }
}

impl<T: ConfigType> ConfigFormat<Vec<T>> for CollectionFormat<T> {
    fn format(
        &self,
        value: Option<&Vec<T>>,
        previous: Option<&Vec<T>>,
        config: &ConfigNode,
    ) -> Result<()> {
        let items = value.map(Vec::as_slice).unwrap_or(&[]);
        let _tx = config.lock(true, None);
        match self.identity {
            Identity::Equality => self.format_by_equality(items, config),
            Identity::Positional => self.format_by_position(items, previous, config),
        }
    }

    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<Vec<T>>,
    ) -> Result<Option<Vec<T>>> {
        let Some(config) = context.config else {
            return Ok(Some(Vec::new()));
        };
        let _tx = config.lock(false, None);
        let children = config.children_named(&self.element_name);
        if let (Some(previous), Some(change)) = (previous, context.change) {
            if let Some(items) = self.parse_incremental(&children, previous, change)? {
                return Ok(Some(items));
            }
        }
        let mut items = Vec::with_capacity(children.len());
        for child in &children {
            if let Some(item) = self.element.parse(ParseContext::of(child), None)? {
                items.push(item);
            }
        }
        Ok(Some(items))
    }
}
