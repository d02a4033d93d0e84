use std::collections::HashMap;

use tracing::debug;

use super::ConfigNode;
use super::Placement;
use crate::Result;

impl ConfigNode {
    /// Merges `source` into this node.
    ///
    /// Each child of `source` is paired with the first unpaired child of the
    /// same name, wherever it sits, and merged recursively. Children only
    /// present in `source` are copied in after the previously merged child,
    /// and unpaired children here are removed when `remove_extras` is set.
    /// Existing children are never reordered. Values are only written when
    /// they differ, so repeating the call with an unchanged source fires no
    /// events.
    pub fn copy_from(
        &self,
        source: &ConfigNode,
        remove_extras: bool,
    ) -> Result<()> {
        let _tx = self.lock(true, None);
        let _source_tx = (!self.same_tree(source)).then(|| source.lock(false, None));
        self.ensure_live()?;
        debug!(target_config = %self.path_string(), source = %source.path_string(), remove_extras, "Copying config");
        self.merge_from(source, remove_extras)
    }

    fn merge_from(
        &self,
        source: &ConfigNode,
        remove_extras: bool,
    ) -> Result<()> {
        let source_value = source.value();
        if self.value() != source_value {
            self.set_value(source_value.as_deref())?;
        }

        let mut unpaired: Vec<Option<ConfigNode>> = self.children().into_iter().map(Some).collect();
        let mut previous: Option<ConfigNode> = None;
        let mut last_of_name: HashMap<String, ConfigNode> = HashMap::new();
        for source_child in source.children() {
            let name = source_child.name();
            let paired = unpaired
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|child| child.name_is(&name)))
                .and_then(Option::take);
            let merged = match paired {
                Some(child) => {
                    child.merge_from(&source_child, remove_extras)?;
                    child
                }
                None => {
                    // Same-named children keep source order, so a later copy pairs them alike
                    let anchor = self.later_of(previous.as_ref(), last_of_name.get(&name));
                    let placement = match anchor.and_then(ConfigNode::element_id) {
                        Some(anchor) => Placement::after(anchor),
                        None => Placement::first(),
                    };
                    self.add_child(placement, &name, |copy| {
                        copy.fill_from(&source_child, false);
                        Ok(())
                    })?
                }
            };
            last_of_name.insert(name, merged.clone());
            previous = Some(merged);
        }

        if remove_extras {
            for extra in unpaired.into_iter().flatten() {
                extra.remove();
            }
        }
        Ok(())
    }

    /// Whichever of two children comes last.
    fn later_of<'a>(
        &self,
        a: Option<&'a ConfigNode>,
        b: Option<&'a ConfigNode>,
    ) -> Option<&'a ConfigNode> {
        let position = |node: &ConfigNode| node.element_id().and_then(|id| self.index_of(id));
        match (a, b) {
            (Some(a), Some(b)) if position(b) > position(a) => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }
}
