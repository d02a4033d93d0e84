use std::fmt;

use super::ConfigNode;

/// Structural identity of a child within its parent.
///
/// A generation + slot token resolved through the parent. It stays valid
/// while the child keeps its place (sibling inserts and removals do not
/// affect it) and never resolves again once the child is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    slot: u32,
    generation: u32,
}

impl fmt::Debug for ElementId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ElementId({}v{})", self.slot, self.generation)
    }
}

struct Slot {
    generation: u32,
    node: Option<ConfigNode>,
}

/// Ordered children of one node, addressed by [`ElementId`].
#[derive(Default)]
pub(crate) struct ChildSlots {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Slot indexes in sibling order
    order: Vec<u32>,
}

impl ChildSlots {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn insert(
        &mut self,
        index: usize,
        node: ConfigNode,
    ) -> ElementId {
        let slot = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.generation = entry.generation.wrapping_add(1);
                entry.node = Some(node);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                (self.slots.len() - 1) as u32
            }
        };
        let index = index.min(self.order.len());
        self.order.insert(index, slot);
        ElementId {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    /// Unlinks the child, returning its former index.
    pub(crate) fn remove(
        &mut self,
        id: ElementId,
    ) -> Option<(usize, ConfigNode)> {
        let index = self.position(id)?;
        self.order.remove(index);
        let node = self.slots[id.slot as usize].node.take()?;
        self.free.push(id.slot);
        Some((index, node))
    }

    pub(crate) fn get(
        &self,
        id: ElementId,
    ) -> Option<&ConfigNode> {
        let entry = self.slots.get(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.node.as_ref()
    }

    pub(crate) fn position(
        &self,
        id: ElementId,
    ) -> Option<usize> {
        self.get(id)?;
        self.order.iter().position(|slot| *slot == id.slot)
    }

    pub(crate) fn at(
        &self,
        index: usize,
    ) -> Option<&ConfigNode> {
        let slot = *self.order.get(index)?;
        self.slots[slot as usize].node.as_ref()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ConfigNode> + '_ {
        self.order
            .iter()
            .filter_map(move |slot| self.slots[*slot as usize].node.as_ref())
    }

    pub(crate) fn nodes(&self) -> Vec<ConfigNode> {
        self.iter().cloned().collect()
    }
}
