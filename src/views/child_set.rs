use std::fmt;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tracing::trace;

use super::resolver::PathResolver;
use crate::tree::Callback;
use crate::tree::ListenerList;
use crate::ChangeKind;
use crate::ConfigEvent;
use crate::ConfigNode;
use crate::ConfigPath;
use crate::ElementId;
use crate::Error;
use crate::PathElement;
use crate::Placement;
use crate::Result;
use crate::Subscription;

/// One change of a [`ChildSet`]'s membership or of one member.
#[derive(Debug, Clone)]
pub struct ChildSetChange {
    kind: ChangeKind,
    index: usize,
    element: ConfigNode,
    event: Option<ConfigEvent>,
}

impl ChildSetChange {
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Index of the element in the set; for removals, the index it had.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn element(&self) -> &ConfigNode {
        &self.element
    }

    /// The underlying tree event as observed by the set's parent node.
    /// `None` when the whole set was replaced because its parent changed.
    pub fn event(&self) -> Option<&ConfigEvent> {
        self.event.as_ref()
    }

    /// The underlying tree event as observed by the element.
    pub fn element_event(&self) -> Option<ConfigEvent> {
        self.event.as_ref().and_then(ConfigEvent::as_from_child)
    }
}

/// Live set of the children of one parent that match a path's last segment.
///
/// The parent is the descendant at every segment but the last, which must be
/// literal. Members keep the parent's child order.
#[derive(Clone)]
pub struct ChildSet {
    inner: Arc<ChildSetInner>,
}

impl fmt::Debug for ChildSet {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ChildSet")
            .field("path", &format_args!("{}", self.inner.path))
            .field("len", &self.len())
            .finish()
    }
}

struct ChildSetInner {
    root: ConfigNode,
    path: ConfigPath,
    parent: Option<PathResolver>,
    last: PathElement,
    members: Mutex<Members>,
    listeners: ListenerList<Callback<ChildSetChange>>,
    _subscription: Subscription,
}

#[derive(Default)]
struct Members {
    parent: Option<ConfigNode>,
    nodes: Vec<ConfigNode>,
}

impl ChildSet {
    pub fn new(
        root: &ConfigNode,
        path: ConfigPath,
    ) -> Result<Self> {
        let last = path
            .last()
            .cloned()
            .ok_or_else(|| Error::IllegalArgument("a child set needs a non-empty path".to_string()))?;
        if last.is_multi_depth() {
            return Err(Error::IllegalArgument(format!(
                "{} cannot end with a multi-depth wildcard",
                path
            )));
        }
        let parent = match path.parent() {
            Some(parent_path) if parent_path.is_multi() => {
                return Err(Error::IllegalArgument(format!(
                    "only the last segment of {} may be a wildcard",
                    path
                )));
            }
            Some(parent_path) => Some(PathResolver::new(root.clone(), parent_path)),
            None => None,
        };

        let _tx = root.lock(false, None);
        let mut members = Members::default();
        members.parent = match &parent {
            Some(resolver) => resolver.resolve(),
            None => Some(root.clone()),
        };
        if let Some(parent_node) = &members.parent {
            members.nodes = parent_node.children().into_iter().filter(|child| last.matches(child)).collect();
        }

        let inner = Arc::new_cyclic(|weak: &Weak<ChildSetInner>| {
            let weak = weak.clone();
            let subscription = root.subscribe_fn(None, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_event(event);
                }
            });
            ChildSetInner {
                root: root.clone(),
                path,
                parent,
                last,
                members: Mutex::new(members),
                listeners: ListenerList::new(),
                _subscription: subscription,
            }
        });
        Ok(ChildSet { inner })
    }

    pub fn parse(
        root: &ConfigNode,
        path: &str,
    ) -> Result<Self> {
        Self::new(root, ConfigPath::parse(path)?)
    }

    pub fn path(&self) -> &ConfigPath {
        &self.inner.path
    }

    /// The segment members are matched against.
    pub fn element(&self) -> &PathElement {
        &self.inner.last
    }

    pub fn root(&self) -> &ConfigNode {
        &self.inner.root
    }

    pub fn parent(&self) -> Option<ConfigNode> {
        self.inner.members.lock().parent.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.members.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<ConfigNode> {
        self.inner.members.lock().nodes.get(index).cloned()
    }

    pub fn values(&self) -> Vec<ConfigNode> {
        self.inner.members.lock().nodes.clone()
    }

    pub fn index_of(
        &self,
        node: &ConfigNode,
    ) -> Option<usize> {
        self.inner.members.lock().nodes.iter().position(|member| member == node)
    }

    /// The member with structural identity `id`.
    pub fn element_by_id(
        &self,
        id: ElementId,
    ) -> Option<ConfigNode> {
        let members = self.inner.members.lock();
        members.nodes.iter().find(|member| member.element_id() == Some(id)).cloned()
    }

    /// The parent, created with its ancestors when missing.
    pub fn parent_or_create(&self) -> Result<ConfigNode> {
        match &self.inner.parent {
            Some(resolver) => self
                .inner
                .root
                .get_child(resolver.path(), true)?
                .ok_or_else(|| Error::IllegalState(format!("could not create {}", resolver.path()))),
            None => Ok(self.inner.root.clone()),
        }
    }

    /// Appends a new member.
    pub fn add<F>(
        &self,
        pre_init: F,
    ) -> Result<ConfigNode>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        self.add_at(Placement::last(), pre_init)
    }

    /// Adds a new member named after the last segment, with the attribute
    /// children its predicate requires, then runs `pre_init` on it.
    pub fn add_at<F>(
        &self,
        placement: Placement,
        pre_init: F,
    ) -> Result<ConfigNode>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        let _tx = self.inner.root.lock(true, None);
        let parent = self.parent_or_create()?;
        let last = &self.inner.last;
        parent.add_child(placement, last.name(), |child| {
            last.populate(child)?;
            pre_init(child)
        })
    }

    pub fn subscribe<F>(
        &self,
        on_change: F,
    ) -> Subscription
    where
        F: Fn(&ChildSetChange) + Send + Sync + 'static,
    {
        let entry = self.inner.listeners.add(Box::new(on_change));
        let id = entry.id();
        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            entry.deactivate();
            if let Some(inner) = inner.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }
}

impl ChildSetInner {
    fn parent_depth(&self) -> usize {
        self.parent.as_ref().map_or(0, PathResolver::depth)
    }

    fn on_event(
        &self,
        event: &ConfigEvent,
    ) {
        let changes = {
            let mut members = self.members.lock();
            self.apply(&mut members, event)
        };
        for change in &changes {
            trace!(path = %self.path, kind = %change.kind, index = change.index, "Child set changed");
            self.listeners.notify(change);
        }
    }

    fn apply(
        &self,
        members: &mut Members,
        event: &ConfigEvent,
    ) -> Vec<ChildSetChange> {
        let depth = self.parent_depth();
        let path = event.relative_path();
        let mut changes = Vec::new();

        if let Some(resolver) = &self.parent {
            if path.len() <= depth + 1 {
                let parent = resolver.resolve();
                if parent != members.parent {
                    self.reset(members, parent, &mut changes);
                    return changes;
                }
            }
        }
        let Some(parent) = members.parent.clone() else {
            return changes;
        };
        if path.len() <= depth || (depth > 0 && path[depth - 1] != parent) {
            return changes;
        }

        let child = &path[depth];
        let at_parent = event.rebased(depth);
        let index = members.nodes.iter().position(|member| member == child);
        let on_child = path.len() == depth + 1;

        match (event.kind(), on_child) {
            (ChangeKind::Add, true) => {
                if self.last.matches(child) {
                    let index = self.insert(members, &parent, child);
                    changes.push(change(ChangeKind::Add, index, child, at_parent));
                }
            }
            (ChangeKind::Remove, true) => {
                if let Some(index) = index {
                    members.nodes.remove(index);
                    changes.push(change(ChangeKind::Remove, index, child, at_parent));
                }
            }
            _ => {
                let now = child.parent().as_ref() == Some(&parent) && self.last.matches(child);
                match (index, now) {
                    (Some(index), true) => changes.push(change(ChangeKind::Set, index, child, at_parent)),
                    (Some(index), false) => {
                        members.nodes.remove(index);
                        changes.push(change(ChangeKind::Remove, index, child, at_parent));
                    }
                    (None, true) => {
                        let index = self.insert(members, &parent, child);
                        changes.push(change(ChangeKind::Add, index, child, at_parent));
                    }
                    (None, false) => {}
                }
            }
        }
        changes
    }

    fn insert(
        &self,
        members: &mut Members,
        parent: &ConfigNode,
        child: &ConfigNode,
    ) -> usize {
        let nodes: Vec<ConfigNode> = parent
            .children()
            .into_iter()
            .filter(|node| node == child || members.nodes.contains(node))
            .collect();
        let index = nodes.iter().position(|node| node == child).unwrap_or(nodes.len());
        members.nodes = nodes;
        index
    }

    /// Replaces every member after the parent itself changed.
    fn reset(
        &self,
        members: &mut Members,
        parent: Option<ConfigNode>,
        changes: &mut Vec<ChildSetChange>,
    ) {
        for (index, node) in members.nodes.drain(..).enumerate().rev() {
            changes.push(change(ChangeKind::Remove, index, &node, None));
        }
        if let Some(parent) = &parent {
            members.nodes = parent.children().into_iter().filter(|child| self.last.matches(child)).collect();
            for (index, node) in members.nodes.iter().enumerate() {
                changes.push(change(ChangeKind::Add, index, node, None));
            }
        }
        members.parent = parent;
    }
}

fn change(
    kind: ChangeKind,
    index: usize,
    element: &ConfigNode,
    event: Option<ConfigEvent>,
) -> ChildSetChange {
    ChildSetChange {
        kind,
        index,
        element: element.clone(),
        event,
    }
}
