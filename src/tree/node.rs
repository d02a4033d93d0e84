use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use super::ChangeKind;
use super::ChildSlots;
use super::ConfigEvent;
use super::ConfigObserver;
use super::ElementId;
use super::FnObserver;
use super::ListenerList;
use super::ParseSession;
use super::ParsedItems;
use super::PathListener;
use super::Placement;
use super::Subscription;
use super::Transaction;
use super::TreeLock;
use crate::metrics::CONFIG_EVENTS_FIRED;
use crate::Cause;
use crate::ConfigPath;
use crate::Error;
use crate::Result;
use crate::Settings;

/// State shared by every node of one tree.
pub(crate) struct TreeShared {
    lock: Arc<TreeLock>,
    settings: Arc<Settings>,
}

pub(crate) struct NodeInner {
    tree: Arc<TreeShared>,
    state: RwLock<NodeState>,
    listeners: ListenerList<PathListener>,
    parsed_items: ParsedItems,
    stamp: AtomicU64,
    child_stamp: AtomicU64,
}

struct NodeState {
    name: String,
    value: Option<String>,
    parent: Weak<NodeInner>,
    element: Option<ElementId>,
    removed: bool,
    children: ChildSlots,
}

/// Handle to one node of a config tree.
///
/// Handles are cheap to clone and compare by node identity. A parent owns its
/// children; a child only refers back to its parent weakly.
#[derive(Clone)]
pub struct ConfigNode(Arc<NodeInner>);

pub(crate) fn validate_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::IllegalArgument("config name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

impl ConfigNode {
    /// Creates the root of a new tree with default settings.
    pub fn new_root(name: &str) -> Result<Self> {
        Self::new_root_with(name, Settings::default())
    }

    pub fn new_root_with(
        name: &str,
        settings: Settings,
    ) -> Result<Self> {
        let name = validate_name(name)?;
        let tree = Arc::new(TreeShared {
            lock: TreeLock::new(),
            settings: Arc::new(settings),
        });
        Ok(Self::detached(tree, name))
    }

    pub(crate) fn detached(
        tree: Arc<TreeShared>,
        name: String,
    ) -> Self {
        ConfigNode(Arc::new(NodeInner {
            tree,
            state: RwLock::new(NodeState {
                name,
                value: None,
                parent: Weak::new(),
                element: None,
                removed: false,
                children: ChildSlots::default(),
            }),
            listeners: ListenerList::new(),
            parsed_items: ParsedItems::default(),
            stamp: AtomicU64::new(0),
            child_stamp: AtomicU64::new(0),
        }))
    }

    pub fn settings(&self) -> &Settings {
        &self.0.tree.settings
    }

    pub(crate) fn tree(&self) -> &Arc<TreeShared> {
        &self.0.tree
    }

    pub(crate) fn same_tree(
        &self,
        other: &ConfigNode,
    ) -> bool {
        Arc::ptr_eq(&self.0.tree, &other.0.tree)
    }

    // -
    // Reads

    pub fn name(&self) -> String {
        self.0.state.read().name.clone()
    }

    pub fn value(&self) -> Option<String> {
        self.0.state.read().value.clone()
    }

    pub fn parent(&self) -> Option<ConfigNode> {
        self.0.state.read().parent.upgrade().map(ConfigNode)
    }

    pub fn root(&self) -> ConfigNode {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Structural identity within the parent; `None` for roots and removed nodes.
    pub fn element_id(&self) -> Option<ElementId> {
        self.0.state.read().element
    }

    pub fn is_removed(&self) -> bool {
        self.0.state.read().removed
    }

    pub fn children(&self) -> Vec<ConfigNode> {
        self.0.state.read().children.nodes()
    }

    pub fn child_count(&self) -> usize {
        self.0.state.read().children.len()
    }

    pub fn child_at(
        &self,
        index: usize,
    ) -> Option<ConfigNode> {
        self.0.state.read().children.at(index).cloned()
    }

    /// Resolves a structural identity; stale identities are an illegal state.
    pub fn child(
        &self,
        id: ElementId,
    ) -> Result<ConfigNode> {
        self.0.state.read().children.get(id).cloned().ok_or_else(|| {
            Error::IllegalState(format!("{:?} is no longer present in {}", id, self.path_string()))
        })
    }

    pub fn index_of(
        &self,
        id: ElementId,
    ) -> Option<usize> {
        self.0.state.read().children.position(id)
    }

    /// First child with the given name.
    pub fn child_named(
        &self,
        name: &str,
    ) -> Option<ConfigNode> {
        let state = self.0.state.read();
        let found = state.children.iter().find(|child| child.name_is(name)).cloned();
        found
    }

    pub fn children_named(
        &self,
        name: &str,
    ) -> Vec<ConfigNode> {
        let state = self.0.state.read();
        let found = state.children.iter().filter(|child| child.name_is(name)).cloned().collect();
        found
    }

    pub(crate) fn name_is(
        &self,
        name: &str,
    ) -> bool {
        self.0.state.read().name == name
    }

    pub(crate) fn value_is(
        &self,
        value: &str,
    ) -> bool {
        self.0.state.read().value.as_deref() == Some(value)
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.parent();
        while let Some(parent) = node {
            depth += 1;
            node = parent.parent();
        }
        depth
    }

    /// Names from the root down to this node, joined by `/`.
    pub fn path_string(&self) -> String {
        let mut names = vec![self.name()];
        let mut node = self.parent();
        while let Some(parent) = node {
            names.push(parent.name());
            node = parent.parent();
        }
        names.reverse();
        names.join("/")
    }

    /// Number of events this node has observed, its own and its descendants'.
    pub fn stamp(&self) -> u64 {
        self.0.stamp.load(Ordering::Acquire)
    }

    /// Changes to this node's direct structure: children added, removed or
    /// renamed, and changes to the children of its children.
    pub fn child_stamp(&self) -> u64 {
        self.0.child_stamp.load(Ordering::Acquire)
    }

    // -
    // Locking

    /// Locks the whole tree.
    ///
    /// The first write lock of a nested sequence establishes `cause` (or an
    /// anonymous cause) as the root cause of every event fired until the
    /// outermost transaction is dropped.
    pub fn lock(
        &self,
        write: bool,
        cause: Option<&Cause>,
    ) -> Transaction {
        self.0.tree.lock.lock(write, cause)
    }

    /// Like [`lock`](Self::lock), returning `None` instead of waiting.
    pub fn try_lock(
        &self,
        write: bool,
        cause: Option<&Cause>,
    ) -> Option<Transaction> {
        self.0.tree.lock.try_lock(write, cause)
    }

    // -
    // Mutations

    /// Adds a child named `name` at `placement`.
    ///
    /// `pre_init` populates the child before it is linked in, so observers
    /// only ever see the complete child in a single `add` event.
    pub fn add_child<F>(
        &self,
        placement: Placement,
        name: &str,
        pre_init: F,
    ) -> Result<ConfigNode>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        self.insert_child(placement, name, false, pre_init)
    }

    /// Appends an empty child.
    pub fn add(
        &self,
        name: &str,
    ) -> Result<ConfigNode> {
        self.insert_child(Placement::last(), name, false, |_| Ok(()))
    }

    fn insert_child<F>(
        &self,
        placement: Placement,
        name: &str,
        is_move: bool,
        pre_init: F,
    ) -> Result<ConfigNode>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        let name = validate_name(name)?;
        let _tx = self.lock(true, None);
        self.ensure_live()?;

        let child = ConfigNode::detached(self.0.tree.clone(), name);
        pre_init(&child)?;

        let element = {
            let mut state = self.0.state.write();
            let index = placement.resolve(&state.children)?;
            state.children.insert(index, child.clone())
        };
        let (child_name, child_value) = {
            let mut child_state = child.0.state.write();
            child_state.parent = Arc::downgrade(&self.0);
            child_state.element = Some(element);
            (child_state.name.clone(), child_state.value.clone())
        };
        debug!(parent = %self.path_string(), child = %child_name, is_move, "Config child added");

        self.fire(ChangeKind::Add, is_move, vec![child.clone()], child_name, child_value, None);
        Ok(child)
    }

    /// Removes this node from its parent.
    ///
    /// A no-op on roots and nodes that are already removed.
    pub fn remove(&self) {
        self.detach(false);
    }

    fn detach(
        &self,
        is_move: bool,
    ) -> bool {
        let _tx = self.lock(true, None);
        let (parent, element, name, value) = {
            let mut state = self.0.state.write();
            if state.removed {
                return false;
            }
            let Some(element) = state.element else {
                return false;
            };
            let Some(parent) = state.parent.upgrade() else {
                // Parent already dropped, nobody left to notify
                state.element = None;
                state.removed = true;
                return false;
            };
            (ConfigNode(parent), element, state.name.clone(), state.value.clone())
        };

        parent.0.state.write().children.remove(element);
        {
            let mut state = self.0.state.write();
            state.element = None;
            state.removed = true;
        }
        debug!(parent = %parent.path_string(), child = %name, is_move, "Config child removed");

        self.fire(ChangeKind::Remove, is_move, Vec::new(), name, value, Some(parent));

        if !is_move {
            self.0.parsed_items.clear();
        }
        self.0.listeners.take_all();
        self.0.state.write().parent = Weak::new();
        true
    }

    /// Moves `child` to `placement` among this node's children.
    ///
    /// Fires a `remove` and an `add` event, both flagged as a move. The new
    /// node is a deep copy of the old one, parsed items included; `on_removed`
    /// runs between the two halves.
    pub fn move_child<F>(
        &self,
        child: &ConfigNode,
        placement: Placement,
        on_removed: F,
    ) -> Result<ConfigNode>
    where
        F: FnOnce(&ConfigNode),
    {
        let _tx = self.lock(true, None);
        self.ensure_live()?;
        let element = child
            .element_id()
            .ok_or_else(|| Error::IllegalState(format!("{} has been removed", child.name())))?;
        if child.parent().as_ref() != Some(self) {
            return Err(Error::IllegalArgument(format!(
                "{} is not a child of {}",
                child.path_string(),
                self.path_string()
            )));
        }
        if placement.after == Some(element) || placement.before == Some(element) {
            return Err(Error::IllegalArgument(
                "a child cannot be placed relative to itself".to_string(),
            ));
        }
        placement.resolve(&self.0.state.read().children)?;

        child.detach(true);
        on_removed(child);
        let moved = self.insert_child(placement, &child.name(), true, |target| {
            target.fill_from(child, true);
            Ok(())
        })?;
        child.0.parsed_items.clear();
        Ok(moved)
    }

    pub fn set_name(
        &self,
        name: &str,
    ) -> Result<()> {
        let name = validate_name(name)?;
        let _tx = self.lock(true, None);
        self.ensure_live()?;
        let (old_name, value) = {
            let mut state = self.0.state.write();
            (std::mem::replace(&mut state.name, name), state.value.clone())
        };
        self.fire(ChangeKind::Set, false, Vec::new(), old_name, value, None);
        Ok(())
    }

    pub fn set_value(
        &self,
        value: Option<&str>,
    ) -> Result<()> {
        let _tx = self.lock(true, None);
        self.ensure_live()?;
        let (name, old_value) = {
            let mut state = self.0.state.write();
            let old_value = std::mem::replace(&mut state.value, value.map(str::to_string));
            (state.name.clone(), old_value)
        };
        self.fire(ChangeKind::Set, false, Vec::new(), name, old_value, None);
        Ok(())
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_removed() {
            return Err(Error::IllegalState(format!("{} has been removed", self.name())));
        }
        Ok(())
    }

    /// Copies value, children and optionally parsed items of `source` into
    /// this detached node without firing events.
    pub(crate) fn fill_from(
        &self,
        source: &ConfigNode,
        with_parsed_items: bool,
    ) {
        let (value, children) = {
            let state = source.0.state.read();
            (state.value.clone(), state.children.nodes())
        };
        self.0.state.write().value = value;
        if with_parsed_items {
            source.0.parsed_items.copy_to(&self.0.parsed_items);
        }
        for source_child in children {
            let copy = ConfigNode::detached(self.0.tree.clone(), source_child.name());
            copy.fill_from(&source_child, with_parsed_items);
            let element = {
                let mut state = self.0.state.write();
                let end = state.children.len();
                state.children.insert(end, copy.clone())
            };
            let mut copy_state = copy.0.state.write();
            copy_state.parent = Arc::downgrade(&self.0);
            copy_state.element = Some(element);
        }
    }

    // -
    // Events

    /// Fires one event at this node and bubbles it to the root.
    ///
    /// `former_parent` continues the bubbling of a node that was just unlinked.
    fn fire(
        &self,
        kind: ChangeKind,
        is_move: bool,
        relative_path: Vec<ConfigNode>,
        old_name: String,
        old_value: Option<String>,
        former_parent: Option<ConfigNode>,
    ) {
        let cause = self.0.tree.lock.current_cause().unwrap_or_default();
        if self.settings().monitoring.metrics_enabled {
            CONFIG_EVENTS_FIRED.with_label_values(&[kind.as_str()]).inc();
        }

        let mut event = ConfigEvent::new(
            kind,
            is_move,
            self.clone(),
            relative_path,
            old_name,
            old_value,
            cause,
        );
        trace!(event = %event, "Config event fired");

        let mut parent = former_parent.or_else(|| self.parent());
        loop {
            event.config().dispatch(&event);
            let Some(next) = parent else {
                break;
            };
            parent = next.parent();
            event = event.bubble(next);
        }
    }

    fn dispatch(
        &self,
        event: &ConfigEvent,
    ) {
        self.0.stamp.fetch_add(1, Ordering::AcqRel);
        if event.relative_path().len() <= 2 {
            self.0.child_stamp.fetch_add(1, Ordering::AcqRel);
        }

        if event.is_completion() {
            for entry in self.0.listeners.take_all().iter() {
                entry.listener().observer.on_completed(event);
            }
            return;
        }

        for entry in self.0.listeners.snapshot().iter() {
            if !entry.is_active() {
                continue;
            }
            let listener = entry.listener();
            let accepted = match &listener.path {
                Some(path) => path.matches(event.relative_path()),
                None => true,
            };
            if accepted {
                listener.observer.on_event(event);
            }
        }
    }

    // -
    // Observation

    /// Registers `observer` for events whose relative path matches `path`
    /// (every event when `path` is `None`).
    pub fn subscribe(
        &self,
        path: Option<ConfigPath>,
        observer: Arc<dyn ConfigObserver>,
    ) -> Subscription {
        let entry = self.0.listeners.add(PathListener { path, observer });
        let id = entry.id();
        trace!(config = %self.name(), listener_id = id, "Config listener registered");
        let node = Arc::downgrade(&self.0);
        Subscription::new(move || {
            entry.deactivate();
            if let Some(node) = node.upgrade() {
                node.listeners.remove(id);
                trace!(listener_id = id, "Config listener unregistered");
            }
        })
    }

    pub fn subscribe_fn<F>(
        &self,
        path: Option<ConfigPath>,
        on_event: F,
    ) -> Subscription
    where
        F: Fn(&ConfigEvent) + Send + Sync + 'static,
    {
        self.subscribe(path, Arc::new(FnObserver(on_event)))
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.len()
    }

    // -
    // Parsed items

    pub fn parsed_item<T: std::any::Any + Send + Sync>(
        &self,
        session: &ParseSession,
    ) -> Option<Arc<T>> {
        self.0.parsed_items.get(session)
    }

    /// Caches `item` for `session`, held weakly.
    pub fn set_parsed_item<T: std::any::Any + Send + Sync>(
        &self,
        session: &ParseSession,
        item: &Arc<T>,
    ) {
        self.0.parsed_items.put(session, item);
    }

    pub fn parsed_item_count(&self) -> usize {
        self.0.parsed_items.len()
    }
}

impl PartialEq for ConfigNode {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ConfigNode {}

impl std::hash::Hash for ConfigNode {
    fn hash<H: std::hash::Hasher>(
        &self,
        state: &mut H,
    ) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ConfigNode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.0.state.read();
        f.debug_struct("ConfigNode")
            .field("name", &state.name)
            .field("value", &state.value)
            .field("children", &state.children.len())
            .field("removed", &state.removed)
            .finish()
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}={}", self.path_string(), value),
            None => f.write_str(&self.path_string()),
        }
    }
}
