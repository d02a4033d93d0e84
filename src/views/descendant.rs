use std::fmt;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;

use super::resolver::PathResolver;
use crate::tree::Callback;
use crate::tree::ListenerList;
use crate::Cause;
use crate::ConfigEvent;
use crate::ConfigNode;
use crate::ConfigPath;
use crate::Error;
use crate::Result;
use crate::Subscription;

/// A change of the observed descendant's value.
#[derive(Debug, Clone)]
pub struct ValueChange {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub cause: Cause,
}

/// Live handle on the single descendant at a literal path.
///
/// The descendant may come and go; reads re-resolve only the levels whose
/// structure changed since the last read.
#[derive(Clone)]
pub struct DescendantValue {
    inner: Arc<DescendantInner>,
}

impl fmt::Debug for DescendantValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("DescendantValue")
            .field("path", &format_args!("{}", self.inner.resolver.path()))
            .field("value", &*self.inner.last_value.lock())
            .finish()
    }
}

struct DescendantInner {
    resolver: PathResolver,
    last_value: Mutex<Option<String>>,
    listeners: ListenerList<Callback<ValueChange>>,
    _subscription: Subscription,
}

impl DescendantValue {
    pub fn new(
        root: &ConfigNode,
        path: ConfigPath,
    ) -> Result<Self> {
        if path.is_multi() {
            return Err(Error::IllegalArgument(format!(
                "{} is not a literal path",
                path
            )));
        }
        let _tx = root.lock(false, None);
        let resolver = PathResolver::new(root.clone(), path);
        let initial = resolver.resolve().and_then(|node| node.value());
        let inner = Arc::new_cyclic(|weak: &Weak<DescendantInner>| {
            let weak = weak.clone();
            let subscription = root.subscribe_fn(None, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_event(event);
                }
            });
            DescendantInner {
                resolver,
                last_value: Mutex::new(initial),
                listeners: ListenerList::new(),
                _subscription: subscription,
            }
        });
        Ok(DescendantValue { inner })
    }

    pub fn parse(
        root: &ConfigNode,
        path: &str,
    ) -> Result<Self> {
        Self::new(root, ConfigPath::parse(path)?)
    }

    pub fn path(&self) -> &ConfigPath {
        self.inner.resolver.path()
    }

    /// The descendant, if it currently exists.
    pub fn get(&self) -> Option<ConfigNode> {
        self.inner.resolver.resolve()
    }

    pub fn value(&self) -> Option<String> {
        self.get().and_then(|node| node.value())
    }

    /// Sets the descendant's value, creating it and any missing ancestors.
    pub fn set_value(
        &self,
        value: Option<&str>,
        cause: Option<&Cause>,
    ) -> Result<()> {
        let root = self.inner.resolver.root();
        let _tx = root.lock(true, cause);
        let node = match self.get() {
            Some(node) => node,
            None => root
                .get_child(self.path(), true)?
                .ok_or_else(|| Error::IllegalState(format!("could not create {}", self.path())))?,
        };
        node.set_value(value)
    }

    /// Called with every change of the descendant's value, including it
    /// appearing or disappearing.
    pub fn subscribe<F>(
        &self,
        on_change: F,
    ) -> Subscription
    where
        F: Fn(&ValueChange) + Send + Sync + 'static,
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

impl DescendantInner {
    fn on_event(
        &self,
        event: &ConfigEvent,
    ) {
        // Attribute children sit one level below the descendant
        if event.relative_path().len() > self.resolver.depth() + 1 {
            return;
        }
        let new_value = self.resolver.resolve().and_then(|node| node.value());
        let old_value = {
            let mut last = self.last_value.lock();
            if *last == new_value {
                return;
            }
            std::mem::replace(&mut *last, new_value.clone())
        };
        self.listeners.notify(&ValueChange {
            old_value,
            new_value,
            cause: event.cause().clone(),
        });
    }
}
