use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
#[cfg(test)]
use mockall::automock;

use super::ConfigEvent;
use crate::ConfigPath;

/// Synchronous receiver of change events.
///
/// Called while the mutating thread holds the tree's write lock; the tree may
/// be read or mutated again from inside the callbacks.
#[cfg_attr(test, automock)]
pub trait ConfigObserver: Send + Sync {
    fn on_event(
        &self,
        event: &ConfigEvent,
    );

    /// The observed node was removed; no further events follow.
    fn on_completed(
        &self,
        event: &ConfigEvent,
    ) {
        let _ = event;
    }
}

/// Adapts a closure into a [`ConfigObserver`] that ignores completion.
pub(crate) struct FnObserver<F>(pub(crate) F);

impl<F> ConfigObserver for FnObserver<F>
where
    F: Fn(&ConfigEvent) + Send + Sync,
{
    fn on_event(
        &self,
        event: &ConfigEvent,
    ) {
        (self.0)(event)
    }
}

/// Observer registered on a node together with its path filter.
pub(crate) struct PathListener {
    pub(crate) path: Option<ConfigPath>,
    pub(crate) observer: Arc<dyn ConfigObserver>,
}

pub(crate) struct ListenerEntry<T> {
    id: u64,
    active: AtomicBool,
    listener: T,
}

impl<T> ListenerEntry<T> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn listener(&self) -> &T {
        &self.listener
    }
}

/// Copy-on-write listener list.
///
/// Dispatch iterates a snapshot, so listeners added or removed while an event
/// is being delivered never disturb the iteration in progress. A removed
/// listener is deactivated first and skipped even if still in a snapshot.
pub(crate) struct ListenerList<T> {
    next_id: AtomicU64,
    entries: ArcSwap<Vec<Arc<ListenerEntry<T>>>>,
}

impl<T> ListenerList<T> {
    pub(crate) fn new() -> Self {
        ListenerList {
            next_id: AtomicU64::new(1),
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn add(
        &self,
        listener: T,
    ) -> Arc<ListenerEntry<T>> {
        let entry = Arc::new(ListenerEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            listener,
        });
        self.entries.rcu(|current| {
            let mut next = current.to_vec();
            next.push(entry.clone());
            next
        });
        entry
    }

    pub(crate) fn remove(
        &self,
        id: u64,
    ) {
        self.entries.rcu(|current| {
            current
                .iter()
                .filter(|entry| {
                    if entry.id == id {
                        entry.deactivate();
                        false
                    } else {
                        true
                    }
                })
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<ListenerEntry<T>>>> {
        self.entries.load_full()
    }

    /// Detaches every listener, returning the ones that were registered.
    pub(crate) fn take_all(&self) -> Arc<Vec<Arc<ListenerEntry<T>>>> {
        let taken = self.entries.swap(Arc::new(Vec::new()));
        taken.iter().for_each(|entry| entry.deactivate());
        taken
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }
}

/// Callback registered on a live view.
pub(crate) type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

impl<E> ListenerList<Callback<E>> {
    pub(crate) fn notify(
        &self,
        event: &E,
    ) {
        for entry in self.snapshot().iter() {
            if entry.is_active() {
                (entry.listener)(event);
            }
        }
    }
}

/// Keeps a registration alive; dropping it unsubscribes.
///
/// Unsubscribing is safe from inside the callback being unsubscribed.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
