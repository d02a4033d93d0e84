use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Weak;

use nanoid::nanoid;
use parking_lot::Mutex;

/// Scope under which parsed values are shared between views of one node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ParseSession {
    id: Arc<str>,
}

impl ParseSession {
    pub fn new() -> Self {
        ParseSession {
            id: nanoid!().into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Default for ParseSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParseSession {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ParseSession({})", self.id)
    }
}

/// Per-node side table of parsed values, one per session.
///
/// Entries are held weakly and vanish once the last strong holder drops the
/// value. The table is cleared when its node is removed.
#[derive(Default)]
pub(crate) struct ParsedItems {
    items: Mutex<HashMap<ParseSession, Weak<dyn Any + Send + Sync>>>,
}

impl ParsedItems {
    pub(crate) fn get<T: Any + Send + Sync>(
        &self,
        session: &ParseSession,
    ) -> Option<Arc<T>> {
        let mut items = self.items.lock();
        let item = match items.get(session).and_then(Weak::upgrade) {
            Some(item) => item,
            None => {
                items.remove(session);
                return None;
            }
        };
        item.downcast::<T>().ok()
    }

    /// Stores `item` for `session`; storing the held item again is a no-op.
    pub(crate) fn put<T: Any + Send + Sync>(
        &self,
        session: &ParseSession,
        item: &Arc<T>,
    ) {
        let mut items = self.items.lock();
        items.retain(|_, held| held.strong_count() > 0);
        if let Some(held) = items.get(session).and_then(Weak::upgrade) {
            if std::ptr::eq(Arc::as_ptr(&held) as *const u8, Arc::as_ptr(item) as *const u8) {
                return;
            }
        }
        let weak: Weak<T> = Arc::downgrade(item);
        let weak: Weak<dyn Any + Send + Sync> = weak;
        items.insert(session.clone(), weak);
    }

    pub(crate) fn clear(&self) {
        self.items.lock().clear();
    }

    pub(crate) fn copy_to(
        &self,
        target: &ParsedItems,
    ) {
        let items = self.items.lock();
        let mut target_items = target.items.lock();
        for (session, item) in items.iter() {
            if item.strong_count() > 0 {
                target_items.insert(session.clone(), item.clone());
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        let mut items = self.items.lock();
        items.retain(|_, held| held.strong_count() > 0);
        items.len()
    }
}
