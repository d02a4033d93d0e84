use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tracing::trace;
use tracing::warn;

use crate::tree::Callback;
use crate::tree::ListenerList;
use crate::Cause;
use crate::ChangeKind;
use crate::ChildSet;
use crate::ChildSetChange;
use crate::ConfigEntity;
use crate::ConfigFormat;
use crate::ConfigNode;
use crate::ConfigPath;
use crate::ConfigType;
use crate::Error;
use crate::FormatSet;
use crate::ParseContext;
use crate::ParseSession;
use crate::Result;
use crate::Subscription;
use crate::ValueCreator;

/// A change of one element of a [`TypedValues`].
#[derive(Debug, Clone)]
pub struct ElementChange<T> {
    pub kind: ChangeKind,
    pub index: usize,
    pub config: ConfigNode,
    pub old_value: Option<T>,
    pub new_value: Option<T>,
    /// `None` when the whole collection was replaced
    pub cause: Option<Cause>,
}

/// Parsed value of one element, shared through the node's parsed-item cache.
struct ParsedCell<T> {
    slot: Mutex<Slot<T>>,
}

enum Slot<T> {
    Unparsed,
    Parsed(Option<T>),
}

impl<T: Clone> ParsedCell<T> {
    fn new() -> Self {
        ParsedCell {
            slot: Mutex::new(Slot::Unparsed),
        }
    }

    fn parsed(&self) -> Option<Option<T>> {
        match &*self.slot.lock() {
            Slot::Unparsed => None,
            Slot::Parsed(value) => Some(value.clone()),
        }
    }
}

/// Typed values of the members of a [`ChildSet`].
///
/// Each member is parsed when it appears, or on first read when
/// `views.lazy_elements` is set, and re-parsed incrementally when it changes.
/// Views sharing a [`ParseSession`] share parsed values, and a moved member
/// keeps its parsed value.
pub struct TypedValues<T> {
    inner: Arc<TypedValuesInner<T>>,
}

impl<T> Clone for TypedValues<T> {
    fn clone(&self) -> Self {
        TypedValues {
            inner: self.inner.clone(),
        }
    }
}

struct TypedValuesInner<T> {
    members: ChildSet,
    format: Arc<dyn ConfigFormat<T>>,
    formats: FormatSet,
    session: ParseSession,
    lazy: bool,
    state: Mutex<ValuesState<T>>,
    listeners: ListenerList<Callback<ElementChange<T>>>,
    subscription: Mutex<Option<Subscription>>,
}

struct ValuesState<T> {
    cells: Vec<(ConfigNode, Arc<ParsedCell<T>>)>,
    /// Cell of a member whose move is half done
    moving: Option<Arc<ParsedCell<T>>>,
}

impl<T: ConfigType> TypedValues<T> {
    pub fn new(
        root: &ConfigNode,
        path: &str,
        formats: &FormatSet,
    ) -> Result<Self> {
        Self::with_session(root, path, formats, ParseSession::new())
    }

    pub fn with_session(
        root: &ConfigNode,
        path: &str,
        formats: &FormatSet,
        session: ParseSession,
    ) -> Result<Self> {
        let _tx = root.lock(false, None);
        let members = ChildSet::new(root, ConfigPath::parse(path)?)?;
        let format = formats.format_for::<T>(members.element().name())?;
        let lazy = root.settings().views.lazy_elements;

        let inner = Arc::new(TypedValuesInner {
            members: members.clone(),
            format,
            formats: formats.clone(),
            session,
            lazy,
            state: Mutex::new(ValuesState {
                cells: Vec::new(),
                moving: None,
            }),
            listeners: ListenerList::new(),
            subscription: Mutex::new(None),
        });
        {
            let mut state = inner.state.lock();
            for config in members.values() {
                let cell = inner.cell_for(&config);
                state.cells.push((config, cell));
            }
        }
        let weak: Weak<TypedValuesInner<T>> = Arc::downgrade(&inner);
        let subscription = members.subscribe(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(change);
            }
        });
        *inner.subscription.lock() = Some(subscription);
        Ok(TypedValues { inner })
    }

    pub fn session(&self) -> &ParseSession {
        &self.inner.session
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of the element at `index`; `Ok(None)` for a null element.
    pub fn get(
        &self,
        index: usize,
    ) -> Result<Option<T>> {
        let _tx = self.inner.members.root().lock(false, None);
        let (config, cell) = self.inner.member(index)?;
        self.inner.read(&config, &cell)
    }

    /// Values of the non-null elements, in order.
    pub fn values(&self) -> Result<Vec<T>> {
        let _tx = self.inner.members.root().lock(false, None);
        let cells = self.inner.state.lock().cells.clone();
        let mut values = Vec::with_capacity(cells.len());
        for (config, cell) in &cells {
            if let Some(value) = self.inner.read(config, cell)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    pub fn configs(&self) -> Vec<ConfigNode> {
        self.inner.state.lock().cells.iter().map(|(config, _)| config.clone()).collect()
    }

    /// Appends an element holding `value`.
    pub fn add(
        &self,
        value: &T,
    ) -> Result<ConfigNode> {
        self.inner
            .members
            .add(|child| self.inner.format.format(Some(value), None, child))
    }

    /// Formats `value` into the element at `index`.
    pub fn set(
        &self,
        index: usize,
        value: &T,
    ) -> Result<()> {
        let _tx = self.inner.members.root().lock(true, None);
        let (config, cell) = self.inner.member(index)?;
        let previous = cell.parsed().flatten();
        self.inner.format.format(Some(value), previous.as_ref(), &config)
    }

    pub fn remove(
        &self,
        index: usize,
    ) -> Result<()> {
        let _tx = self.inner.members.root().lock(true, None);
        let (config, _) = self.inner.member(index)?;
        config.remove();
        Ok(())
    }

    pub fn subscribe<F>(
        &self,
        on_change: F,
    ) -> Subscription
    where
        F: Fn(&ElementChange<T>) + Send + Sync + 'static,
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

impl<T: ConfigEntity> TypedValues<T> {
    /// Creator of a new element, with the attribute children the path's last
    /// segment requires.
    pub fn create(&self) -> Result<ValueCreator<T>> {
        let parent = self.inner.members.parent_or_create()?;
        let element = self.inner.members.element().clone();
        Ok(self
            .inner
            .formats
            .creator::<T>(&parent, element.name())?
            .with_element(element))
    }
}

impl<T: ConfigType> TypedValuesInner<T> {
    fn member(
        &self,
        index: usize,
    ) -> Result<(ConfigNode, Arc<ParsedCell<T>>)> {
        let state = self.state.lock();
        state.cells.get(index).cloned().ok_or_else(|| {
            Error::IllegalArgument(format!(
                "index {} is out of range for {} elements",
                index,
                state.cells.len()
            ))
        })
    }

    /// The cell cached for `config` in this session, or a new one.
    fn cell_for(
        &self,
        config: &ConfigNode,
    ) -> Arc<ParsedCell<T>> {
        let cell = config
            .parsed_item::<ParsedCell<T>>(&self.session)
            .unwrap_or_else(|| Arc::new(ParsedCell::new()));
        config.set_parsed_item(&self.session, &cell);
        if !self.lazy {
            if let Err(err) = self.read(config, &cell) {
                warn!(config = %config.path_string(), error = %err, "Element left unparsed");
            }
        }
        cell
    }

    fn read(
        &self,
        config: &ConfigNode,
        cell: &ParsedCell<T>,
    ) -> Result<Option<T>> {
        let mut slot = cell.slot.lock();
        if let Slot::Parsed(value) = &*slot {
            return Ok(value.clone());
        }
        let value = self.format.parse(ParseContext::of(config), None)?;
        *slot = Slot::Parsed(value.clone());
        Ok(value)
    }

    fn on_change(
        &self,
        change: &ChildSetChange,
    ) {
        let config = change.element();
        let is_move = change.event().is_some_and(|event| event.is_move());
        let cause = change.event().map(|event| event.cause().clone());
        let notice = {
            let mut state = self.state.lock();
            match change.kind() {
                ChangeKind::Add => {
                    // The moved node carries the cell over; keep it alive until then
                    let _moving = state.moving.take();
                    let cell = self.cell_for(config);
                    let new_value = cell.parsed().flatten();
                    let index = change.index().min(state.cells.len());
                    state.cells.insert(index, (config.clone(), cell));
                    Some((index, None, new_value))
                }
                ChangeKind::Remove => {
                    let index = change.index();
                    if index >= state.cells.len() {
                        return;
                    }
                    let (_, cell) = state.cells.remove(index);
                    let old_value = cell.parsed().flatten();
                    if is_move {
                        state.moving = Some(cell);
                    }
                    Some((index, old_value, None))
                }
                ChangeKind::Set => {
                    let Some((_, cell)) = state.cells.get(change.index()).cloned() else {
                        return;
                    };
                    self.reparse(config, &cell, change)
                        .map(|(old_value, new_value)| (change.index(), old_value, new_value))
                }
            }
        };
        let Some((index, old_value, new_value)) = notice else {
            return;
        };
        trace!(path = %self.members.path(), kind = %change.kind(), index, "Typed element changed");
        self.listeners.notify(&ElementChange {
            kind: change.kind(),
            index,
            config: config.clone(),
            old_value,
            new_value,
            cause,
        });
    }

    /// Re-parses a parsed element from the event under it. Unparsed elements
    /// stay unparsed until read.
    fn reparse(
        &self,
        config: &ConfigNode,
        cell: &ParsedCell<T>,
        change: &ChildSetChange,
    ) -> Option<(Option<T>, Option<T>)> {
        let mut slot = cell.slot.lock();
        let Slot::Parsed(previous) = &*slot else {
            return None;
        };
        let previous = previous.clone();
        let element_event = change.element_event();
        let context = ParseContext::of(config).with_change(element_event.as_ref());
        match self.format.parse(context, previous.clone()) {
            Ok(value) if value == previous => None,
            Ok(value) => {
                *slot = Slot::Parsed(value.clone());
                Some((previous, value))
            }
            Err(err) => {
                warn!(config = %config.path_string(), error = %err, "Keeping previous element after a failed re-parse");
                None
            }
        }
    }
}
