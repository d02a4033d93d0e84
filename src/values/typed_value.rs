use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tracing::warn;

use crate::tree::Callback;
use crate::tree::ListenerList;
use crate::views::PathResolver;
use crate::Cause;
use crate::ConfigEvent;
use crate::ConfigFormat;
use crate::ConfigNode;
use crate::ConfigPath;
use crate::ConfigType;
use crate::Error;
use crate::FormatSet;
use crate::ParseContext;
use crate::Result;
use crate::Subscription;

/// A change of a typed value.
#[derive(Debug, Clone)]
pub struct TypedChange<T> {
    pub old_value: Option<T>,
    pub new_value: Option<T>,
    pub cause: Cause,
}

/// Typed value of the descendant at a literal path.
///
/// The value is parsed once and then re-parsed incrementally from the events
/// under the descendant; it is parsed in full when the descendant itself is
/// replaced.
pub struct TypedValue<T> {
    inner: Arc<TypedValueInner<T>>,
}

impl<T> Clone for TypedValue<T> {
    fn clone(&self) -> Self {
        TypedValue {
            inner: self.inner.clone(),
        }
    }
}

struct TypedValueInner<T> {
    resolver: PathResolver,
    format: Arc<dyn ConfigFormat<T>>,
    state: Mutex<ValueState<T>>,
    listeners: ListenerList<Callback<TypedChange<T>>>,
    _subscription: Subscription,
}

struct ValueState<T> {
    config: Option<ConfigNode>,
    value: Option<T>,
}

impl<T: ConfigType> TypedValue<T> {
    pub fn new(
        root: &ConfigNode,
        path: &str,
        formats: &FormatSet,
    ) -> Result<Self> {
        let path = ConfigPath::parse(path)?;
        if path.is_multi() {
            return Err(Error::IllegalArgument(format!("{} is not a literal path", path)));
        }
        let name = match path.last() {
            Some(last) => last.name().to_string(),
            None => root.name(),
        };
        let format = formats.format_for::<T>(&name)?;

        let _tx = root.lock(false, None);
        let resolver = PathResolver::new(root.clone(), path);
        let config = resolver.resolve();
        let value = format.parse(
            ParseContext {
                config: config.as_ref(),
                change: None,
            },
            None,
        )?;

        let inner = Arc::new_cyclic(|weak: &Weak<TypedValueInner<T>>| {
            let weak = weak.clone();
            let subscription = root.subscribe_fn(None, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_event(event);
                }
            });
            TypedValueInner {
                resolver,
                format,
                state: Mutex::new(ValueState { config, value }),
                listeners: ListenerList::new(),
                _subscription: subscription,
            }
        });
        Ok(TypedValue { inner })
    }

    pub fn path(&self) -> &ConfigPath {
        self.inner.resolver.path()
    }

    /// The node the value is read from, if it exists.
    pub fn config(&self) -> Option<ConfigNode> {
        self.inner.state.lock().config.clone()
    }

    pub fn get(&self) -> Option<T> {
        self.inner.state.lock().value.clone()
    }

    /// Formats `value` into the descendant, creating it when missing.
    pub fn set(
        &self,
        value: Option<&T>,
        cause: Option<&Cause>,
    ) -> Result<()> {
        let root = self.inner.resolver.root();
        let _tx = root.lock(true, cause);
        let config = match self.inner.resolver.resolve() {
            Some(config) => config,
            None if value.is_none() => return Ok(()),
            None => root
                .get_child(self.path(), true)?
                .ok_or_else(|| Error::IllegalState(format!("could not create {}", self.path())))?,
        };
        let previous = self.inner.state.lock().value.clone();
        self.inner.format.format(value, previous.as_ref(), &config)
    }

    pub fn subscribe<F>(
        &self,
        on_change: F,
    ) -> Subscription
    where
        F: Fn(&TypedChange<T>) + Send + Sync + 'static,
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

impl<T: ConfigType> TypedValueInner<T> {
    fn on_event(
        &self,
        event: &ConfigEvent,
    ) {
        let depth = self.resolver.depth();
        let config = self.resolver.resolve();
        let (old_value, new_value) = {
            let mut state = self.state.lock();
            let parsed = if config != state.config {
                self.format.parse(
                    ParseContext {
                        config: config.as_ref(),
                        change: None,
                    },
                    None,
                )
            } else if let Some(node) = &config {
                let path = event.relative_path();
                if depth > 0 && path.get(depth - 1) != Some(node) {
                    return;
                }
                let change = event.rebased(depth);
                self.format.parse(
                    ParseContext::of(node).with_change(change.as_ref()),
                    state.value.clone(),
                )
            } else {
                return;
            };

            state.config = config;
            let new_value = match parsed {
                Ok(value) => value,
                Err(err) => {
                    warn!(path = %self.resolver.path(), error = %err, "Keeping previous value after a failed re-parse");
                    return;
                }
            };
            if new_value == state.value {
                return;
            }
            (std::mem::replace(&mut state.value, new_value.clone()), new_value)
        };
        self.listeners.notify(&TypedChange {
            old_value,
            new_value,
            cause: event.cause().clone(),
        });
    }
}
