use std::any::type_name;
use std::any::Any;
use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use tracing::debug;

use super::ConfigFormat;
use super::EntityFormat;
use super::ParseContext;
use super::ScalarFormat;
use super::TextFormat;
use crate::ConfigEntity;
use crate::ConfigNode;
use crate::ConfigType;
use crate::EntityType;
use crate::Error;
use crate::Result;
use crate::Settings;
use crate::ValueCreator;

type AnyArc = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FormatKey {
    /// Format of values stored under a node of the given name
    Named(TypeId, String),
    /// Entity format, independent of the node name
    Entity(TypeId),
}

/// Registry of the formats used to read and write typed values.
///
/// Formats are built on first use and cached. A format may depend on itself
/// through its element or field types (an entity holding a list of the same
/// entity); such cycles resolve to the format under construction.
#[derive(Clone)]
pub struct FormatSet {
    inner: Arc<FormatSetInner>,
}

struct FormatSetInner {
    settings: Settings,
    explicit: DashMap<TypeId, AnyArc>,
    formats: DashMap<FormatKey, AnyArc>,
    entity_types: DashMap<TypeId, AnyArc>,
    build_lock: ReentrantMutex<()>,
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatSet {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        FormatSet {
            inner: Arc::new(FormatSetInner {
                settings,
                explicit: DashMap::new(),
                formats: DashMap::new(),
                entity_types: DashMap::new(),
                build_lock: ReentrantMutex::new(()),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Uses `format` for every value of type `T`, replacing the default.
    pub fn register_format<T: ConfigType>(
        &self,
        format: Arc<dyn ConfigFormat<T>>,
    ) {
        self.inner.explicit.insert(TypeId::of::<T>(), Arc::new(format));
        // Built formats may have bound the previous format of T
        self.inner.formats.clear();
        debug!(value_type = type_name::<T>(), "Format registered");
    }

    /// Stores values of type `T` as node text using `text`.
    pub fn register_text_format<T: ConfigType>(
        &self,
        text: Arc<dyn TextFormat<T>>,
    ) {
        self.register_format::<T>(Arc::new(ScalarFormat::new(text)));
    }

    /// Format of values of type `T` stored under nodes named `config_name`.
    pub fn format_for<T: ConfigType>(
        &self,
        config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<T>>> {
        if let Some(format) = self.explicit::<T>() {
            return Ok(format);
        }
        let key = FormatKey::Named(TypeId::of::<T>(), config_name.to_string());
        self.cached(key, || T::default_format(self, config_name))
    }

    pub fn entity_type<E: ConfigEntity>(&self) -> Result<Arc<EntityType<E>>> {
        let found = self.inner.entity_types.get(&TypeId::of::<E>()).map(|entry| entry.value().clone());
        if let Some(entity_type) = found.and_then(|found| found.downcast::<EntityType<E>>().ok()) {
            return Ok(entity_type);
        }
        let entity_type = Arc::new(EntityType::<E>::build()?);
        self.inner.entity_types.insert(TypeId::of::<E>(), entity_type.clone());
        Ok(entity_type)
    }

    /// The reflected format of entity type `E`.
    pub fn entity_format<E: ConfigEntity>(&self) -> Result<Arc<dyn ConfigFormat<E>>> {
        self.cached(FormatKey::Entity(TypeId::of::<E>()), || {
            let entity_type = self.entity_type::<E>()?;
            Ok(Arc::new(EntityFormat::new(entity_type, self)?))
        })
    }

    /// Creator of a new `E` stored as a child `name` of `parent`.
    pub fn creator<E: ConfigEntity>(
        &self,
        parent: &ConfigNode,
        name: &str,
    ) -> Result<ValueCreator<E>> {
        ValueCreator::new(self, parent, name)
    }

    fn explicit<T: ConfigType>(&self) -> Option<Arc<dyn ConfigFormat<T>>> {
        let found = self.inner.explicit.get(&TypeId::of::<T>()).map(|entry| entry.value().clone())?;
        found
            .downcast::<Arc<dyn ConfigFormat<T>>>()
            .ok()
            .map(|format| format.as_ref().clone())
    }

    fn cached<T, B>(
        &self,
        key: FormatKey,
        build: B,
    ) -> Result<Arc<dyn ConfigFormat<T>>>
    where
        T: Send + Sync + 'static,
        B: FnOnce() -> Result<Arc<dyn ConfigFormat<T>>>,
    {
        if let Some(format) = self.lookup::<T>(&key).filter(|format| format.is_built()) {
            return Ok(format as Arc<dyn ConfigFormat<T>>);
        }
        let _guard = self.inner.build_lock.lock();
        // Unbuilt entries here belong to this thread's enclosing builds
        if let Some(format) = self.lookup::<T>(&key) {
            return Ok(format as Arc<dyn ConfigFormat<T>>);
        }
        let placeholder = Arc::new(LazyFormat::<T>::new());
        self.inner.formats.insert(key.clone(), placeholder.clone());
        match build() {
            Ok(format) => {
                let _ = placeholder.cell.set(format);
                debug!(value_type = type_name::<T>(), key = ?key, "Format built");
                Ok(placeholder as Arc<dyn ConfigFormat<T>>)
            }
            Err(err) => {
                self.inner.formats.remove(&key);
                Err(err)
            }
        }
    }

    fn lookup<T: Send + Sync + 'static>(
        &self,
        key: &FormatKey,
    ) -> Option<Arc<LazyFormat<T>>> {
        let found = self.inner.formats.get(key).map(|entry| entry.value().clone())?;
        found.downcast::<LazyFormat<T>>().ok()
    }
}

/// Cache slot of a format, filled once its construction completes.
struct LazyFormat<T> {
    cell: OnceCell<Arc<dyn ConfigFormat<T>>>,
}

impl<T> LazyFormat<T> {
    fn new() -> Self {
        LazyFormat { cell: OnceCell::new() }
    }

    fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }

    fn built(&self) -> Result<&Arc<dyn ConfigFormat<T>>> {
        self.cell.get().ok_or_else(|| {
            Error::IllegalState(format!(
                "format of {} is used while it is being built",
                type_name::<T>()
            ))
        })
    }
}

impl<T: Send + Sync + 'static> ConfigFormat<T> for LazyFormat<T> {
    fn format(
        &self,
        value: Option<&T>,
        previous: Option<&T>,
        config: &ConfigNode,
    ) -> Result<()> {
        self.built()?.format(value, previous, config)
    }

    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<T>,
    ) -> Result<Option<T>> {
        self.built()?.parse(context, previous)
    }
}
