use super::ConfigEvent;
use super::ConfigNode;
use super::ElementId;
use super::Placement;
use super::Subscription;
use super::Transaction;
use super::WatchStream;
use crate::ConfigPath;
use crate::Error;
use crate::Result;

fn unsupported(operation: &str) -> Error {
    Error::Unsupported(format!("{} on an unmodifiable config", operation))
}

/// Read-only view of a config subtree.
///
/// Reads and observation pass through; every mutating method fails with
/// [`Error::Unsupported`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UnmodifiableConfig(ConfigNode);

impl ConfigNode {
    pub fn unmodifiable(&self) -> UnmodifiableConfig {
        UnmodifiableConfig(self.clone())
    }
}

impl UnmodifiableConfig {
    pub fn name(&self) -> String {
        self.0.name()
    }

    pub fn value(&self) -> Option<String> {
        self.0.value()
    }

    pub fn parent(&self) -> Option<UnmodifiableConfig> {
        self.0.parent().map(UnmodifiableConfig)
    }

    pub fn element_id(&self) -> Option<ElementId> {
        self.0.element_id()
    }

    pub fn children(&self) -> Vec<UnmodifiableConfig> {
        self.0.children().into_iter().map(UnmodifiableConfig).collect()
    }

    pub fn child_named(
        &self,
        name: &str,
    ) -> Option<UnmodifiableConfig> {
        self.0.child_named(name).map(UnmodifiableConfig)
    }

    pub fn get(
        &self,
        path: &str,
    ) -> Result<Option<String>> {
        self.0.get(path)
    }

    pub fn path_string(&self) -> String {
        self.0.path_string()
    }

    pub fn stamp(&self) -> u64 {
        self.0.stamp()
    }

    pub fn watch(
        &self,
        path: &str,
    ) -> Result<WatchStream> {
        self.0.watch(path)
    }

    pub fn subscribe_fn<F>(
        &self,
        path: Option<ConfigPath>,
        on_event: F,
    ) -> Subscription
    where
        F: Fn(&ConfigEvent) + Send + Sync + 'static,
    {
        self.0.subscribe_fn(path, on_event)
    }

    /// Only read locks can be taken through this view.
    pub fn lock(
        &self,
        write: bool,
    ) -> Result<Transaction> {
        if write {
            return Err(unsupported("write lock"));
        }
        Ok(self.0.lock(false, None))
    }

    pub fn add_child<F>(
        &self,
        _placement: Placement,
        _name: &str,
        _pre_init: F,
    ) -> Result<UnmodifiableConfig>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        Err(unsupported("add_child"))
    }

    pub fn remove(&self) -> Result<()> {
        Err(unsupported("remove"))
    }

    pub fn move_child(
        &self,
        _child: &UnmodifiableConfig,
        _placement: Placement,
    ) -> Result<UnmodifiableConfig> {
        Err(unsupported("move_child"))
    }

    pub fn set_name(
        &self,
        _name: &str,
    ) -> Result<()> {
        Err(unsupported("set_name"))
    }

    pub fn set_value(
        &self,
        _value: Option<&str>,
    ) -> Result<()> {
        Err(unsupported("set_value"))
    }

    pub fn set(
        &self,
        _path: &str,
        _value: Option<&str>,
    ) -> Result<()> {
        Err(unsupported("set"))
    }

    pub fn copy_from(
        &self,
        _source: &ConfigNode,
        _remove_extras: bool,
    ) -> Result<()> {
        Err(unsupported("copy_from"))
    }
}
