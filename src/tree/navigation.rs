use super::ConfigNode;
use super::Placement;
use crate::ConfigPath;
use crate::Error;
use crate::PathElement;
use crate::Result;

impl ConfigNode {
    /// First child matching `element`, attributes included.
    pub fn find_child(
        &self,
        element: &PathElement,
    ) -> Option<ConfigNode> {
        self.children().into_iter().find(|child| element.matches(child))
    }

    /// Resolves a literal path below this node.
    ///
    /// With `create`, missing segments are added, each with the attribute
    /// children its segment requires.
    pub fn get_child(
        &self,
        path: &ConfigPath,
        create: bool,
    ) -> Result<Option<ConfigNode>> {
        self.get_child_with(path, create, |_| Ok(()))
    }

    /// Like [`get_child`](Self::get_child); `pre_add` initializes the last
    /// segment's node when it has to be created.
    pub fn get_child_with<F>(
        &self,
        path: &ConfigPath,
        create: bool,
        pre_add: F,
    ) -> Result<Option<ConfigNode>>
    where
        F: FnOnce(&ConfigNode) -> Result<()>,
    {
        if path.is_multi() {
            return Err(Error::IllegalArgument(format!(
                "wildcard path {} cannot resolve a single config",
                path
            )));
        }
        let _tx = self.lock(create, None);
        let mut pre_add = Some(pre_add);
        let last = path.elements().len().saturating_sub(1);
        let mut current = self.clone();
        for (index, element) in path.elements().iter().enumerate() {
            current = match current.find_child(element) {
                Some(child) => child,
                None if create => {
                    let init = if index == last { pre_add.take() } else { None };
                    current.add_child(Placement::last(), element.name(), |child| {
                        element.populate(child)?;
                        match init {
                            Some(init) => init(child),
                            None => Ok(()),
                        }
                    })?
                }
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    /// Resolves a literal path string, failing when it does not exist.
    pub fn require(
        &self,
        path: &str,
    ) -> Result<ConfigNode> {
        let parsed = ConfigPath::parse(path)?;
        self.get_child(&parsed, false)?
            .ok_or_else(|| Error::NotFound(format!("{} under {}", path, self.path_string())))
    }

    /// Value of the descendant at `path`, `None` when absent.
    pub fn get(
        &self,
        path: &str,
    ) -> Result<Option<String>> {
        let parsed = ConfigPath::parse(path)?;
        Ok(self.get_child(&parsed, false)?.and_then(|child| child.value()))
    }

    /// Sets the value of the descendant at `path`, creating it as needed.
    /// A `None` value removes the descendant.
    pub fn set(
        &self,
        path: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let parsed = ConfigPath::parse(path)?;
        let _tx = self.lock(true, None);
        match value {
            Some(value) => {
                if let Some(child) = self.get_child(&parsed, true)? {
                    child.set_value(Some(value))?;
                }
            }
            None => {
                if let Some(child) = self.get_child(&parsed, false)? {
                    child.remove();
                }
            }
        }
        Ok(())
    }
}
