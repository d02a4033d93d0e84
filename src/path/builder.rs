use indexmap::IndexMap;

use super::ConfigPath;
use super::PathElement;
use crate::errors::PathSyntaxError;
use crate::Error;
use crate::Result;

/// Builds a [`ConfigPath`] one segment at a time.
///
/// Each builder configures one segment. [`and_then`](Self::and_then) and
/// [`build`](Self::build) seal it; any further call on a sealed builder is an
/// illegal state.
#[derive(Debug)]
pub struct ConfigPathBuilder {
    path: Vec<PathElement>,
    name: String,
    attributes: IndexMap<String, Option<String>>,
    multi: bool,
    multi_depth: bool,
    used: bool,
}

impl ConfigPathBuilder {
    pub(crate) fn new(
        path: Vec<PathElement>,
        name: &str,
    ) -> Self {
        ConfigPathBuilder {
            path,
            name: name.to_string(),
            attributes: IndexMap::new(),
            multi: false,
            multi_depth: false,
            used: false,
        }
    }

    fn check_unused(&self) -> Result<()> {
        if self.used {
            return Err(Error::IllegalState("this builder has already been used".to_string()));
        }
        Ok(())
    }

    /// Requires a child named `name`, with `value` when given.
    pub fn with_attribute(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<&mut Self> {
        self.check_unused()?;
        if name.is_empty() {
            return Err(PathSyntaxError::EmptyAttributeName {
                segment: self.name.clone(),
            }
            .into());
        }
        self.attributes.insert(name.to_string(), value.map(str::to_string));
        Ok(self)
    }

    /// Makes the segment match any child, or with `deep` any descendant.
    pub fn multi(
        &mut self,
        deep: bool,
    ) -> Result<&mut Self> {
        self.check_unused()?;
        self.multi = true;
        self.multi_depth = deep;
        Ok(self)
    }

    fn seal(&mut self) -> Result<()> {
        self.check_unused()?;
        if self.multi_depth && !self.attributes.is_empty() {
            return Err(PathSyntaxError::AttributesOnMultiDepth {
                segment: self.name.clone(),
            }
            .into());
        }
        if !self.multi && self.name.is_empty() {
            return Err(Error::IllegalArgument("path segment name must not be empty".to_string()));
        }
        self.used = true;
        let name = if self.multi_depth {
            String::new()
        } else {
            std::mem::take(&mut self.name)
        };
        self.path.push(PathElement::new(
            name,
            std::mem::take(&mut self.attributes),
            self.multi,
            self.multi_depth,
        ));
        Ok(())
    }

    /// Seals this segment and starts the next one.
    pub fn and_then(
        &mut self,
        name: &str,
    ) -> Result<ConfigPathBuilder> {
        if !self.used && self.multi_depth {
            let mut path = ConfigPath::from_elements(self.path.clone()).to_string();
            if !path.is_empty() {
                path.push('/');
            }
            return Err(PathSyntaxError::MultiDepthNotLast {
                path: format!("{}**/{}", path, name),
            }
            .into());
        }
        self.seal()?;
        Ok(ConfigPathBuilder::new(std::mem::take(&mut self.path), name))
    }

    pub fn build(&mut self) -> Result<ConfigPath> {
        self.seal()?;
        Ok(ConfigPath::from_elements(std::mem::take(&mut self.path)))
    }
}
