use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use super::ConfigFormat;
use super::FromStrFormat;
use super::ParseContext;
use super::TextFormat;
use crate::ConfigNode;
use crate::ParseError;
use crate::Result;

/// Stores a value as the text of a single node.
pub struct ScalarFormat<T: Send + Sync + 'static> {
    text: Arc<dyn TextFormat<T>>,
    default: Option<T>,
}

impl<T> ScalarFormat<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(text: Arc<dyn TextFormat<T>>) -> Self {
        ScalarFormat { text, default: None }
    }

    /// Value parsed when the node or its text is missing.
    pub fn with_default(
        mut self,
        default: T,
    ) -> Self {
        self.default = Some(default);
        self
    }

    pub fn text_format(&self) -> &Arc<dyn TextFormat<T>> {
        &self.text
    }
}

impl<T> ScalarFormat<T>
where
    T: FromStr + Display + Clone + Send + Sync + 'static,
    T::Err: Display,
{
    /// Scalar format over the type's `FromStr` and `Display` impls.
    pub fn via_from_str() -> Self {
        Self::new(Arc::new(FromStrFormat::<T>::new()))
    }
}

impl<T> ConfigFormat<T> for ScalarFormat<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn format(
        &self,
        value: Option<&T>,
        _previous: Option<&T>,
        config: &ConfigNode,
    ) -> Result<()> {
        let text = value.map(|value| self.text.format(value));
        if config.value() != text {
            config.set_value(text.as_deref())?;
        }
        Ok(())
    }

    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<T>,
    ) -> Result<Option<T>> {
        // Changes below the node do not touch its text
        if let (Some(change), Some(previous)) = (context.change, previous) {
            if !change.relative_path().is_empty() {
                return Ok(Some(previous));
            }
        }
        let Some(config) = context.config else {
            return Ok(self.default.clone());
        };
        let Some(text) = config.value() else {
            return Ok(self.default.clone());
        };
        match self.text.parse(&text) {
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(ParseError {
                text,
                context: config.path_string(),
                reason: err.to_string(),
            }
            .into()),
        }
    }
}
