use std::sync::Arc;

use super::ConfigFormat;
use super::ParseContext;
use crate::ConfigNode;
use crate::Result;

/// Lifts a format of `T` to `Option<T>`; a null inner value parses as `None`.
pub struct OptionalFormat<T> {
    inner: Arc<dyn ConfigFormat<T>>,
}

impl<T> OptionalFormat<T> {
    pub fn new(inner: Arc<dyn ConfigFormat<T>>) -> Self {
        OptionalFormat { inner }
    }
}

impl<T> ConfigFormat<Option<T>> for OptionalFormat<T>
where
    T: Send + Sync + 'static,
{
    fn format(
        &self,
        value: Option<&Option<T>>,
        previous: Option<&Option<T>>,
        config: &ConfigNode,
    ) -> Result<()> {
        self.inner
            .format(value.and_then(Option::as_ref), previous.and_then(Option::as_ref), config)
    }

    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<Option<T>>,
    ) -> Result<Option<Option<T>>> {
        Ok(Some(self.inner.parse(context, previous.flatten())?))
    }
}
