use super::ChildSlots;
use super::ElementId;
use crate::Error;
use crate::Result;

/// Where a new child goes among its siblings.
///
/// `after` and `before` bound the allowed range; `prefer_first` picks the
/// lowest allowed index instead of the highest. With no bounds the range is
/// the whole child list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub after: Option<ElementId>,
    pub before: Option<ElementId>,
    pub prefer_first: bool,
}

impl Placement {
    pub fn last() -> Self {
        Self::default()
    }

    pub fn first() -> Self {
        Placement {
            prefer_first: true,
            ..Self::default()
        }
    }

    /// Directly after `element`.
    pub fn after(element: ElementId) -> Self {
        Placement {
            after: Some(element),
            before: None,
            prefer_first: true,
        }
    }

    /// Directly before `element`.
    pub fn before(element: ElementId) -> Self {
        Placement {
            after: None,
            before: Some(element),
            prefer_first: false,
        }
    }

    pub fn between(
        after: ElementId,
        before: ElementId,
    ) -> Self {
        Placement {
            after: Some(after),
            before: Some(before),
            prefer_first: true,
        }
    }

    pub fn prefer_first(
        mut self,
        prefer_first: bool,
    ) -> Self {
        self.prefer_first = prefer_first;
        self
    }

    pub(crate) fn resolve(
        &self,
        children: &ChildSlots,
    ) -> Result<usize> {
        let position = |id: ElementId| {
            children
                .position(id)
                .ok_or_else(|| Error::IllegalState(format!("placement anchor {:?} is no longer present", id)))
        };
        let after = self.after.map(position).transpose()?;
        let before = self.before.map(position).transpose()?;

        let low = after.map_or(0, |index| index + 1);
        let high = before.unwrap_or(children.len());
        if low > high {
            return Err(Error::IllegalArgument(format!(
                "placement after index {:?} does not precede placement before index {:?}",
                after, before
            )));
        }
        Ok(if self.prefer_first { low } else { high })
    }
}
