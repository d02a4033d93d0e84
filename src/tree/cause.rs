use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

static NEXT_CAUSE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the external action a set of change events descends from.
///
/// Causes compare by identity. A cause may itself be caused by another one,
/// forming the chain a consumer walks to tell "triggered by X" apart from
/// "downstream effect of X".
#[derive(Clone)]
pub struct Cause(Arc<CauseInner>);

struct CauseInner {
    id: u64,
    label: Option<String>,
    parent: Option<Cause>,
}

impl Cause {
    /// An anonymous root cause.
    pub fn new() -> Self {
        Self::create(None, None)
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self::create(Some(label.into()), None)
    }

    /// A new cause chained under this one.
    pub fn caused_by(
        &self,
        label: impl Into<String>,
    ) -> Self {
        Self::create(Some(label.into()), Some(self.clone()))
    }

    fn create(
        label: Option<String>,
        parent: Option<Cause>,
    ) -> Self {
        Cause(Arc::new(CauseInner {
            id: NEXT_CAUSE_ID.fetch_add(1, Ordering::Relaxed),
            label,
            parent,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn label(&self) -> Option<&str> {
        self.0.label.as_deref()
    }

    pub fn parent(&self) -> Option<&Cause> {
        self.0.parent.as_ref()
    }

    /// This cause followed by each of its ancestors.
    pub fn chain(&self) -> impl Iterator<Item = &Cause> {
        std::iter::successors(Some(self), |cause| cause.parent())
    }

    /// The outermost ancestor of the chain.
    pub fn root(&self) -> &Cause {
        self.chain().last().unwrap_or(self)
    }

    pub fn is_caused_by(
        &self,
        other: &Cause,
    ) -> bool {
        self.chain().any(|cause| cause == other)
    }
}

impl Default for Cause {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Cause {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Cause {}

impl std::hash::Hash for Cause {
    fn hash<H: std::hash::Hasher>(
        &self,
        state: &mut H,
    ) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Cause {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Cause {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.0.label {
            Some(label) => write!(f, "cause#{}({})", self.0.id, label),
            None => write!(f, "cause#{}", self.0.id),
        }
    }
}
