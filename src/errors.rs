//! Error hierarchy of the observable config store.
//!
//! Structural failures (illegal argument/state, not found, unsupported) are
//! surfaced synchronously to the caller of the mutating or querying call.
//! Format failures always carry the offending text and the node path they
//! were read from.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a value the operation cannot accept
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// Operation is not valid in the current state of the handle or builder
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A literal path segment did not resolve and creation was not requested
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation attempted through a read-only view
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Malformed path expression
    #[error(transparent)]
    Path(#[from] PathSyntaxError),

    /// Textual value could not be parsed by its format
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Settings loading or validation failures
    #[error(transparent)]
    Settings(#[from] ConfigError),
}

impl Error {
    /// Path syntax errors are argument errors too.
    pub fn is_illegal_argument(&self) -> bool {
        matches!(self, Error::IllegalArgument(_) | Error::Path(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Error::IllegalState(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathSyntaxError {
    #[error("Empty segment at position {index} in path {path:?}")]
    EmptySegment { path: String, index: usize },

    #[error("Unbalanced braces in path segment {segment:?}")]
    UnbalancedBraces { segment: String },

    #[error("Empty attribute name in path segment {segment:?}")]
    EmptyAttributeName { segment: String },

    #[error("Duplicate attribute {attribute:?} in path segment {segment:?}")]
    DuplicateAttribute { segment: String, attribute: String },

    #[error("Unexpected text after attributes in path segment {segment:?}")]
    TrailingCharacters { segment: String },

    #[error("Multi-depth wildcard must be the last segment of {path:?}")]
    MultiDepthNotLast { path: String },

    #[error("Attributes are not allowed on a multi-depth wildcard: {segment:?}")]
    AttributesOnMultiDepth { segment: String },
}

/// A format could not turn the text stored in a node into a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to parse {text:?} at {context}: {reason}")]
pub struct ParseError {
    /// Offending text
    pub text: String,
    /// Path of the node the text was read from
    pub context: String,
    pub reason: String,
}

/// Failure reported by a [`TextFormat`](crate::TextFormat) before path context is known.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TextError(pub String);

impl TextError {
    pub fn new(reason: impl Into<String>) -> Self {
        TextError(reason.into())
    }
}
