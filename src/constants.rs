// -
// Path syntax

/// Separates the segments of a path string
pub const PATH_SEPARATOR: char = '/';
/// Single-level wildcard suffix of a path segment
pub const ANY_NAME: &str = "*";
/// Multi-depth wildcard segment
pub const ANY_DEPTH: &str = "**";

pub(crate) const ATTRIBUTES_OPEN: char = '{';
pub(crate) const ATTRIBUTES_CLOSE: char = '}';
pub(crate) const ATTRIBUTE_SEPARATOR: char = ',';
pub(crate) const ATTRIBUTE_ASSIGN: char = '=';

// -
// Entity layout

/// Child marking an entity slot that holds no entity
pub const NULL_MARKER: &str = "null";
pub(crate) const NULL_MARKER_VALUE: &str = "true";

/// Element name used when a collection name cannot be singularized
pub(crate) const DEFAULT_ELEMENT_NAME: &str = "item";

// -
// Settings

pub(crate) const ENV_PREFIX: &str = "OBSERVE";
pub(crate) const ENV_SEPARATOR: &str = "__";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
