use serde::Deserialize;
use serde::Serialize;

/// Defaults of typed live views
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ViewConfig {
    /// Parse collection elements on first read instead of when they appear
    ///
    /// Default: false
    #[serde(default)]
    pub lazy_elements: bool,
}
