use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormatConfig {
    /// chrono pattern of the built-in instant text format
    #[serde(default = "default_instant_pattern")]
    pub instant_pattern: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            instant_pattern: default_instant_pattern(),
        }
    }
}

impl FormatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.instant_pattern.trim().is_empty() {
            return Err(Error::Settings(ConfigError::Message(
                "formats.instant_pattern must not be empty".into(),
            )));
        }
        Ok(())
    }
}

fn default_instant_pattern() -> String {
    "%d%m%Y %H:%M:%S%.3f".to_string()
}
