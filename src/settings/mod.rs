//! Settings of the observable config store.
//!
//! Provides hierarchical loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
mod formats;
mod monitoring;
mod views;
mod watch;
pub use formats::*;
pub use monitoring::*;
pub use views::*;
pub use watch::*;

#[cfg(test)]
mod settings_test;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::constants::ENV_SEPARATOR;
use crate::Result;

/// Settings shared by every node of one config tree
///
/// Combines all subsystem settings with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables with the `OBSERVE__` prefix (highest priority)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Watch stream parameters
    #[serde(default)]
    pub watch: WatchConfig,
    /// Built-in text formats
    #[serde(default)]
    pub formats: FormatConfig,
    /// Typed live views
    #[serde(default)]
    pub views: ViewConfig,
    /// Prometheus counters
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Settings {
    /// Loads settings from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `OBSERVE__` prefix (highest priority)
    ///
    /// # Note
    /// Callers must call `validate()` before handing the settings to a tree.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("OBSERVE__WATCH__EVENT_QUEUE_SIZE", "64");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies additional overrides from a file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.watch.validate()?;
        self.formats.validate()?;
        Ok(self)
    }
}
