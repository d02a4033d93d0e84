use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Parameters of [`WatchStream`](crate::WatchStream) queues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Capacity of each watch stream's event queue
    ///
    /// Events arriving while the queue is full are dropped with a warning,
    /// dispatch never blocks on a slow consumer.
    ///
    /// Default: 1024
    #[serde(default = "default_event_queue_size")]
    pub event_queue_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            event_queue_size: default_event_queue_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_queue_size == 0 {
            return Err(Error::Settings(ConfigError::Message(
                "watch.event_queue_size must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_event_queue_size() -> usize {
    1024
}
