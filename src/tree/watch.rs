//! Asynchronous change streams.
//!
//! ```text
//! mutation ─► fire() ─► dispatch at each ancestor ─► ChannelObserver
//!                                                        │ try_send [non-blocking]
//!                                                        ▼
//!                                              bounded mpsc queue
//!                                                        │
//!                                                        ▼
//!                                               WatchStream (Stream)
//! ```
//!
//! Dispatch never waits on a consumer: when a queue is full the event is
//! dropped with a warning. Removing the watched node ends the stream after
//! the queued events have been read.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use super::ConfigEvent;
use super::ConfigNode;
use super::ConfigObserver;
use super::Subscription;
use crate::metrics::WATCH_EVENTS_DROPPED;
use crate::ConfigPath;
use crate::Result;

struct ChannelObserver {
    sender: Mutex<Option<mpsc::Sender<ConfigEvent>>>,
    completed: Arc<AtomicBool>,
    metrics_enabled: bool,
}

impl ConfigObserver for ChannelObserver {
    fn on_event(
        &self,
        event: &ConfigEvent,
    ) {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return;
        };
        if let Err(TrySendError::Full(dropped)) = sender.try_send(event.clone()) {
            warn!(event = %dropped, "Watch queue full, dropping config event");
            if self.metrics_enabled {
                WATCH_EVENTS_DROPPED.inc();
            }
        }
    }

    fn on_completed(
        &self,
        _event: &ConfigEvent,
    ) {
        self.completed.store(true, Ordering::Release);
        self.sender.lock().take();
    }
}

/// Live stream of change events observed at one node.
///
/// Dropping the stream unsubscribes.
pub struct WatchStream {
    receiver: mpsc::Receiver<ConfigEvent>,
    completed: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl WatchStream {
    /// Next queued event without waiting.
    pub fn try_next(&mut self) -> Option<ConfigEvent> {
        self.receiver.try_recv().ok()
    }

    /// Every queued event.
    pub fn drain(&mut self) -> Vec<ConfigEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Whether the watched node has been removed.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Stops receiving new events; queued events remain readable and the
    /// stream then ends.
    pub fn unsubscribe(&mut self) {
        self.subscription.take();
    }
}

impl fmt::Debug for WatchStream {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchStream")
            .field("subscribed", &self.subscription.is_some())
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl Stream for WatchStream {
    type Item = ConfigEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<ConfigEvent>> {
        self.receiver.poll_recv(cx)
    }
}

impl ConfigNode {
    /// Streams events whose relative path matches `path`.
    pub fn watch(
        &self,
        path: &str,
    ) -> Result<WatchStream> {
        let path = ConfigPath::parse(path)?;
        Ok(self.watch_path(Some(path)))
    }

    /// Streams every event observed at this node.
    pub fn watch_all(&self) -> WatchStream {
        self.watch_path(None)
    }

    pub fn watch_path(
        &self,
        path: Option<ConfigPath>,
    ) -> WatchStream {
        let (sender, receiver) = mpsc::channel(self.settings().watch.event_queue_size.max(1));
        let completed = Arc::new(AtomicBool::new(false));
        let observer = ChannelObserver {
            sender: Mutex::new(Some(sender)),
            completed: completed.clone(),
            metrics_enabled: self.settings().monitoring.metrics_enabled,
        };
        let subscription = self.subscribe(path, Arc::new(observer));
        WatchStream {
            receiver,
            completed,
            subscription: Some(subscription),
        }
    }
}
