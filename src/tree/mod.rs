//! The mutable config tree and its change protocol.
//!
//! Every node belongs to exactly one tree and every tree has one lock. All
//! mutations take the write lock, fire one event at the node they touch and
//! bubble it to the root, growing the relative path by one node per hop:
//!
//! ```text
//!   config              event(set, [server, port])   ◄─ watch("server/*") matches
//!     └─ server         event(set, [port])
//!          └─ port      event(set, [])               ◄─ set_value("9090")
//! ```
//!
//! Listeners run synchronously on the mutating thread while it holds the
//! write lock. They iterate a snapshot of the listener list, so subscribing
//! or unsubscribing from inside a callback is safe. Removing a node completes
//! its own listeners; ancestors keep observing through bubbling.

mod cause;
mod copy;
mod element;
mod event;
mod listeners;
mod lock;
mod navigation;
mod node;
mod parsed_items;
mod placement;
mod unmodifiable;
mod watch;

pub use cause::*;
pub use element::ElementId;
pub(crate) use element::ChildSlots;
pub use event::*;
pub(crate) use listeners::Callback;
pub(crate) use listeners::FnObserver;
pub(crate) use listeners::ListenerList;
pub(crate) use listeners::PathListener;
pub use listeners::ConfigObserver;
pub use listeners::Subscription;
#[cfg(test)]
pub use listeners::MockConfigObserver;
pub use lock::Transaction;
pub(crate) use lock::TreeLock;
pub use node::ConfigNode;
pub(crate) use node::validate_name;
pub use parsed_items::ParseSession;
pub(crate) use parsed_items::ParsedItems;
pub use placement::Placement;
pub use unmodifiable::UnmodifiableConfig;
pub use watch::WatchStream;

#[cfg(test)]
mod copy_test;
#[cfg(test)]
mod node_test;
