//! Tree-view synchronization
//!
//! This module keeps a derived, read-only projection of the registry as a
//! list of display nodes and notifies observers when the registry changes.
//! Every refresh is a full re-derivation from the registry; no diffing is
//! performed, which is the right trade-off for a handful of connections.

mod node;

use tokio::sync::broadcast;

use crate::error::RegistryResult;
use crate::registry::ConnectionRegistry;

pub use node::{ChildLister, ChildNode, ConnectionNode};

/// Buffered events kept per subscriber before lagging
const EVENT_CAPACITY: usize = 16;

/// Notification emitted when the registry changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// The top-level node list must be re-fetched
    Refresh,
}

/// Publish/subscribe channel for registry change notifications
///
/// Every component that mutates the registry goes through the single
/// [`TreeNotifier::notify`] entry point; observers subscribe and re-fetch
/// the node list on each event. One notification is sent per logical
/// operation.
#[derive(Debug, Clone)]
pub struct TreeNotifier {
    tx: broadcast::Sender<TreeEvent>,
}

impl TreeNotifier {
    /// Creates a new notifier
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribes to change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.tx.subscribe()
    }

    /// Publishes a refresh event to all subscribers
    ///
    /// Sending with no live subscribers is not an error.
    pub fn notify(&self) {
        let _ = self.tx.send(TreeEvent::Refresh);
    }
}

impl Default for TreeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived tree projection of the registry
///
/// Holds the notification channel and rebuilds the display node list from
/// [`ConnectionRegistry::list`] on demand.
#[derive(Debug)]
pub struct TreeSync {
    notifier: TreeNotifier,
}

impl TreeSync {
    /// Creates a `TreeSync` sharing the given notification channel
    #[must_use]
    pub const fn new(notifier: TreeNotifier) -> Self {
        Self { notifier }
    }

    /// Subscribes to registry change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.notifier.subscribe()
    }

    /// Re-derives the top-level node list from the registry
    ///
    /// Listing self-heals the registry's invariants, so the returned nodes
    /// always carry at most one active marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    pub fn nodes(&self, registry: &mut ConnectionRegistry) -> RegistryResult<Vec<ConnectionNode>> {
        let records = registry.list()?;
        Ok(records.into_iter().map(ConnectionNode::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers_is_ok() {
        let notifier = TreeNotifier::new();
        notifier.notify();
    }

    #[tokio::test]
    async fn test_subscriber_receives_refresh() {
        let notifier = TreeNotifier::new();
        let mut rx = notifier.subscribe();
        notifier.notify();
        assert_eq!(rx.recv().await.unwrap(), TreeEvent::Refresh);
    }

    #[tokio::test]
    async fn test_each_notify_is_one_event() {
        let notifier = TreeNotifier::new();
        let mut rx = notifier.subscribe();
        notifier.notify();
        notifier.notify();
        assert_eq!(rx.recv().await.unwrap(), TreeEvent::Refresh);
        assert_eq!(rx.recv().await.unwrap(), TreeEvent::Refresh);
        assert!(rx.try_recv().is_err());
    }
}
