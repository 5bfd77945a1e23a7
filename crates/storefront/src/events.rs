//! State-change notifications.
//!
//! Every persisted mutation publishes one [`StateChange`] naming the slot that
//! changed. Presentation code subscribes once and re-reads whatever it shows
//! when an event arrives.

use tokio::sync::broadcast;
use tracing::trace;

/// Which piece of client state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChange {
    Products,
    Cart,
    Favorites,
    Session,
}

/// Broadcast sender shared by all services of one storefront.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<StateChange>,
}

impl Notifier {
    /// Create a notifier whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }

    /// Publish a change. Having no subscribers is fine.
    pub fn notify(&self, change: StateChange) {
        let receivers = self.tx.send(change).unwrap_or(0);
        trace!(?change, receivers, "State change published");
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers() {
        Notifier::new(4).notify(StateChange::Cart);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let notifier = Notifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.notify(StateChange::Cart);
        notifier.notify(StateChange::Session);
        assert_eq!(rx.try_recv().unwrap(), StateChange::Cart);
        assert_eq!(rx.try_recv().unwrap(), StateChange::Session);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let notifier = Notifier::new(0);
        let mut rx = notifier.subscribe();
        notifier.notify(StateChange::Favorites);
        assert_eq!(rx.try_recv().unwrap(), StateChange::Favorites);
    }
}
