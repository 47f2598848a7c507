//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Workers, the
//! retry timer, and the scheduler publish; the scheduler's listener (and any
//! caller of [`Scheduler::bus`](crate::Scheduler::bus)) subscribes.
//!
//! ```text
//! Publishers (many):                 Subscribers:
//!   Worker 1  ──┐
//!   Worker N  ──┼──────► Bus ───────► listener ────► SubscriberSet
//!   Timer     ──┤  (broadcast chan) └─► user receivers (tests, metrics)
//!   Scheduler ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One bounded ring buffer is shared by all receivers; laggards observe
//!   `RecvError::Lagged(n)` and skip `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_after_subscribing() {
        let bus = Bus::new(8);
        bus.publish(Event::now(EventKind::RequestQueued).with_request(1));

        let mut rx = bus.subscribe();
        bus.publish(Event::now(EventKind::RequestQueued).with_request(2));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.request, Some(2));
    }

    #[test]
    fn publish_without_receivers_is_a_noop() {
        let bus = Bus::new(0);
        bus.publish(Event::now(EventKind::ShutdownRequested));
    }
}
