//! # Subscriber trait
//!
//! `Subscribe` plugs custom event handlers into the scheduler. Each subscriber
//! is driven by its own worker loop fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block workers, the retry timer,
//!   or other subscribers.
//! - On queue overflow events for that subscriber are dropped and a
//!   `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use session_scheduler::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct CreatedCounter(AtomicUsize);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for CreatedCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::SessionCreated {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "created-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
