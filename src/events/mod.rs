//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler` (start, queue, shutdown), workers (attempt
//!   lifecycle), the retry timer (requeue, abandon on shutdown),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the scheduler's listener (fans out to `SubscriberSet`) and
//!   any receiver obtained from [`Scheduler::bus`](crate::Scheduler::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
