//! # Runtime events emitted by the scheduler, its workers, and the retry timer.
//!
//! [`EventKind`] classifies events in four groups:
//! - **Request lifecycle**: queued, attempt starting, factory reserved, session
//!   created, attempt failed, retry scheduled, requeued, abandoned
//! - **Runtime**: scheduler started, worker exited
//! - **Shutdown**: requested, all stopped within grace, grace exceeded
//! - **Subscriber**: overflow, panic
//!
//! [`Event`] carries the optional metadata (request id, attempt, worker, factory,
//! matched capabilities, subscriber, delay, reason).
//!
//! ## Ordering guarantees
//! Each event gets a globally unique, monotonically increasing `seq`. Use it to
//! restore the exact order when events are observed out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use session_scheduler::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::RetryScheduled)
//!     .with_request(7)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(500));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.request, Some(7));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Runtime ===
    /// Worker pool and retry timer are running.
    ///
    /// Sets: `count` (number of workers)
    SchedulerStarted,

    /// A worker loop exited after cancellation.
    ///
    /// Sets: `worker`
    WorkerExited,

    // === Request lifecycle ===
    /// A new request entered the scheduler.
    ///
    /// Sets: `request`
    RequestQueued,

    /// A worker dequeued a request and starts an attempt.
    ///
    /// Sets: `request`, `attempt` (1-based), `worker`
    AttemptStarting,

    /// A factory was matched and marked unavailable.
    ///
    /// Sets: `request`, `attempt`, `worker`, `factory`, `capabilities`
    FactoryReserved,

    /// The attempt produced a session; the request is resolved.
    ///
    /// Sets: `request`, `attempt`, `worker`, `factory`
    SessionCreated,

    /// The attempt failed (no match, factory error, timeout, panic, no session).
    ///
    /// Sets: `request`, `attempt`, `worker`, `reason`, and `factory` when one was reserved
    AttemptFailed,

    /// The request was handed to the retry timer.
    ///
    /// Sets: `request`, `attempt` (attempts so far), `delay`
    RetryScheduled,

    /// The retry timer put the request back at the head of the queue.
    ///
    /// Sets: `request`
    RequestRequeued,

    /// The request was resolved without a session.
    ///
    /// Sets: `request`, `attempt` (attempts so far), `reason` (abandon label)
    RequestAbandoned,

    // === Shutdown ===
    /// `stop()` was called.
    ShutdownRequested,

    /// Every worker and the retry timer stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining workers were aborted.
    ///
    /// Sets: `count` (aborted workers)
    GraceExceeded,

    // === Subscribers ===
    /// A subscriber's queue was full or closed and it missed an event.
    ///
    /// Sets: `subscriber`, `reason` ("full" or "closed")
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `subscriber`, `reason` (panic message)
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique sequence number (monotonic).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Classification.
    pub kind: EventKind,
    /// Request id.
    pub request: Option<u64>,
    /// Attempt number (1-based).
    pub attempt: Option<u32>,
    /// Worker index.
    pub worker: Option<usize>,
    /// Factory name.
    pub factory: Option<String>,
    /// Capabilities the factory was matched for (JSON).
    pub capabilities: Option<String>,
    /// Subscriber name.
    pub subscriber: Option<&'static str>,
    /// Retry delay.
    pub delay: Option<Duration>,
    /// Failure, abandon, or overflow reason.
    pub reason: Option<String>,
    /// Generic count (workers started, workers aborted).
    pub count: Option<usize>,
}

impl Event {
    /// Creates an event of `kind` stamped with the current time and next `seq`.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            request: None,
            attempt: None,
            worker: None,
            factory: None,
            capabilities: None,
            subscriber: None,
            delay: None,
            reason: None,
            count: None,
        }
    }

    #[inline]
    pub fn with_request(mut self, id: u64) -> Self {
        self.request = Some(id);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    #[inline]
    pub fn with_factory(mut self, name: impl Into<String>) -> Self {
        self.factory = Some(name.into());
        self
    }

    #[inline]
    pub fn with_capabilities(mut self, capabilities: impl Into<String>) -> Self {
        self.capabilities = Some(capabilities.into());
        self
    }

    #[inline]
    pub fn with_subscriber(mut self, name: &'static str) -> Self {
        self.subscriber = Some(name);
        self
    }

    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Subscriber `name` missed an event (`reason` is "full" or "closed").
    pub fn subscriber_overflow(name: &'static str, reason: &'static str) -> Self {
        Self::now(EventKind::SubscriberOverflow)
            .with_subscriber(name)
            .with_reason(reason)
    }

    /// Subscriber `name` panicked with `info`.
    pub fn subscriber_panicked(name: &'static str, info: String) -> Self {
        Self::now(EventKind::SubscriberPanicked)
            .with_subscriber(name)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::RequestQueued);
        let b = Event::now(EventKind::RequestQueued);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::now(EventKind::AttemptFailed)
            .with_request(3)
            .with_attempt(1)
            .with_worker(0)
            .with_factory("firefox-1")
            .with_reason("attempt_no_session");
        assert_eq!(ev.request, Some(3));
        assert_eq!(ev.worker, Some(0));
        assert_eq!(ev.factory.as_deref(), Some("firefox-1"));
        assert_eq!(ev.reason.as_deref(), Some("attempt_no_session"));
        assert_eq!(ev.delay, None);
        assert_eq!(ev.subscriber, None);
    }

    #[test]
    fn subscriber_events_name_the_subscriber_not_a_factory() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.subscriber, Some("audit"));
        assert_eq!(ev.factory, None);
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
