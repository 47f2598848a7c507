//! # One caller's pending ask.
//!
//! A [`SessionRequest`] owns the payload, a private [`RetryCursor`], and the
//! sending half of a oneshot reply. The caller keeps the matching [`Waiter`].
//!
//! Requests move by value between the queue, a worker, and the retry timer, so
//! at any instant exactly one of them holds it. Resolving consumes the request,
//! which makes the reply write-once without a runtime check.
//!
//! ```text
//! submit ──► SessionRequest ──► queue ──► worker ──► complete(session) ──► Waiter
//!                                  ▲          │
//!                                  │          └──► abandon(reason) ─────► Waiter
//!                                  └── timer ◄┘ (retry)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::{
    error::{AbandonReason, AttemptError, SchedulerError},
    events::{Bus, Event, EventKind},
    policies::{RetryCursor, RetryPolicy},
    session::{PayloadRef, SessionRef},
};

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

pub(crate) type Reply = Result<SessionRef, SchedulerError>;

pub(crate) struct SessionRequest {
    id: u64,
    payload: PayloadRef,
    cursor: RetryCursor,
    attempts: u32,
    last_error: Option<AttemptError>,
    reply: oneshot::Sender<Reply>,
}

/// Caller side of a request.
pub(crate) struct Waiter {
    rx: oneshot::Receiver<Reply>,
    payload: PayloadRef,
}

impl SessionRequest {
    /// Creates a request with a fresh cursor over `policy`.
    pub(crate) fn new(payload: PayloadRef, policy: &RetryPolicy) -> (Self, Waiter) {
        let (tx, rx) = oneshot::channel();
        let waiter = Waiter {
            rx,
            payload: PayloadRef::clone(&payload),
        };
        let request = Self {
            id: REQUEST_SEQ.fetch_add(1, Ordering::Relaxed),
            payload,
            cursor: policy.cursor(),
            attempts: 0,
            last_error: None,
            reply: tx,
        };
        (request, waiter)
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn payload(&self) -> &PayloadRef {
        &self.payload
    }

    /// True once the caller dropped its [`Waiter`].
    pub(crate) fn caller_gone(&self) -> bool {
        self.reply.is_closed()
    }

    /// Counts a new attempt and returns its 1-based number.
    pub(crate) fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub(crate) fn record_failure(&mut self, err: AttemptError) {
        self.last_error = Some(err);
    }

    /// Moves the cursor forward and returns the wait before the next attempt,
    /// or `None` when the policy is exhausted.
    pub(crate) fn advance(&mut self) -> Option<Duration> {
        let (delay, next) = self.cursor.next()?;
        self.cursor = next;
        Some(delay)
    }

    /// Resolves the request with `session`.
    ///
    /// Hands the session back when the caller is no longer waiting.
    pub(crate) fn complete(self, session: SessionRef) -> Result<(), SessionRef> {
        match self.reply.send(Ok(session)) {
            Ok(()) | Err(Err(_)) => Ok(()),
            Err(Ok(session)) => Err(session),
        }
    }

    /// Resolves the request without a session and publishes `RequestAbandoned`.
    pub(crate) fn abandon(self, reason: AbandonReason, bus: &Bus) {
        bus.publish(
            Event::now(EventKind::RequestAbandoned)
                .with_request(self.id)
                .with_attempt(self.attempts)
                .with_reason(reason.as_label()),
        );
        let err = SchedulerError::SessionNotCreated {
            payload: self.payload,
            reason,
            last_error: self.last_error,
        };
        let _ = self.reply.send(Err(err));
    }
}

impl Waiter {
    /// Waits for the request to be resolved.
    ///
    /// A request dropped without being resolved (its worker was aborted)
    /// yields `SessionNotCreated` with reason `Dropped`.
    pub(crate) async fn wait(self) -> Reply {
        match self.rx.await {
            Ok(reply) => reply,
            Err(_) => Err(SchedulerError::SessionNotCreated {
                payload: self.payload,
                reason: AbandonReason::Dropped,
                last_error: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        ActiveSession, Capabilities, Dialect, NewSessionPayload, PayloadRef,
    };
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, Default)]
    struct StubSession {
        caps: Capabilities,
        stopped: AtomicBool,
    }

    impl ActiveSession for StubSession {
        fn id(&self) -> &str {
            "stub"
        }
        fn dialect(&self) -> Dialect {
            Dialect::W3c
        }
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }
        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    fn payload() -> PayloadRef {
        Arc::new(NewSessionPayload::single(Capabilities::browser("x")))
    }

    #[tokio::test]
    async fn complete_reaches_waiter() {
        let (req, waiter) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        let session: SessionRef = Arc::new(StubSession::default());
        assert!(req.complete(session).is_ok());

        let got = waiter.wait().await.expect("session");
        assert_eq!(got.id(), "stub");
    }

    #[tokio::test]
    async fn abandon_carries_reason_and_last_error() {
        let (mut req, waiter) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        req.begin_attempt();
        req.record_failure(AttemptError::NoMatch);
        req.abandon(AbandonReason::Exhausted, &Bus::new(4));

        let err = waiter.wait().await.expect_err("no session");
        assert_eq!(err.reason(), Some(AbandonReason::Exhausted));
        assert_eq!(err.last_error(), Some(&AttemptError::NoMatch));
        assert!(err.payload().is_some());
    }

    #[tokio::test]
    async fn dropped_request_resolves_waiter() {
        let (req, waiter) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        drop(req);
        let err = waiter.wait().await.expect_err("no session");
        assert_eq!(err.reason(), Some(AbandonReason::Dropped));
    }

    #[test]
    fn complete_returns_session_when_caller_is_gone() {
        let (req, waiter) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        drop(waiter);
        assert!(req.caller_gone());

        let stub = Arc::new(StubSession::default());
        let back = req.complete(stub.clone()).expect_err("nobody waiting");
        back.stop();
        assert!(stub.stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn advance_walks_the_policy_once() {
        let policy = RetryPolicy::immediately().or_else(RetryPolicy::after(Duration::from_millis(5)));
        let (mut req, _waiter) = SessionRequest::new(payload(), &policy);
        assert_eq!(req.advance(), Some(Duration::ZERO));
        assert_eq!(req.advance(), Some(Duration::from_millis(5)));
        assert_eq!(req.advance(), None);
        assert_eq!(req.advance(), None);
    }

    #[test]
    fn ids_are_unique() {
        let (a, _wa) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        let (b, _wb) = SessionRequest::new(payload(), &RetryPolicy::immediately());
        assert_ne!(a.id(), b.id());
    }
}
