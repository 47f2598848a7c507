//! # Worker loop: dequeue, match, attempt, resolve or retry.
//!
//! ```text
//! loop {
//!   pop_front() ── None (stop) ──► exit, publish WorkerExited
//!      │
//!      ├─ caller gone?  → abandon(CallerGone)
//!      ├─ reserve()     → Err → fail(NoMatch | Enumerate)
//!      ├─ attempt()     → Ok(session) → complete (or stop the session if nobody waits)
//!      │                → Err         → release factory, fail(err)
//!      └─ fail():  cursor.advance()
//!                    ├─ None        → abandon(Exhausted)
//!                    └─ Some(delay) → timer.schedule(delay)
//!                                       └─ Err → abandon(ScheduleFailed | Shutdown)
//! }
//! ```
//!
//! The creation attempt runs on its own task so that a panicking factory only
//! fails the attempt; an attempt timeout aborts that task.

use std::sync::Arc;

use tokio::time;
use tokio_util::task::AbortOnDropHandle;

use super::{
    matcher::Reservation,
    request::SessionRequest,
    scheduler::Shared,
};
use crate::{
    error::{AbandonReason, AttemptError},
    events::{Event, EventKind},
    session::SessionRef,
};

pub(crate) struct Worker {
    index: usize,
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(index: usize, shared: Arc<Shared>) -> Self {
        Self { index, shared }
    }

    pub(crate) async fn run(self) {
        let token = self.shared.token.clone();
        while let Some(request) = self.shared.queue.pop_front(&token).await {
            self.serve(request).await;
        }
        self.shared
            .bus
            .publish(Event::now(EventKind::WorkerExited).with_worker(self.index));
    }

    async fn serve(&self, mut request: SessionRequest) {
        let bus = &self.shared.bus;
        if request.caller_gone() {
            request.abandon(AbandonReason::CallerGone, bus);
            return;
        }

        let attempt = request.begin_attempt();
        bus.publish(self.event(EventKind::AttemptStarting, &request, attempt));

        let reservation = match self.shared.matcher.reserve(request.payload().as_ref()) {
            Ok(reservation) => reservation,
            Err(err) => return self.fail(request, attempt, err, None),
        };
        bus.publish(
            self.event(EventKind::FactoryReserved, &request, attempt)
                .with_factory(reservation.factory().name())
                .with_capabilities(reservation.capabilities().to_string()),
        );

        match self.attempt(&request, &reservation).await {
            Ok(session) => self.succeed(request, attempt, reservation, session),
            Err(err) => self.fail(request, attempt, err, Some(reservation)),
        }
    }

    async fn attempt(
        &self,
        request: &SessionRequest,
        reservation: &Reservation,
    ) -> Result<SessionRef, AttemptError> {
        let factory = Arc::clone(reservation.factory());
        let name = factory.name().to_string();
        let capabilities = reservation.capabilities().clone();
        let dialects = request.payload().downstream_dialects();

        let handle = AbortOnDropHandle::new(tokio::spawn(async move {
            factory.attempt(&dialects, &capabilities).await
        }));

        let joined = match self.shared.cfg.attempt_timeout() {
            Some(timeout) => match time::timeout(timeout, handle).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    return Err(AttemptError::Timeout {
                        factory: name,
                        timeout,
                    });
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(Some(session))) => Ok(session),
            Ok(Ok(None)) => Err(AttemptError::NoSession { factory: name }),
            Ok(Err(err)) => Err(AttemptError::Factory {
                factory: name,
                error: err.to_string(),
            }),
            Err(_join) => Err(AttemptError::Panicked { factory: name }),
        }
    }

    fn succeed(
        &self,
        request: SessionRequest,
        attempt: u32,
        reservation: Reservation,
        session: SessionRef,
    ) {
        let bus = &self.shared.bus;
        bus.publish(
            self.event(EventKind::SessionCreated, &request, attempt)
                .with_factory(reservation.factory().name()),
        );
        let id = request.id();
        match request.complete(session) {
            Ok(()) => reservation.keep(),
            Err(orphan) => {
                // Nobody is waiting: tear the session down and free the factory.
                orphan.stop();
                drop(reservation);
                bus.publish(
                    Event::now(EventKind::RequestAbandoned)
                        .with_request(id)
                        .with_attempt(attempt)
                        .with_reason(AbandonReason::CallerGone.as_label()),
                );
            }
        }
    }

    fn fail(
        &self,
        mut request: SessionRequest,
        attempt: u32,
        err: AttemptError,
        reservation: Option<Reservation>,
    ) {
        let bus = &self.shared.bus;
        let mut ev = self
            .event(EventKind::AttemptFailed, &request, attempt)
            .with_reason(err.as_label());
        if let Some(reservation) = reservation {
            ev = ev.with_factory(reservation.factory().name());
        }
        bus.publish(ev);
        request.record_failure(err);

        let Some(delay) = request.advance() else {
            request.abandon(AbandonReason::Exhausted, bus);
            return;
        };
        bus.publish(
            Event::now(EventKind::RetryScheduled)
                .with_request(request.id())
                .with_attempt(attempt)
                .with_delay(delay),
        );
        if let Err(request) = self.shared.timer.schedule(request, delay) {
            request.abandon(self.shared.schedule_failure(), bus);
        }
    }

    fn event(&self, kind: EventKind, request: &SessionRequest, attempt: u32) -> Event {
        Event::now(kind)
            .with_request(request.id())
            .with_attempt(attempt)
            .with_worker(self.index)
    }
}
