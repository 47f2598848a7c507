//! # Scheduler: owns the queue, matcher, retry timer, and worker pool.
//!
//! ## Architecture
//! ```text
//! submit(payload)
//!   └─► SessionRequest ──(wait first delay)──► queue.push_back ─┐
//!                                                               │
//!   Worker failure ──► RetryTimer ── delay ─► queue.push_front ─┤
//!                                                               ▼
//!                                              [RequestQueue (double-ended)]
//!                                                               │ pop_front
//!                                      ┌────────────┬───────────┴──────────┐
//!                                   Worker 0     Worker 1     ...     Worker N-1
//!                                      │  Matcher (narrow lock) → Reservation
//!                                      │  factory.attempt() outside the lock
//!                                      ├─► complete → Waiter (caller)
//!                                      └─► fail → RetryTimer | abandon → Waiter
//!
//! Events: every step ── publish ──► Bus ──► listener ──► SubscriberSet
//!
//! stop():
//!   publish ShutdownRequested → cancel token → drain queue (Shutdown)
//!   → await timer + workers within cfg.grace
//!        ├─ all joined → AllStoppedWithin
//!        └─ timed out  → abort workers → GraceExceeded, Err(GraceExceeded)
//!   → flush subscribers
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use session_scheduler::{
//!     Capabilities, FactoryFn, FactoryRef, LogWriter, NewSessionPayload, RetryPolicy,
//!     Scheduler, StaticDistributor, Subscribe,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let firefox: FactoryRef = FactoryFn::arc("firefox-1", Capabilities::browser("firefox"), |_d, _c| async {
//!         Ok(None)
//!     });
//!     let distributor = Arc::new(StaticDistributor::with_factories([firefox]));
//!     let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let scheduler = Scheduler::builder()
//!         .distribute_using(distributor)
//!         .retry_using(
//!             RetryPolicy::immediately()
//!                 .or_else(RetryPolicy::after(Duration::from_millis(500)))
//!                 .or_else(RetryPolicy::after(Duration::from_secs(1))),
//!         )
//!         .with_subscribers(subscribers)
//!         .build()?;
//!
//!     let result = scheduler
//!         .submit(NewSessionPayload::single(Capabilities::browser("firefox")))
//!         .await;
//!     println!("{result:?}");
//!
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{
    builder::SchedulerBuilder,
    matcher::Matcher,
    queue::RequestQueue,
    request::SessionRequest,
    timer::RetryTimer,
};
use crate::{
    config::SchedulerConfig,
    error::{AbandonReason, SchedulerError},
    events::{Bus, Event, EventKind},
    session::{Payload, PayloadRef, SessionRef},
    subscribers::SubscriberSet,
};

/// State shared by the scheduler handle, the workers, and the timer.
pub(crate) struct Shared {
    pub(crate) cfg: SchedulerConfig,
    pub(crate) bus: Bus,
    pub(crate) queue: Arc<RequestQueue>,
    pub(crate) matcher: Matcher,
    pub(crate) timer: RetryTimer,
    pub(crate) token: CancellationToken,
}

impl Shared {
    /// Admits a fresh request at the queue tail.
    ///
    /// A non-zero first delay is waited out on the caller's task before the
    /// tail insert; only retries go through the timer and re-enter at the head.
    pub(crate) async fn admit(&self, mut request: SessionRequest) {
        let Some(delay) = request.advance() else {
            request.abandon(AbandonReason::Exhausted, &self.bus);
            return;
        };
        if !delay.is_zero() {
            tokio::select! {
                _ = self.token.cancelled() => {
                    request.abandon(AbandonReason::Shutdown, &self.bus);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if let Err(request) = self.queue.push_back(request) {
            request.abandon(AbandonReason::Shutdown, &self.bus);
        }
    }

    /// Reason for a retry the timer refused.
    pub(crate) fn schedule_failure(&self) -> AbandonReason {
        if self.token.is_cancelled() {
            AbandonReason::Shutdown
        } else {
            AbandonReason::ScheduleFailed
        }
    }
}

/// Schedules session creation across the factories a distributor exposes.
///
/// Build with [`Scheduler::builder`] inside a Tokio runtime. `submit` may be
/// called concurrently from any number of tasks (share the scheduler behind an
/// `Arc`).
///
/// Dropping the scheduler without calling [`stop`](Self::stop) cancels the
/// workers, resolves queued requests as `Shutdown`, and aborts in-flight
/// attempts (their callers observe `Dropped`).
pub struct Scheduler {
    shared: Arc<Shared>,
    workers: Mutex<JoinSet<()>>,
    timer: parking_lot::Mutex<Option<JoinHandle<()>>>,
    listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
    listener_done: CancellationToken,
    stopping: AtomicBool,
}

impl Scheduler {
    /// Returns a builder with [`SchedulerConfig::default`].
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new(SchedulerConfig::default())
    }

    pub(crate) fn start(
        shared: Arc<Shared>,
        timer: JoinHandle<()>,
        subscribers: SubscriberSet,
    ) -> Self {
        let listener_done = CancellationToken::new();
        let listener = tokio::spawn(listen(
            shared.bus.subscribe(),
            subscribers,
            listener_done.clone(),
        ));

        let count = shared.cfg.worker_count();
        let mut workers = JoinSet::new();
        for index in 0..count {
            workers.spawn(super::worker::Worker::new(index, Arc::clone(&shared)).run());
        }
        shared
            .bus
            .publish(Event::now(EventKind::SchedulerStarted).with_count(count));

        Self {
            shared,
            workers: Mutex::new(workers),
            timer: parking_lot::Mutex::new(Some(timer)),
            listener: parking_lot::Mutex::new(Some(listener)),
            listener_done,
            stopping: AtomicBool::new(false),
        }
    }

    /// Submits a payload and waits until a session is created or the request
    /// is given up.
    ///
    /// # Errors
    /// [`SchedulerError::SessionNotCreated`] carrying the payload, the
    /// [`AbandonReason`], and the last attempt error.
    pub async fn submit<P: Payload>(&self, payload: P) -> Result<SessionRef, SchedulerError> {
        self.submit_ref(Arc::new(payload)).await
    }

    /// Same as [`submit`](Self::submit) for an already shared payload.
    pub async fn submit_ref(&self, payload: PayloadRef) -> Result<SessionRef, SchedulerError> {
        let (request, waiter) = SessionRequest::new(payload, &self.shared.cfg.retry);
        self.shared
            .bus
            .publish(Event::now(EventKind::RequestQueued).with_request(request.id()));
        self.shared.admit(request).await;
        waiter.wait().await
    }

    /// Stops the scheduler.
    ///
    /// No new attempt starts after this call. Requests still queued or waiting
    /// on a retry delay resolve as `SessionNotCreated` with reason `Shutdown`.
    /// Attempts already running get `cfg.grace` to finish; past that their
    /// workers are aborted.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// [`SchedulerError::GraceExceeded`] when in-flight attempts outlived the grace period.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let first = !self.stopping.swap(true, Ordering::AcqRel);
        let bus = &self.shared.bus;
        if first {
            bus.publish(Event::now(EventKind::ShutdownRequested));
        }
        self.shutdown_now();

        let timer = self.timer.lock().take();
        let mut workers = self.workers.lock().await;
        let grace = self.shared.cfg.grace;
        let joined = tokio::time::timeout(grace, async {
            if let Some(timer) = timer {
                let _ = timer.await;
            }
            while workers.join_next().await.is_some() {}
        })
        .await;

        let res = match joined {
            Ok(()) => {
                if first {
                    bus.publish(Event::now(EventKind::AllStoppedWithin));
                }
                Ok(())
            }
            Err(_elapsed) => {
                let in_flight = workers.len();
                workers.abort_all();
                while workers.join_next().await.is_some() {}
                bus.publish(Event::now(EventKind::GraceExceeded).with_count(in_flight));
                Err(SchedulerError::GraceExceeded { grace, in_flight })
            }
        };
        drop(workers);

        self.listener_done.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        res
    }

    /// Number of requests currently waiting in the queue (not counting those
    /// held by the retry timer or being attempted).
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Event bus for custom subscriptions.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// Cancels workers and the timer, then resolves everything still queued.
    fn shutdown_now(&self) {
        self.shared.token.cancel();
        for request in self.shared.queue.close_and_drain() {
            request.abandon(AbandonReason::Shutdown, &self.shared.bus);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown_now();
        self.listener_done.cancel();
    }
}

/// Forwards bus events to the subscriber set until `done`, then flushes.
async fn listen(
    mut rx: broadcast::Receiver<Event>,
    subscribers: SubscriberSet,
    done: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            ev = rx.recv() => match ev {
                Ok(ev) => subscribers.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = done.cancelled() => {
                while let Ok(ev) = rx.try_recv() {
                    subscribers.emit(&ev);
                }
                break;
            }
        }
    }
    subscribers.shutdown().await;
}
