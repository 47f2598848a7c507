//! # LogWriter: events to `tracing`
//!
//! Renders each [`Event`] as one structured `tracing` record under the
//! `session_scheduler` target. Lifecycle noise goes to `debug`, outcomes to
//! `info`, failures and losses to `warn`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  request queued request=1
//! DEBUG factory reserved request=1 attempt=1 worker=0 factory="firefox-1"
//! WARN  attempt failed request=1 attempt=1 factory="firefox-1" reason="attempt_no_session"
//! INFO  retry scheduled request=1 attempt=1 delay=500ms
//! WARN  request abandoned request=1 attempt=3 reason="exhausted"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards events to `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let request = e.request;
        let attempt = e.attempt;
        let worker = e.worker;
        let factory = e.factory.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::SchedulerStarted => info!(workers = ?e.count, "scheduler started"),
            EventKind::WorkerExited => debug!(?worker, "worker exited"),
            EventKind::RequestQueued => info!(?request, "request queued"),
            EventKind::AttemptStarting => {
                debug!(?request, ?attempt, ?worker, "attempt starting")
            }
            EventKind::FactoryReserved => {
                debug!(?request, ?attempt, ?worker, ?factory, capabilities = ?e.capabilities, "factory reserved")
            }
            EventKind::SessionCreated => {
                info!(?request, ?attempt, ?worker, ?factory, "session created")
            }
            EventKind::AttemptFailed => {
                warn!(?request, ?attempt, ?worker, ?factory, ?reason, "attempt failed")
            }
            EventKind::RetryScheduled => {
                info!(?request, ?attempt, delay = ?e.delay, "retry scheduled")
            }
            EventKind::RequestRequeued => debug!(?request, "request requeued"),
            EventKind::RequestAbandoned => {
                warn!(?request, ?attempt, ?reason, "request abandoned")
            }
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all workers stopped within grace"),
            EventKind::GraceExceeded => warn!(aborted = ?e.count, "grace exceeded"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = ?e.subscriber, ?reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = ?e.subscriber, ?reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
