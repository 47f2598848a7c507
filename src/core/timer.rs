//! # Retry timer: delayed head re-entry.
//!
//! A single task owns a [`DelayQueue`]. [`RetryTimer::schedule`] hands it a
//! request and a delay over an unbounded channel (never blocks the worker);
//! when the delay elapses the request is pushed to the *front* of the queue.
//!
//! ```text
//! worker ── schedule(req, d) ──► [chan] ──► driver ── d elapsed ──► queue.push_front(req)
//!                                              │
//!                                    cancel ──►└── abandon every held request (Shutdown)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, time::DelayQueue};

use super::{queue::RequestQueue, request::SessionRequest};
use crate::{
    error::AbandonReason,
    events::{Bus, Event, EventKind},
};

/// Sending side, shared by every worker.
pub(crate) struct RetryTimer {
    tx: mpsc::UnboundedSender<(SessionRequest, Duration)>,
}

/// Receiving side, run once as its own task.
pub(crate) struct TimerDriver {
    rx: mpsc::UnboundedReceiver<(SessionRequest, Duration)>,
    queue: Arc<RequestQueue>,
    bus: Bus,
}

impl RetryTimer {
    pub(crate) fn new(queue: Arc<RequestQueue>, bus: Bus) -> (Self, TimerDriver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TimerDriver { rx, queue, bus })
    }

    /// Arranges for `request` to re-enter the queue head after `delay`.
    ///
    /// Hands the request back when the driver has shut down.
    pub(crate) fn schedule(
        &self,
        request: SessionRequest,
        delay: Duration,
    ) -> Result<(), SessionRequest> {
        self.tx.send((request, delay)).map_err(|e| e.0.0)
    }
}

impl TimerDriver {
    pub(crate) async fn run(mut self, token: CancellationToken) {
        let mut delays: DelayQueue<u64> = DelayQueue::new();
        let mut held: HashMap<u64, SessionRequest> = HashMap::new();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some((request, delay)) => {
                        delays.insert(request.id(), delay);
                        held.insert(request.id(), request);
                    }
                    None => break,
                },
                Some(expired) = delays.next(), if !delays.is_empty() => {
                    if let Some(request) = held.remove(&expired.into_inner()) {
                        self.requeue(request);
                    }
                }
            }
        }

        self.rx.close();
        while let Ok((request, _)) = self.rx.try_recv() {
            request.abandon(AbandonReason::Shutdown, &self.bus);
        }
        for (_, request) in held.drain() {
            request.abandon(AbandonReason::Shutdown, &self.bus);
        }
    }

    fn requeue(&self, request: SessionRequest) {
        let id = request.id();
        match self.queue.push_front(request) {
            Ok(()) => self
                .bus
                .publish(Event::now(EventKind::RequestRequeued).with_request(id)),
            Err(request) => request.abandon(AbandonReason::Shutdown, &self.bus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::Waiter;
    use crate::policies::RetryPolicy;
    use crate::session::{Capabilities, NewSessionPayload};
    use tokio::time::Instant;

    fn request() -> (SessionRequest, Waiter) {
        SessionRequest::new(
            Arc::new(NewSessionPayload::single(Capabilities::browser("x"))),
            &RetryPolicy::immediately(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_delay_order_at_the_head() {
        let queue = Arc::new(RequestQueue::new());
        let bus = Bus::new(16);
        let (timer, driver) = RetryTimer::new(Arc::clone(&queue), bus);
        let token = CancellationToken::new();
        let task = tokio::spawn(driver.run(token.clone()));

        let (fresh, _wf) = request();
        let (slow, _ws) = request();
        let (fast, _wq) = request();
        let (fresh_id, slow_id, fast_id) = (fresh.id(), slow.id(), fast.id());
        assert!(queue.push_back(fresh).is_ok());
        assert!(timer.schedule(slow, Duration::from_millis(200)).is_ok());
        assert!(timer.schedule(fast, Duration::from_millis(100)).is_ok());

        let start = Instant::now();
        let first = queue.pop_front(&token).await.expect("fresh");
        assert_eq!(first.id(), fresh_id);

        let second = queue.pop_front(&token).await.expect("fast");
        assert_eq!(second.id(), fast_id);
        assert!(start.elapsed() >= Duration::from_millis(100));

        let third = queue.pop_front(&token).await.expect("slow");
        assert_eq!(third.id(), slow_id);
        assert!(start.elapsed() >= Duration::from_millis(200));

        token.cancel();
        task.await.expect("join");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_held_requests() {
        let queue = Arc::new(RequestQueue::new());
        let (timer, driver) = RetryTimer::new(Arc::clone(&queue), Bus::new(16));
        let token = CancellationToken::new();
        let task = tokio::spawn(driver.run(token.clone()));

        let (req, waiter) = request();
        assert!(timer.schedule(req, Duration::from_secs(60)).is_ok());
        tokio::task::yield_now().await;

        token.cancel();
        task.await.expect("join");

        let err = waiter.wait().await.expect_err("no session");
        assert_eq!(err.reason(), Some(AbandonReason::Shutdown));

        let (late, _w) = request();
        assert!(timer.schedule(late, Duration::ZERO).is_err());
    }
}
