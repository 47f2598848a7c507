//! # Double-ended request queue.
//!
//! - `push_back` for new submissions (FIFO among fresh requests)
//! - `push_front` for retries re-entering from the timer (served first)
//! - `pop_front` waits for work; wakes on either push and on cancellation
//!
//! Once closed, pushes hand the request back to the caller and `pop_front`
//! returns `None`.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::request::SessionRequest;

#[derive(Default)]
struct State {
    items: VecDeque<SessionRequest>,
    closed: bool,
}

#[derive(Default)]
pub(crate) struct RequestQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl RequestQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_back(&self, request: SessionRequest) -> Result<(), SessionRequest> {
        self.push(request, false)
    }

    pub(crate) fn push_front(&self, request: SessionRequest) -> Result<(), SessionRequest> {
        self.push(request, true)
    }

    fn push(&self, request: SessionRequest, front: bool) -> Result<(), SessionRequest> {
        {
            let mut st = self.state.lock();
            if st.closed {
                return Err(request);
            }
            if front {
                st.items.push_front(request);
            } else {
                st.items.push_back(request);
            }
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Takes the head request, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed or `token` is cancelled.
    pub(crate) async fn pop_front(&self, token: &CancellationToken) -> Option<SessionRequest> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between check and await is not lost.
            notified.as_mut().enable();

            if token.is_cancelled() {
                return None;
            }
            {
                let mut st = self.state.lock();
                if st.closed {
                    return None;
                }
                if let Some(request) = st.items.pop_front() {
                    return Some(request);
                }
            }

            tokio::select! {
                _ = token.cancelled() => return None,
                _ = &mut notified => {}
            }
        }
    }

    /// Closes the queue and returns everything still in it, head first.
    pub(crate) fn close_and_drain(&self) -> Vec<SessionRequest> {
        let drained = {
            let mut st = self.state.lock();
            st.closed = true;
            st.items.drain(..).collect()
        };
        self.notify.notify_waiters();
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
