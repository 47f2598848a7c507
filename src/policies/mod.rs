//! Retry scheduling policies.
//!
//! This module groups the knobs that control **how many** attempts a session
//! request gets and **how long** it waits between them.
//!
//! ## Contents
//! - [`RetryPolicy`] the per-request delay schedule (immediate / fixed / chained)
//! - [`RetryCursor`] a request's private, immutable position in that schedule
//! - [`BackoffPolicy`] exponential growth for backoff stages
//! - [`JitterPolicy`] randomization to spread synchronized retries
//!
//! ## Quick wiring
//! ```text
//! SchedulerConfig { retry: RetryPolicy, .. }
//!      └─► submit(): request.cursor = retry.cursor()
//!           └─► worker on failure: cursor.next() → Some(delay) → RetryTimer
//!                                                → None        → abandon (exhausted)
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::immediately()` one attempt, no wait.
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=5s, no jitter.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{Delays, RetryCursor, RetryPolicy};
