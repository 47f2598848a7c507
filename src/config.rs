//! # Scheduler configuration.
//!
//! [`SchedulerConfig`] centralizes runtime settings for a [`Scheduler`](crate::Scheduler).
//! The builder's `retry_using` overrides [`SchedulerConfig::retry`].
//!
//! ## Sentinel values
//! - `workers = 0` → one worker per available processing unit
//! - `attempt_timeout = 0s` → creation attempts are never timed out
//! - `grace = 0s` → `stop()` aborts in-flight attempts immediately

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for the scheduler runtime.
///
/// All fields are public; prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Number of worker loops draining the request queue (`0` = host parallelism).
    pub workers: usize,

    /// Upper bound on a single `SessionFactory::attempt` (`0s` = unbounded).
    ///
    /// An attempt that runs over is cancelled and counts as a failed attempt.
    pub attempt_timeout: Duration,

    /// How long `stop()` waits for workers still inside an attempt.
    ///
    /// Past the grace period those workers are aborted; their callers observe
    /// `SessionNotCreated` with reason `Dropped`.
    pub grace: Duration,

    /// Capacity of the event bus ring buffer (min 1; clamped).
    pub bus_capacity: usize,

    /// Delay schedule handed to every request.
    pub retry: RetryPolicy,
}

impl SchedulerConfig {
    /// Resolved worker count (never zero).
    #[inline]
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    /// Attempt timeout as an `Option`.
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.attempt_timeout == Duration::ZERO {
            None
        } else {
            Some(self.attempt_timeout)
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `workers = 0` (host parallelism)
    /// - `attempt_timeout = 0s` (unbounded)
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `retry = RetryPolicy::immediately()`
    fn default() -> Self {
        Self {
            workers: 0,
            attempt_timeout: Duration::ZERO,
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            retry: RetryPolicy::immediately(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve() {
        let cfg = SchedulerConfig::default();
        assert!(cfg.worker_count() >= 1);
        assert_eq!(cfg.attempt_timeout(), None);
        assert_eq!(
            SchedulerConfig {
                bus_capacity: 0,
                ..SchedulerConfig::default()
            }
            .bus_capacity_clamped(),
            1
        );
    }

    #[test]
    fn explicit_values_win() {
        let cfg = SchedulerConfig {
            workers: 3,
            attempt_timeout: Duration::from_secs(2),
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.worker_count(), 3);
        assert_eq!(cfg.attempt_timeout(), Some(Duration::from_secs(2)));
    }
}
