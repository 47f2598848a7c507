//! # Exponential backoff stage.
//!
//! [`BackoffPolicy`] computes the delay for the `n`-th step of a backoff stage
//! inside a [`RetryPolicy`](crate::RetryPolicy). The base delay for step `n`
//! (0-indexed) is `first × factor^n`, clamped to `max`, then jittered. The base
//! is derived from the step number alone, so jitter never feeds back into later
//! delays.
//!
//! ```rust
//! use std::time::Duration;
//! use session_scheduler::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::exponential(Duration::from_millis(250), Duration::from_secs(2));
//! assert_eq!(backoff.next(0), Duration::from_millis(250));
//! assert_eq!(backoff.next(1), Duration::from_millis(500));
//! assert_eq!(backoff.next(5), Duration::from_secs(2));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Growth parameters for a backoff stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay of the first step.
    pub first: Duration,
    /// Upper bound for any step.
    pub max: Duration,
    /// Multiplicative growth per step (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 100ms`, `max = 5s`, `factor = 2.0`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Doubling backoff from `first`, capped at `max`, without jitter.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            ..Self::default()
        }
    }

    /// Returns a copy with the given jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay for step `step` (0-indexed) of the stage.
    pub fn next(&self, step: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = step.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
