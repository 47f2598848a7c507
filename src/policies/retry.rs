//! # Retry policy: per-request delay schedules.
//!
//! A [`RetryPolicy`] is an ordered, possibly infinite, sequence of delays made of
//! stages. Each delay admits one attempt and is the wait before that attempt,
//! so the length of the sequence is the attempt budget of a request.
//!
//! ```text
//! immediately()                          → [0]                 1 attempt
//! after(500ms)                           → [500ms]             1 attempt
//! immediately().or_else(after(500ms))
//!              .or_else(after(1s))       → [0, 500ms, 1s]      3 attempts, ~1.5s
//! forever(250ms)                         → [250ms, 250ms, ...] unbounded
//! ```
//!
//! Every request gets its own [`RetryCursor`]. Cursors are immutable values:
//! [`RetryCursor::next`] returns the delay together with a *new* cursor, so two
//! requests built from the same policy never interfere.
//!
//! `or_else` concatenates stage lists, which makes chaining associative:
//! `(a.or_else(b)).or_else(c)` and `a.or_else(b.or_else(c))` yield the same
//! sequence.

use std::sync::Arc;
use std::time::Duration;

use crate::policies::backoff::BackoffPolicy;

/// One segment of a retry schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    /// A single delay.
    Once(Duration),
    /// The same delay, `times` times (`None` = forever).
    Repeat { delay: Duration, times: Option<u32> },
    /// Growing delays, `steps` of them (`None` = forever).
    Backoff {
        policy: BackoffPolicy,
        steps: Option<u32>,
    },
}

impl Stage {
    fn has(&self, step: u32) -> bool {
        match *self {
            Stage::Once(_) => step == 0,
            Stage::Repeat { times, .. } => times.is_none_or(|t| step < t),
            Stage::Backoff { steps, .. } => steps.is_none_or(|t| step < t),
        }
    }

    fn delay(&self, step: u32) -> Duration {
        match *self {
            Stage::Once(d) => d,
            Stage::Repeat { delay, .. } => delay,
            Stage::Backoff { policy, .. } => policy.next(step),
        }
    }
}

/// Ordered schedule of delays shared by all requests of a scheduler.
///
/// Cheap to clone (stages are behind an `Arc`).
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    stages: Arc<[Stage]>,
}

impl Default for RetryPolicy {
    /// Returns [`RetryPolicy::immediately`].
    fn default() -> Self {
        Self::immediately()
    }
}

impl RetryPolicy {
    fn single(stage: Stage) -> Self {
        Self {
            stages: Arc::from([stage]),
        }
    }

    /// A single attempt with no wait.
    pub fn immediately() -> Self {
        Self::single(Stage::Once(Duration::ZERO))
    }

    /// A single attempt after `delay`.
    pub fn after(delay: Duration) -> Self {
        Self::single(Stage::Once(delay))
    }

    /// `times` attempts, each preceded by `delay`.
    pub fn repeat(delay: Duration, times: u32) -> Self {
        Self::single(Stage::Repeat {
            delay,
            times: Some(times),
        })
    }

    /// Unbounded attempts, each preceded by `delay`.
    pub fn forever(delay: Duration) -> Self {
        Self::single(Stage::Repeat { delay, times: None })
    }

    /// `steps` attempts with delays drawn from `policy`.
    pub fn backoff(policy: BackoffPolicy, steps: u32) -> Self {
        Self::single(Stage::Backoff {
            policy,
            steps: Some(steps),
        })
    }

    /// Unbounded attempts with delays drawn from `policy`.
    pub fn backoff_forever(policy: BackoffPolicy) -> Self {
        Self::single(Stage::Backoff {
            policy,
            steps: None,
        })
    }

    /// Runs `self` to exhaustion, then `fallback`.
    #[must_use]
    pub fn or_else(self, fallback: RetryPolicy) -> Self {
        let stages: Vec<Stage> = self
            .stages
            .iter()
            .chain(fallback.stages.iter())
            .copied()
            .collect();
        Self {
            stages: Arc::from(stages),
        }
    }

    /// A fresh cursor positioned before the first delay.
    pub fn cursor(&self) -> RetryCursor {
        RetryCursor {
            stages: Arc::clone(&self.stages),
            stage: 0,
            step: 0,
        }
    }

    /// Iterates the delays of a fresh cursor.
    ///
    /// Infinite for `forever`/`backoff_forever` schedules; use `take`.
    pub fn delays(&self) -> Delays {
        Delays {
            cursor: Some(self.cursor()),
        }
    }
}

/// Position inside a [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct RetryCursor {
    stages: Arc<[Stage]>,
    stage: usize,
    step: u32,
}

impl RetryCursor {
    /// Returns the next delay and the cursor positioned after it,
    /// or `None` once the schedule is exhausted.
    #[must_use]
    pub fn next(&self) -> Option<(Duration, RetryCursor)> {
        let (stage, step) = self.position()?;
        let delay = self.stages[stage].delay(step);
        let advanced = RetryCursor {
            stages: Arc::clone(&self.stages),
            stage,
            step: step.saturating_add(1),
        };
        Some((delay, advanced))
    }

    /// True once no delays remain.
    pub fn is_exhausted(&self) -> bool {
        self.position().is_none()
    }

    fn position(&self) -> Option<(usize, u32)> {
        let mut stage = self.stage;
        let mut step = self.step;
        while let Some(s) = self.stages.get(stage) {
            if s.has(step) {
                return Some((stage, step));
            }
            stage += 1;
            step = 0;
        }
        None
    }
}

/// Iterator over the delays of a [`RetryPolicy`].
#[derive(Debug)]
pub struct Delays {
    cursor: Option<RetryCursor>,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let (delay, advanced) = self.cursor.take()?.next()?;
        self.cursor = Some(advanced);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn immediately_is_a_single_zero_delay() {
        let delays: Vec<_> = RetryPolicy::immediately().delays().collect();
        assert_eq!(delays, vec![Duration::ZERO]);
    }

    #[test]
    fn after_is_a_single_delay() {
        let delays: Vec<_> = RetryPolicy::after(ms(500)).delays().collect();
        assert_eq!(delays, vec![ms(500)]);
    }

    #[test]
    fn or_else_runs_fallback_after_exhaustion() {
        let policy = RetryPolicy::immediately()
            .or_else(RetryPolicy::after(ms(500)))
            .or_else(RetryPolicy::after(ms(1000)));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays, vec![Duration::ZERO, ms(500), ms(1000)]);
    }

    #[test]
    fn or_else_is_associative() {
        let a = || RetryPolicy::repeat(ms(10), 2);
        let b = || RetryPolicy::after(ms(20));
        let c = || RetryPolicy::backoff(BackoffPolicy::exponential(ms(40), ms(100)), 3);

        let left: Vec<_> = a().or_else(b()).or_else(c()).delays().collect();
        let right: Vec<_> = a().or_else(b().or_else(c())).delays().collect();
        assert_eq!(left, right);
        assert_eq!(left, vec![ms(10), ms(10), ms(20), ms(40), ms(80), ms(100)]);
    }

    #[test]
    fn empty_repeat_is_skipped() {
        let policy = RetryPolicy::repeat(ms(5), 0).or_else(RetryPolicy::after(ms(7)));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays, vec![ms(7)]);
    }

    #[test]
    fn forever_never_exhausts() {
        let policy = RetryPolicy::forever(ms(3)).or_else(RetryPolicy::after(ms(9)));
        assert!(policy.delays().take(1_000).all(|d| d == ms(3)));
    }

    #[test]
    fn advancing_leaves_the_old_cursor_untouched() {
        let cursor = RetryPolicy::repeat(ms(1), 2).cursor();
        let (_, second) = cursor.next().expect("first delay");
        let (_, third) = second.next().expect("second delay");

        assert!(third.is_exhausted());
        assert!(!second.is_exhausted());
        assert!(!cursor.is_exhausted());
        assert!(cursor.next().is_some());
    }

    #[test]
    fn cursors_from_one_policy_are_independent() {
        let policy = RetryPolicy::immediately().or_else(RetryPolicy::after(ms(50)));
        let a = policy.cursor();
        let (_, a) = a.next().expect("a first");
        let b = policy.cursor();

        assert_eq!(a.next().map(|(d, _)| d), Some(ms(50)));
        assert_eq!(b.next().map(|(d, _)| d), Some(Duration::ZERO));
    }

    #[test]
    fn default_is_immediately() {
        assert_eq!(RetryPolicy::default(), RetryPolicy::immediately());
    }
}
