//! Error types used by the scheduler, its requests, and session factories.
//!
//! - [`SchedulerError`] what callers of the public API observe.
//! - [`AttemptError`] why one creation attempt failed; absorbed by the worker
//!   loop and kept as the request's `last_error`.
//! - [`FactoryError`] what a [`SessionFactory`](crate::SessionFactory) returns.
//! - [`AbandonReason`] why a request was resolved without a session.
//!
//! Each type offers `as_label` (stable snake_case for logs/metrics).

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::session::PayloadRef;

/// # Errors produced by the scheduler API.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The request was resolved without a session.
    #[error("unable to create session for {payload:?}: {reason}")]
    SessionNotCreated {
        /// The payload the caller submitted.
        payload: PayloadRef,
        /// Why the request was given up.
        reason: AbandonReason,
        /// The last failed attempt, if any attempt was made.
        last_error: Option<AttemptError>,
    },

    /// `build()` was called without a distributor.
    #[error("distributor has not been set and is required")]
    MissingDistributor,

    /// `stop()` gave up waiting for in-flight attempts.
    #[error("shutdown grace {grace:?} exceeded; {in_flight} worker(s) still attempting")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Workers that were still busy and got aborted.
        in_flight: usize,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use session_scheduler::SchedulerError;
    ///
    /// assert_eq!(SchedulerError::MissingDistributor.as_label(), "missing_distributor");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::SessionNotCreated { .. } => "session_not_created",
            SchedulerError::MissingDistributor => "missing_distributor",
            SchedulerError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    /// Abandon reason, for `SessionNotCreated`.
    pub fn reason(&self) -> Option<AbandonReason> {
        match self {
            SchedulerError::SessionNotCreated { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Last attempt error, for `SessionNotCreated`.
    pub fn last_error(&self) -> Option<&AttemptError> {
        match self {
            SchedulerError::SessionNotCreated { last_error, .. } => last_error.as_ref(),
            _ => None,
        }
    }

    /// Submitted payload, for `SessionNotCreated`.
    pub fn payload(&self) -> Option<&PayloadRef> {
        match self {
            SchedulerError::SessionNotCreated { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// # Why a single creation attempt failed.
///
/// All variants are soft: the worker loop absorbs them and consults the
/// request's retry cursor.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// No factory was available for any capability variant.
    #[error("no available factory matched")]
    NoMatch,

    /// The payload could not enumerate its capability variants.
    #[error("unable to enumerate capabilities: {error}")]
    Enumerate {
        /// The underlying error message.
        error: String,
    },

    /// The factory reported an error.
    #[error("factory {factory} failed: {error}")]
    Factory {
        /// Factory name.
        factory: String,
        /// The underlying error message.
        error: String,
    },

    /// The factory completed without producing a session.
    #[error("factory {factory} produced no session")]
    NoSession {
        /// Factory name.
        factory: String,
    },

    /// The attempt exceeded the configured attempt timeout.
    #[error("factory {factory} timed out after {timeout:?}")]
    Timeout {
        /// Factory name.
        factory: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The attempt panicked or was aborted.
    #[error("factory {factory} attempt panicked or was aborted")]
    Panicked {
        /// Factory name.
        factory: String,
    },
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::NoMatch => "attempt_no_match",
            AttemptError::Enumerate { .. } => "attempt_enumerate_failed",
            AttemptError::Factory { .. } => "attempt_factory_failed",
            AttemptError::NoSession { .. } => "attempt_no_session",
            AttemptError::Timeout { .. } => "attempt_timeout",
            AttemptError::Panicked { .. } => "attempt_panicked",
        }
    }

    /// True when a factory was reserved for the attempt.
    pub fn had_factory(&self) -> bool {
        !matches!(self, AttemptError::NoMatch | AttemptError::Enumerate { .. })
    }
}

/// # Errors returned by session factories.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Creation failed.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Talking to the host failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FactoryError {
    /// Convenience constructor for [`FactoryError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        FactoryError::Fail {
            error: error.into(),
        }
    }
}

/// Why a request was resolved without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbandonReason {
    /// The retry policy ran out of delays.
    Exhausted,
    /// The next retry could not be handed to the retry timer.
    ScheduleFailed,
    /// The scheduler was stopped while the request was waiting.
    Shutdown,
    /// The request was lost (its worker was aborted) before being resolved.
    Dropped,
    /// The caller stopped waiting before the request was served.
    CallerGone,
}

impl AbandonReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AbandonReason::Exhausted => "exhausted",
            AbandonReason::ScheduleFailed => "schedule_failed",
            AbandonReason::Shutdown => "shutdown",
            AbandonReason::Dropped => "dropped",
            AbandonReason::CallerGone => "caller_gone",
        }
    }
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AbandonReason::Exhausted => "retry policy exhausted",
            AbandonReason::ScheduleFailed => "unable to schedule retry",
            AbandonReason::Shutdown => "scheduler shutting down",
            AbandonReason::Dropped => "request dropped before completion",
            AbandonReason::CallerGone => "caller stopped waiting",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Capabilities, NewSessionPayload};
    use std::sync::Arc;

    #[test]
    fn session_not_created_mentions_payload_and_reason() {
        let payload: PayloadRef = Arc::new(NewSessionPayload::single(Capabilities::browser("x")));
        let err = SchedulerError::SessionNotCreated {
            payload,
            reason: AbandonReason::Exhausted,
            last_error: Some(AttemptError::NoMatch),
        };
        let msg = err.to_string();
        assert!(msg.contains("browserName"), "{msg}");
        assert!(msg.contains("retry policy exhausted"), "{msg}");
        assert_eq!(err.reason(), Some(AbandonReason::Exhausted));
        assert_eq!(err.last_error(), Some(&AttemptError::NoMatch));
        assert_eq!(err.as_label(), "session_not_created");
    }

    #[test]
    fn factory_error_from_io() {
        let err: FactoryError = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn had_factory_only_after_reservation() {
        assert!(!AttemptError::NoMatch.had_factory());
        assert!(
            AttemptError::NoSession {
                factory: "f".into()
            }
            .had_factory()
        );
    }
}
