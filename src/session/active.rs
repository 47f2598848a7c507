use std::fmt;
use std::sync::Arc;

use crate::session::{capabilities::Capabilities, payload::Dialect};

/// A running browser-automation session produced by a factory.
pub trait ActiveSession: fmt::Debug + Send + Sync + 'static {
    /// Session identifier assigned by the factory.
    fn id(&self) -> &str;

    /// Dialect the session speaks.
    fn dialect(&self) -> Dialect;

    /// Capabilities the session was actually created with.
    fn capabilities(&self) -> &Capabilities;

    /// Tears the session down.
    ///
    /// The scheduler calls this itself only for sessions nobody is waiting for
    /// any more; otherwise stopping is the caller's job.
    fn stop(&self);
}

/// Shared session handle returned by [`Scheduler::submit`](crate::Scheduler::submit).
pub type SessionRef = Arc<dyn ActiveSession>;
