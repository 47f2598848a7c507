//! Runtime core: request flow and lifecycle.
//!
//! The only public API from this module is [`Scheduler`] and its
//! [`SchedulerBuilder`].
//!
//! Internal modules:
//! - [`request`]: one caller's pending ask with its write-once reply;
//! - [`queue`]: double-ended queue workers wait on;
//! - [`matcher`]: match-and-reserve under the matching lock;
//! - [`worker`]: dequeue, attempt, resolve or retry;
//! - [`timer`]: delayed head re-entry of retried requests;
//! - [`scheduler`]: wiring, submit, and graceful stop.

mod builder;
mod matcher;
mod queue;
mod request;
mod scheduler;
mod timer;
mod worker;

pub use builder::SchedulerBuilder;
pub use scheduler::Scheduler;
