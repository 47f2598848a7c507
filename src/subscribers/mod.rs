//! # Event subscribers.
//!
//! ```text
//! Worker/Timer ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                            ├──► LogWriter
//!                                                            └──► custom ...
//! ```
//!
//! - [`Subscribe`] the extension trait
//! - [`SubscriberSet`] per-subscriber bounded queues with panic isolation
//! - [`LogWriter`] renders events through `tracing`

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
