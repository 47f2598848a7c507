//! # session-scheduler
//!
//! **session-scheduler** turns "give me a browser session with these
//! capabilities" into a session, using a fixed pool of workers, a pool of
//! session factories, and a per-request retry policy.
//!
//! Callers `submit` a payload and wait. Workers take requests from a shared
//! double-ended queue, match them to an available factory under a narrow lock,
//! attempt creation outside the lock, and either resolve the request or hand it
//! to the retry timer, which puts it back at the *head* of the queue once its
//! delay elapses.
//!
//! ## Architecture
//! ```text
//!   caller ─ submit(payload) ─┐                      ┌─► Waiter (session | SessionNotCreated)
//!                             ▼                      │
//! ┌──────────────────────────────────────────────────┴────────────────────┐
//! │  Scheduler                                                            │
//! │  - RequestQueue (new at tail, retries at head)                        │
//! │  - Matcher (Distributor + matching lock → Reservation)                │
//! │  - RetryTimer (DelayQueue → push_front)                               │
//! │  - Bus → listener → SubscriberSet                                     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ Worker 0 │       │ Worker 1 │  ...  │ Worker N │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ reserve ─► SessionFactory::attempt ─► resolve | retry | abandon
//!        │
//!        └─ publishes AttemptStarting, FactoryReserved, SessionCreated,
//!           AttemptFailed, RetryScheduled, RequestAbandoned, ...
//! ```
//!
//! ### Request lifecycle
//! ```text
//! submit ──► cursor.advance()
//!              ├─ None      ─► abandon(Exhausted)
//!              └─ Some(d)   ─► wait d on the caller's task ─► queue.push_back
//!
//! worker: pop_front ─► reserve ─► attempt
//!   ├─ Ok(session) ─► complete (factory stays unavailable)
//!   └─ Err(e)      ─► release factory, last_error = e, cursor.advance()
//!                       ├─ None     ─► abandon(Exhausted)
//!                       └─ Some(d)  ─► timer ── d ──► queue.push_front
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                                 |
//! |-------------------|----------------------------------------------------------------|----------------------------------------------------|
//! | **Scheduling**    | Worker pool, submit/stop, graceful shutdown.                   | [`Scheduler`], [`SchedulerBuilder`]                |
//! | **Policies**      | Per-request delay sequences, chaining, backoff stages.         | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Collaborators** | Factories, distributors, payloads, sessions.                   | [`SessionFactory`], [`Distributor`], [`Payload`]   |
//! | **Subscriber API**| Hook into request lifecycle events.                            | [`Subscribe`], [`LogWriter`]                       |
//! | **Errors**        | Typed errors with stable labels.                               | [`SchedulerError`], [`AttemptError`]               |
//! | **Configuration** | Worker count, attempt timeout, grace, bus capacity.            | [`SchedulerConfig`]                                |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use session_scheduler::{
//!     Capabilities, FactoryFn, FactoryRef, NewSessionPayload, RetryPolicy, Scheduler,
//!     SchedulerConfig, StaticDistributor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A factory that never manages to start a browser.
//!     let chrome: FactoryRef = FactoryFn::arc("chrome-1", Capabilities::browser("chrome"), |_d, _c| async {
//!         Ok(None)
//!     });
//!
//!     let scheduler = Scheduler::builder()
//!         .with_config(SchedulerConfig { workers: 1, ..SchedulerConfig::default() })
//!         .distribute_using(Arc::new(StaticDistributor::with_factories([chrome])))
//!         .retry_using(RetryPolicy::immediately())
//!         .build()?;
//!
//!     let err = scheduler
//!         .submit(NewSessionPayload::single(Capabilities::browser("chrome")))
//!         .await
//!         .expect_err("factory never produces a session");
//!     assert_eq!(err.as_label(), "session_not_created");
//!
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod session;
mod subscribers;

// ---- Public re-exports ----

pub use config::SchedulerConfig;
pub use core::{Scheduler, SchedulerBuilder};
pub use error::{AbandonReason, AttemptError, FactoryError, SchedulerError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, Delays, JitterPolicy, RetryCursor, RetryPolicy};
pub use session::{
    ActiveSession, Availability, Capabilities, Dialect, Distributor, DistributorRef, FactoryFn,
    FactoryRef, NewSessionPayload, Payload, PayloadRef, SessionFactory, SessionRef,
    StaticDistributor,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
