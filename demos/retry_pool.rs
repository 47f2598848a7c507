//! # Example: retry_pool
//!
//! Two flaky browser slots behind one scheduler.
//!
//! Shows how to:
//! - Build factories with [`FactoryFn`] and register them in a [`StaticDistributor`].
//! - Chain retry stages (`immediately → 500ms → backoff`).
//! - Attach a custom [`Subscribe`] implementation next to the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! submit ×4 ──► queue ──► workers ──► factory.attempt()
//!                 ▲                      ├─ session → caller
//!                 └── RetryTimer ◄───────┴─ failure (release slot, wait, head of queue)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_pool
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use session_scheduler::{
    ActiveSession, BackoffPolicy, Capabilities, Dialect, Event, EventKind, FactoryError, FactoryFn,
    FactoryRef, LogWriter, NewSessionPayload, RetryPolicy, Scheduler, SchedulerConfig, SessionRef,
    StaticDistributor, Subscribe,
};

#[derive(Debug)]
struct DemoSession {
    id: String,
    caps: Capabilities,
}

impl ActiveSession for DemoSession {
    fn id(&self) -> &str {
        &self.id
    }
    fn dialect(&self) -> Dialect {
        Dialect::W3c
    }
    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }
    fn stop(&self) {
        println!("[demo] stopping {}", self.id);
    }
}

/// Prints a one-line summary per request outcome.
struct Console;

#[async_trait::async_trait]
impl Subscribe for Console {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::SessionCreated => println!(
                "[sub] request={} created on {} (attempt {})",
                ev.request.unwrap_or(0),
                ev.factory.as_deref().unwrap_or("?"),
                ev.attempt.unwrap_or(0)
            ),
            EventKind::RetryScheduled => println!(
                "[sub] request={} retry in {:?}",
                ev.request.unwrap_or(0),
                ev.delay.unwrap_or_default()
            ),
            EventKind::RequestAbandoned => println!(
                "[sub] request={} abandoned: {}",
                ev.request.unwrap_or(0),
                ev.reason.as_deref().unwrap_or("?")
            ),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Factory that fails every other attempt.
fn flaky(name: &'static str) -> FactoryRef {
    let calls = Arc::new(AtomicUsize::new(0));
    FactoryFn::arc(name, Capabilities::browser("firefox"), move |_dialects, caps| {
        let calls = Arc::clone(&calls);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(150)).await;
            if n % 2 == 0 {
                return Err(FactoryError::fail("browser crashed on startup"));
            }
            let session: SessionRef = Arc::new(DemoSession {
                id: format!("{name}-{n}"),
                caps,
            });
            Ok(Some(session))
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let distributor = Arc::new(StaticDistributor::with_factories([
        flaky("firefox-1"),
        flaky("firefox-2"),
    ]));

    let retry = RetryPolicy::immediately()
        .or_else(RetryPolicy::after(Duration::from_millis(500)))
        .or_else(RetryPolicy::backoff(
            BackoffPolicy::exponential(Duration::from_millis(250), Duration::from_secs(2)),
            4,
        ));

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Console), Arc::new(LogWriter::new())];
    let scheduler = Arc::new(
        Scheduler::builder()
            .with_config(SchedulerConfig {
                workers: 2,
                attempt_timeout: Duration::from_secs(5),
                ..SchedulerConfig::default()
            })
            .distribute_using(distributor)
            .retry_using(retry)
            .with_subscribers(subscribers)
            .build()?,
    );

    let mut callers = Vec::new();
    for _ in 0..4 {
        let scheduler = Arc::clone(&scheduler);
        callers.push(tokio::spawn(async move {
            scheduler
                .submit(NewSessionPayload::single(Capabilities::browser("firefox")))
                .await
        }));
    }

    for caller in callers {
        match caller.await? {
            Ok(session) => {
                println!("[demo] got {}", session.id());
                session.stop();
            }
            Err(err) => println!("[demo] {err}"),
        }
    }

    scheduler.stop().await?;
    Ok(())
}
