#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Barrier;

use session_scheduler::{
    ActiveSession, Capabilities, Dialect, FactoryError, FactoryRef, NewSessionPayload,
    RetryPolicy, Scheduler, SchedulerConfig, SessionFactory, SessionRef, StaticDistributor,
};

/// Factory names in the order attempts started.
pub type AttemptLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug)]
pub struct FakeSession {
    id: String,
    caps: Capabilities,
    stopped: AtomicBool,
}

impl FakeSession {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ActiveSession for FakeSession {
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
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// What a single attempt does.
#[derive(Clone)]
pub enum Outcome {
    Session,
    NoSession,
    Error,
    Panic,
    /// Never completes.
    Hang,
    /// Waits on the barrier, then creates a session.
    Rendezvous(Arc<Barrier>),
    /// Sleeps, then behaves like the inner outcome.
    After(Duration, Box<Outcome>),
}

pub struct FakeFactory {
    name: String,
    stereotype: Capabilities,
    available: AtomicBool,
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    attempts: AtomicUsize,
    double_reservations: AtomicUsize,
    sessions: Mutex<Vec<Arc<FakeSession>>>,
    log: AttemptLog,
}

impl FakeFactory {
    pub fn new(name: &str, browser: &str) -> Self {
        Self {
            name: name.to_string(),
            stereotype: Capabilities::browser(browser),
            available: AtomicBool::new(true),
            script: Mutex::new(VecDeque::new()),
            fallback: Outcome::NoSession,
            attempts: AtomicUsize::new(0),
            double_reservations: AtomicUsize::new(0),
            sessions: Mutex::new(Vec::new()),
            log: AttemptLog::default(),
        }
    }

    /// Outcomes for the first attempts, in order.
    pub fn script(self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        *self.script.lock() = outcomes.into_iter().collect();
        self
    }

    /// Outcome once the script is used up.
    pub fn otherwise(mut self, outcome: Outcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn with_log(mut self, log: &AttemptLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Times the factory was reserved while already reserved.
    pub fn double_reservations(&self) -> usize {
        self.double_reservations.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> Vec<Arc<FakeSession>> {
        self.sessions.lock().clone()
    }

    fn session(&self, caps: &Capabilities) -> SessionRef {
        let session = Arc::new(FakeSession {
            id: format!("{}-{}", self.name, self.attempts()),
            caps: caps.clone(),
            stopped: AtomicBool::new(false),
        });
        self.sessions.lock().push(Arc::clone(&session));
        session
    }

    async fn play(
        &self,
        outcome: Outcome,
        caps: &Capabilities,
    ) -> Result<Option<SessionRef>, FactoryError> {
        let mut outcome = outcome;
        while let Outcome::After(delay, inner) = outcome {
            tokio::time::sleep(delay).await;
            outcome = *inner;
        }
        match outcome {
            Outcome::Session => Ok(Some(self.session(caps))),
            Outcome::NoSession => Ok(None),
            Outcome::Error => Err(FactoryError::fail("browser failed to start")),
            Outcome::Panic => panic!("factory exploded"),
            Outcome::Hang => std::future::pending().await,
            Outcome::Rendezvous(barrier) => {
                barrier.wait().await;
                Ok(Some(self.session(caps)))
            }
            Outcome::After(..) => unreachable!("delays are unwrapped above"),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn set_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::SeqCst);
        if !available && !was {
            self.double_reservations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn supports(&self, capabilities: &Capabilities) -> bool {
        self.stereotype.satisfies(capabilities)
    }

    async fn attempt(
        &self,
        _dialects: &HashSet<Dialect>,
        capabilities: &Capabilities,
    ) -> Result<Option<SessionRef>, FactoryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(self.name.clone());
        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        self.play(outcome, capabilities).await
    }
}

pub fn payload(browser: &str) -> NewSessionPayload {
    NewSessionPayload::single(Capabilities::browser(browser))
}

pub fn config(workers: usize) -> SchedulerConfig {
    SchedulerConfig {
        workers,
        grace: Duration::from_secs(5),
        ..SchedulerConfig::default()
    }
}

pub fn scheduler(
    cfg: SchedulerConfig,
    policy: RetryPolicy,
    factories: Vec<Arc<FakeFactory>>,
) -> Scheduler {
    let factories = factories.into_iter().map(|f| f as FactoryRef);
    Scheduler::builder()
        .with_config(cfg)
        .distribute_using(Arc::new(StaticDistributor::with_factories(factories)))
        .retry_using(policy)
        .build()
        .expect("scheduler builds")
}

/// Yields until `cond` holds.
pub async fn until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        tokio::task::yield_now().await;
    }
}
