use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    matcher::Matcher,
    queue::RequestQueue,
    scheduler::{Scheduler, Shared},
    timer::RetryTimer,
};
use crate::{
    config::SchedulerConfig,
    error::SchedulerError,
    events::Bus,
    policies::RetryPolicy,
    session::DistributorRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Scheduler`].
///
/// The distributor is required; everything else has a default.
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    distributor: Option<DistributorRef>,
    retry: Option<RetryPolicy>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            distributor: None,
            retry: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the distributor used to match capabilities to factories.
    pub fn distribute_using(mut self, distributor: DistributorRef) -> Self {
        self.distributor = Some(distributor);
        self
    }

    /// Sets the retry policy, overriding [`SchedulerConfig::retry`].
    pub fn retry_using(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Replaces the runtime configuration.
    pub fn with_config(mut self, cfg: SchedulerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers.
    ///
    /// Each gets its own bounded queue and worker task.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the scheduler and starts its workers, retry timer, and event
    /// listener. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// [`SchedulerError::MissingDistributor`] when no distributor was set.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let distributor = self
            .distributor
            .ok_or(SchedulerError::MissingDistributor)?;

        let mut cfg = self.cfg;
        if let Some(retry) = self.retry {
            cfg.retry = retry;
        }

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subscribers = SubscriberSet::new(self.subscribers, bus.clone());
        let token = CancellationToken::new();
        let queue = Arc::new(RequestQueue::new());
        let (timer, driver) = RetryTimer::new(Arc::clone(&queue), bus.clone());
        let timer_task = tokio::spawn(driver.run(token.clone()));

        let shared = Arc::new(Shared {
            cfg,
            bus,
            queue,
            matcher: Matcher::new(distributor),
            timer,
            token,
        });
        Ok(Scheduler::start(shared, timer_task, subscribers))
    }
}
