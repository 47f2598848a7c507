//! # Match-and-reserve under the matching lock.
//!
//! The lock covers only the distributor query and the availability flip for
//! one request. It is never held across a creation attempt.
//!
//! A successful match yields a [`Reservation`]. Dropping it marks the factory
//! available again (under the same lock); [`Reservation::keep`] leaves it
//! unavailable for the lifetime of the session it produced.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::AttemptError,
    session::{Capabilities, DistributorRef, FactoryRef, Payload},
};

pub(crate) struct Matcher {
    distributor: DistributorRef,
    lock: Arc<Mutex<()>>,
}

impl Matcher {
    pub(crate) fn new(distributor: DistributorRef) -> Self {
        Self {
            distributor,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Reserves the first available factory across `payload`'s variants, in
    /// the payload's order.
    pub(crate) fn reserve(&self, payload: &dyn Payload) -> Result<Reservation, AttemptError> {
        let variants = payload
            .capability_variants()
            .map_err(|e| AttemptError::Enumerate {
                error: e.to_string(),
            })?;

        let _guard = self.lock.lock();
        for capabilities in variants {
            let factory = match self.distributor.match_factory(&capabilities) {
                Ok(Some(factory)) => factory,
                Ok(None) => continue,
                Err(err) => {
                    debug!(%capabilities, error = %err, "distributor failed; skipping variant");
                    continue;
                }
            };
            if !factory.is_available() {
                continue;
            }
            factory.set_available(false);
            return Ok(Reservation {
                factory,
                capabilities,
                lock: Arc::clone(&self.lock),
                kept: false,
            });
        }
        Err(AttemptError::NoMatch)
    }
}

/// A factory marked unavailable for one request.
pub(crate) struct Reservation {
    factory: FactoryRef,
    capabilities: Capabilities,
    lock: Arc<Mutex<()>>,
    kept: bool,
}

impl Reservation {
    #[inline]
    pub(crate) fn factory(&self) -> &FactoryRef {
        &self.factory
    }

    #[inline]
    pub(crate) fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Leaves the factory unavailable; it now backs a live session.
    pub(crate) fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.kept {
            let _guard = self.lock.lock();
            self.factory.set_available(true);
        }
    }
}
