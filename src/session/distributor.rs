//! # Distributors: capability → factory selection.
//!
//! The scheduler calls [`Distributor::match_factory`] while holding its matching
//! lock, so implementations must be synchronous and quick. Choosing the *best*
//! factory is entirely the distributor's concern; the scheduler only requires
//! that a returned factory be currently available.

use std::io;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::session::{capabilities::Capabilities, factory::FactoryRef};

/// Selects an available factory able to serve a capability description.
pub trait Distributor: Send + Sync + 'static {
    /// Returns zero or one available factory for `capabilities`.
    ///
    /// Errors are treated like `Ok(None)` for that capability variant.
    fn match_factory(&self, capabilities: &Capabilities) -> io::Result<Option<FactoryRef>>;
}

/// Shared distributor handle.
pub type DistributorRef = Arc<dyn Distributor>;

/// First-fit distributor over a registration-ordered list of factories.
#[derive(Default)]
pub struct StaticDistributor {
    factories: RwLock<Vec<FactoryRef>>,
}

impl StaticDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a distributor over `factories`, in order.
    pub fn with_factories(factories: impl IntoIterator<Item = FactoryRef>) -> Self {
        Self {
            factories: RwLock::new(factories.into_iter().collect()),
        }
    }

    /// Registers another factory at the end of the list.
    pub fn add(&self, factory: FactoryRef) {
        self.factories.write().push(factory);
    }

    /// Unregisters every factory named `name`. Returns how many were removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut factories = self.factories.write();
        let before = factories.len();
        factories.retain(|f| f.name() != name);
        before - factories.len()
    }

    /// Registered factory names, in order.
    pub fn names(&self) -> Vec<String> {
        self.factories
            .read()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }
}

impl Distributor for StaticDistributor {
    fn match_factory(&self, capabilities: &Capabilities) -> io::Result<Option<FactoryRef>> {
        Ok(self
            .factories
            .read()
            .iter()
            .find(|f| f.is_available() && f.supports(capabilities))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::factory::FactoryFn;

    fn idle(name: &'static str, browser: &str) -> FactoryRef {
        FactoryFn::arc(name, Capabilities::browser(browser), |_d, _c| async {
            Ok(None)
        })
    }

    #[test]
    fn picks_first_available_supporting_factory() {
        let dist = StaticDistributor::with_factories([
            idle("chrome-1", "chrome"),
            idle("firefox-1", "firefox"),
            idle("firefox-2", "firefox"),
        ]);

        let hit = dist
            .match_factory(&Capabilities::browser("firefox"))
            .expect("infallible")
            .expect("a firefox factory");
        assert_eq!(hit.name(), "firefox-1");

        hit.set_available(false);
        let next = dist
            .match_factory(&Capabilities::browser("firefox"))
            .expect("infallible")
            .expect("second firefox factory");
        assert_eq!(next.name(), "firefox-2");
    }

    #[test]
    fn no_match_for_unsupported_browser() {
        let dist = StaticDistributor::with_factories([idle("chrome-1", "chrome")]);
        let hit = dist
            .match_factory(&Capabilities::browser("safari"))
            .expect("infallible");
        assert!(hit.is_none());
    }

    #[test]
    fn add_and_remove_at_runtime() {
        let dist = StaticDistributor::new();
        dist.add(idle("a", "chrome"));
        dist.add(idle("b", "chrome"));
        assert_eq!(dist.names(), vec!["a", "b"]);
        assert_eq!(dist.remove("a"), 1);
        assert_eq!(dist.remove("missing"), 0);
        assert_eq!(dist.names(), vec!["b"]);
    }
}
