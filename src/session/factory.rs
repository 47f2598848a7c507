//! # Session factories.
//!
//! A [`SessionFactory`] is one unit of session-creation capacity (a browser slot
//! on some host). It carries an availability flag that the scheduler flips while
//! holding its matching lock: `false` while reserved for an attempt (and for the
//! lifetime of a session it produced), `true` when free.
//!
//! [`FactoryFn`] wraps a closure into a factory, the same way the scheduler's
//! tests and small embeddings build one without a dedicated type.
//!
//! ## Example
//! ```rust
//! use session_scheduler::{Capabilities, FactoryFn, FactoryRef};
//!
//! let firefox: FactoryRef = FactoryFn::arc(
//!     "firefox-1",
//!     Capabilities::browser("firefox"),
//!     |_dialects, _caps| async move { Ok(None) },
//! );
//! assert!(firefox.is_available());
//! assert!(firefox.supports(&Capabilities::browser("firefox")));
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::FactoryError;
use crate::session::{active::SessionRef, capabilities::Capabilities, payload::Dialect};

/// Creates sessions for the capabilities it supports.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// Stable, human-readable name (for events and logs).
    fn name(&self) -> &str;

    /// Current availability.
    fn is_available(&self) -> bool;

    /// Sets availability. Called once per reservation and once per release.
    fn set_available(&self, available: bool);

    /// Whether this factory can serve `capabilities` at all.
    fn supports(&self, _capabilities: &Capabilities) -> bool {
        true
    }

    /// Tries to create a session.
    ///
    /// `Ok(None)`, `Err(_)`, a panic, or exceeding the scheduler's attempt
    /// timeout all count as a failed attempt.
    async fn attempt(
        &self,
        dialects: &HashSet<Dialect>,
        capabilities: &Capabilities,
    ) -> Result<Option<SessionRef>, FactoryError>;
}

/// Shared factory handle.
pub type FactoryRef = Arc<dyn SessionFactory>;

/// Atomic availability flag for factory implementations.
#[derive(Debug)]
pub struct Availability(AtomicBool);

impl Availability {
    pub fn new(available: bool) -> Self {
        Self(AtomicBool::new(available))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, available: bool) {
        self.0.store(available, Ordering::Release);
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Closure-backed factory.
///
/// The closure is called once per attempt with owned copies of the dialects and
/// the matched capabilities; it supports every request its stereotype satisfies.
pub struct FactoryFn<F> {
    name: Cow<'static, str>,
    stereotype: Capabilities,
    available: Availability,
    f: F,
}

impl<F, Fut> FactoryFn<F>
where
    F: Fn(HashSet<Dialect>, Capabilities) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<SessionRef>, FactoryError>> + Send + 'static,
{
    /// Creates an available factory.
    pub fn new(name: impl Into<Cow<'static, str>>, stereotype: Capabilities, f: F) -> Self {
        Self {
            name: name.into(),
            stereotype,
            available: Availability::default(),
            f,
        }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, stereotype: Capabilities, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, stereotype, f))
    }
}

impl<F> FactoryFn<F> {
    /// Capabilities this factory offers.
    pub fn stereotype(&self) -> &Capabilities {
        &self.stereotype
    }
}

impl<F> fmt::Debug for FactoryFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryFn")
            .field("name", &self.name)
            .field("stereotype", &self.stereotype)
            .field("available", &self.available.get())
            .finish()
    }
}

#[async_trait]
impl<F, Fut> SessionFactory for FactoryFn<F>
where
    F: Fn(HashSet<Dialect>, Capabilities) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<SessionRef>, FactoryError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    fn supports(&self, capabilities: &Capabilities) -> bool {
        self.stereotype.satisfies(capabilities)
    }

    async fn attempt(
        &self,
        dialects: &HashSet<Dialect>,
        capabilities: &Capabilities,
    ) -> Result<Option<SessionRef>, FactoryError> {
        (self.f)(dialects.clone(), capabilities.clone()).await
    }
}
