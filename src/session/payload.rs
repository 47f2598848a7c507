//! # New-session payloads.
//!
//! A [`Payload`] is what a caller hands to [`Scheduler::submit`](crate::Scheduler::submit):
//! an ordered list of acceptable capability variants (first is preferred) and the
//! protocol dialects the caller speaks. Parsing the wire format into a payload is
//! the caller's business; [`NewSessionPayload`] is a ready-made in-memory one.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::session::capabilities::Capabilities;

/// Protocol variant a downstream caller expects the session to speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Legacy JSON wire protocol.
    Oss,
    /// W3C WebDriver.
    W3c,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Oss => f.write_str("OSS"),
            Dialect::W3c => f.write_str("W3C"),
        }
    }
}

/// Source of capability variants for one session request.
///
/// `Debug` is used when reporting a request that could not be served.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Acceptable capability variants, most preferred first.
    ///
    /// An error is treated by the scheduler exactly like "no factory matched".
    fn capability_variants(&self) -> io::Result<Vec<Capabilities>>;

    /// Dialects passed through unchanged to [`SessionFactory::attempt`](crate::SessionFactory::attempt).
    fn downstream_dialects(&self) -> HashSet<Dialect>;
}

/// Shared payload handle.
pub type PayloadRef = Arc<dyn Payload>;

/// In-memory payload: a fixed list of variants and dialects.
#[derive(Clone, Debug)]
pub struct NewSessionPayload {
    variants: Vec<Capabilities>,
    dialects: HashSet<Dialect>,
}

impl NewSessionPayload {
    /// Payload with the given variants, speaking W3C only.
    pub fn new(variants: Vec<Capabilities>) -> Self {
        Self {
            variants,
            dialects: HashSet::from([Dialect::W3c]),
        }
    }

    /// Payload with a single variant.
    pub fn single(capabilities: Capabilities) -> Self {
        Self::new(vec![capabilities])
    }

    /// Replaces the downstream dialects.
    #[must_use]
    pub fn with_dialects(mut self, dialects: impl IntoIterator<Item = Dialect>) -> Self {
        self.dialects = dialects.into_iter().collect();
        self
    }
}

impl Payload for NewSessionPayload {
    fn capability_variants(&self) -> io::Result<Vec<Capabilities>> {
        Ok(self.variants.clone())
    }

    fn downstream_dialects(&self) -> HashSet<Dialect> {
        self.dialects.clone()
    }
}
