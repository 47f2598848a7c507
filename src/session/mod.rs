//! Collaborator interfaces.
//!
//! Everything the scheduler consumes but does not implement lives here:
//!
//! - [`Capabilities`] desired (or offered) session properties
//! - [`Payload`] a caller's ordered capability variants + [`Dialect`]s
//! - [`SessionFactory`] one unit of creation capacity with an availability flag
//! - [`Distributor`] picks an available factory for a capability
//! - [`ActiveSession`] the product of a successful attempt
//!
//! Reference implementations ([`NewSessionPayload`], [`FactoryFn`],
//! [`StaticDistributor`]) cover wiring and tests.

mod active;
mod capabilities;
mod distributor;
mod factory;
mod payload;

pub use active::{ActiveSession, SessionRef};
pub use capabilities::Capabilities;
pub use distributor::{Distributor, DistributorRef, StaticDistributor};
pub use factory::{Availability, FactoryFn, FactoryRef, SessionFactory};
pub use payload::{Dialect, NewSessionPayload, Payload, PayloadRef};
