//! Latch Lease - the lease lifecycle engine
//!
//! Advisory, expiring object-level locks ("leases") keyed by
//! `(resource_type, resource_id)`. This crate provides:
//! - The lease data model and composite key
//! - The expiration policy (pure TTL math)
//! - The storage abstraction with in-memory and external-database backends
//! - The lease service enforcing the locking state machine
//! - A background sweeper that purges expired rows

pub mod error;
pub mod model;
pub mod policy;
pub mod service;
pub mod store;
pub mod sweep;

pub use error::LeaseError;
pub use model::{Lease, LeaseHolder, LeaseKey};
pub use policy::ExpirationPolicy;
pub use service::LeaseService;
pub use store::{DbLeaseStore, LeaseStore, MemoryLeaseStore};
pub use sweep::ExpiredLeaseSweeper;
