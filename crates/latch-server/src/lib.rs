//! Latch Server - HTTP boundary for the lease engine
//!
//! Exposes the lease lifecycle over a resource-oriented API. Authentication
//! happens upstream: callers arrive with an already-resolved identity and
//! permission verdict in trusted headers, and this layer only enforces
//! lease-ownership rules.

pub mod api;
pub mod model;
pub mod startup;
