//! Lease storage abstraction
//!
//! Defines the interface for durable, race-safe CRUD over lease records and
//! provides two backends: an in-memory store and an external-database store.

pub mod entity;
pub mod memory;
pub mod sql;

pub use memory::MemoryLeaseStore;
pub use sql::DbLeaseStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{Lease, LeaseKey};

/// Keyed lease storage
///
/// `upsert` is insert-or-replace on the storage key. Callers serialize
/// read-modify-write sequences per key (the lease service holds a per-key
/// critical section), so last-writer-wins inside `upsert` is acceptable.
/// All operations surface I/O failures as errors; none silently swallow them.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Fetch the lease for a key, expired or not
    async fn get(&self, key: &LeaseKey) -> anyhow::Result<Option<Lease>>;

    /// Atomic insert-or-replace keyed by the lease's storage key
    async fn upsert(&self, lease: &Lease) -> anyhow::Result<()>;

    /// Delete the lease for a key; deleting an absent key is not an error
    async fn delete(&self, key: &LeaseKey) -> anyhow::Result<()>;

    /// Partial update touching only the expiry field (timed release)
    async fn update_expiry(&self, key: &LeaseKey, expires_at: DateTime<Utc>) -> anyhow::Result<()>;

    /// Leases for a resource type, optionally narrowed to one instance.
    /// With `unexpired_only` set, rows with `expires_at <= now` are filtered.
    async fn list(
        &self,
        resource_type: &str,
        resource_id: Option<&str>,
        unexpired_only: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Lease>>;

    /// Bulk delete of rows with `expires_at < now`, re-checked at delete
    /// time so a concurrent renewal is never lost. Returns the number of
    /// rows removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
}
