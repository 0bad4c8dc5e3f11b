//! In-memory lease store
//!
//! Backed by a `DashMap` keyed by the composite storage key. The expiry
//! check inside `delete_expired` runs under the shard lock, so a row that is
//! renewed between selection and deletion is kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::model::{Lease, LeaseKey};

use super::LeaseStore;

/// In-memory lease registry
#[derive(Clone, Default)]
pub struct MemoryLeaseStore {
    leases: DashMap<String, Lease>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self {
            leases: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn get(&self, key: &LeaseKey) -> anyhow::Result<Option<Lease>> {
        Ok(self
            .leases
            .get(&key.storage_key())
            .map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, lease: &Lease) -> anyhow::Result<()> {
        self.leases.insert(lease.storage_key(), lease.clone());
        Ok(())
    }

    async fn delete(&self, key: &LeaseKey) -> anyhow::Result<()> {
        self.leases.remove(&key.storage_key());
        Ok(())
    }

    async fn update_expiry(&self, key: &LeaseKey, expires_at: DateTime<Utc>) -> anyhow::Result<()> {
        if let Some(mut entry) = self.leases.get_mut(&key.storage_key()) {
            entry.expires_at = expires_at;
        }
        Ok(())
    }

    async fn list(
        &self,
        resource_type: &str,
        resource_id: Option<&str>,
        unexpired_only: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Lease>> {
        let leases = self
            .leases
            .iter()
            .filter(|entry| {
                let lease = entry.value();
                let type_match = lease.resource_type == resource_type;
                let id_match = resource_id.is_none_or(|id| lease.resource_id == id);
                let expiry_match = !unexpired_only || lease.expires_at > now;
                type_match && id_match && expiry_match
            })
            .map(|entry| entry.value().clone())
            .collect();
        Ok(leases)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut purged = 0u64;
        self.leases.retain(|_, lease| {
            if lease.expires_at < now {
                purged += 1;
                false
            } else {
                true
            }
        });
        Ok(purged)
    }
}
