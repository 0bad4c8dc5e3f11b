//! Lease service - the locking state machine
//!
//! Each key is either Unlocked or Locked(holder, expiry). The
//! read-modify-write inside acquire/release/force-acquire runs under a
//! per-key async mutex held only for the duration of the store calls, so two
//! concurrent acquires for one key yield exactly one winner while operations
//! on different keys never block each other. Conflicts are returned
//! immediately; nothing queues or retries here.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::LeaseError;
use crate::model::{Lease, LeaseHolder, LeaseKey};
use crate::policy::ExpirationPolicy;
use crate::store::LeaseStore;

/// Lease lifecycle manager
pub struct LeaseService {
    store: Arc<dyn LeaseStore>,
    policy: ExpirationPolicy,
    /// Per-key critical sections. Entries are kept for the lifetime of the
    /// service; the population is bounded by the set of edited resources.
    key_guards: DashMap<String, Arc<Mutex<()>>>,
}

impl LeaseService {
    pub fn new(store: Arc<dyn LeaseStore>, policy: ExpirationPolicy) -> Self {
        Self {
            store,
            policy,
            key_guards: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &ExpirationPolicy {
        &self.policy
    }

    fn key_guard(&self, key: &LeaseKey) -> Arc<Mutex<()>> {
        self.key_guards
            .entry(key.storage_key())
            .or_default()
            .clone()
    }

    /// Acquire or renew the lease on a key
    ///
    /// Succeeds when the key is unlocked, its lease has expired, or the
    /// caller already holds it (renewal, expiry extended to now + TTL).
    /// Fails with `Conflict` carrying the current lease when another actor
    /// holds it unexpired.
    pub async fn acquire(
        &self,
        key: &LeaseKey,
        holder: &LeaseHolder,
    ) -> Result<Lease, LeaseError> {
        let guard = self.key_guard(key);
        let _held = guard.lock().await;

        let now = Utc::now();
        if let Some(current) = self.store.get(key).await? {
            if !self.policy.is_expired(current.expires_at, now) && current.holder.id != holder.id {
                debug!(
                    "acquire conflict on {}: held by {} until {}",
                    key, current.holder.id, current.expires_at
                );
                return Err(LeaseError::Conflict(Box::new(current)));
            }
        }

        let lease = Lease::new(key.clone(), holder.clone(), self.policy.expiry_from(now));
        self.store.upsert(&lease).await?;
        debug!("lease on {} acquired by {}", key, holder.id);
        Ok(lease)
    }

    /// Unconditionally transfer the lease on a key to the caller
    ///
    /// Used when the caller has already confirmed intent to preempt the
    /// current holder; the prior lease, expired or not, is replaced.
    pub async fn force_acquire(
        &self,
        key: &LeaseKey,
        holder: &LeaseHolder,
    ) -> Result<Lease, LeaseError> {
        let guard = self.key_guard(key);
        let _held = guard.lock().await;

        let lease = Lease::new(
            key.clone(),
            holder.clone(),
            self.policy.expiry_from(Utc::now()),
        );
        self.store.upsert(&lease).await?;
        info!("lease on {} force-acquired by {}", key, holder.id);
        Ok(lease)
    }

    /// Release the lease on a key
    ///
    /// A missing lease is an idempotent no-op. When the caller holds the
    /// lease: deleted immediately if `timeout_seconds` is zero, otherwise
    /// the expiry is set `timeout_seconds` from now, a grace period during
    /// which the lease still blocks others but self-expires. A lease held by
    /// someone else is left untouched and reported as `Forbidden`.
    pub async fn release(
        &self,
        key: &LeaseKey,
        actor_id: &str,
        timeout_seconds: i64,
    ) -> Result<(), LeaseError> {
        let guard = self.key_guard(key);
        let _held = guard.lock().await;

        match self.store.get(key).await? {
            None => Ok(()),
            Some(current) if current.holder.id == actor_id => {
                if timeout_seconds <= 0 {
                    self.store.delete(key).await?;
                    debug!("lease on {} released by {}", key, actor_id);
                } else {
                    let expires_at = ExpirationPolicy::extend(Utc::now(), timeout_seconds);
                    self.store.update_expiry(key, expires_at).await?;
                    debug!(
                        "lease on {} released by {} with {}s grace",
                        key, actor_id, timeout_seconds
                    );
                }
                Ok(())
            }
            Some(current) => Err(LeaseError::Forbidden(Box::new(current))),
        }
    }

    /// All unexpired leases for a resource type, optionally one instance
    pub async fn query(
        &self,
        resource_type: &str,
        resource_id: Option<&str>,
    ) -> Result<Vec<Lease>, LeaseError> {
        let leases = self
            .store
            .list(resource_type, resource_id, true, Utc::now())
            .await?;
        Ok(leases)
    }

    /// Whether an unexpired lease exists whose holder is not the excluded
    /// actor. This is the edit-guard check: call it before persisting an
    /// edit and reject the save when it returns true.
    pub async fn is_locked(
        &self,
        key: &LeaseKey,
        excluding_actor: Option<&str>,
    ) -> Result<bool, LeaseError> {
        let now = Utc::now();
        match self.store.get(key).await? {
            Some(current) if !self.policy.is_expired(current.expires_at, now) => {
                Ok(excluding_actor != Some(current.holder.id.as_str()))
            }
            _ => Ok(false),
        }
    }

    /// Delete every lease whose expiry has passed. Safe to run concurrently
    /// with live acquire/release traffic; the store re-checks expiry at
    /// delete time. Returns the number of rows removed.
    pub async fn sweep_expired(&self) -> Result<u64, LeaseError> {
        let purged = self.store.delete_expired(Utc::now()).await?;
        if purged > 0 {
            info!("purged {} expired leases", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::store::MemoryLeaseStore;

    use super::*;

    fn holder(id: &str) -> LeaseHolder {
        LeaseHolder::new(id, id, format!("{id}@example.com"))
    }

    fn key(resource_id: &str) -> LeaseKey {
        LeaseKey::new("article", resource_id)
    }

    fn service() -> LeaseService {
        LeaseService::new(
            Arc::new(MemoryLeaseStore::new()),
            ExpirationPolicy::default(),
        )
    }

    /// Service sharing its store handle, for seeding rows directly
    fn service_with_store() -> (LeaseService, Arc<MemoryLeaseStore>) {
        let store = Arc::new(MemoryLeaseStore::new());
        let service = LeaseService::new(store.clone(), ExpirationPolicy::default());
        (service, store)
    }

    async fn seed_expired(store: &MemoryLeaseStore, key: &LeaseKey, holder_id: &str) {
        let lease = Lease::new(
            key.clone(),
            holder(holder_id),
            Utc::now() - Duration::minutes(10),
        );
        store.upsert(&lease).await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_creates_lease() {
        let service = service();
        let lease = service.acquire(&key("1"), &holder("alice")).await.unwrap();
        assert_eq!(lease.holder.id, "alice");
        assert!(lease.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_acquire_same_holder_extends_expiry() {
        let service = service();
        let first = service.acquire(&key("1"), &holder("alice")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let second = service.acquire(&key("1"), &holder("alice")).await.unwrap();
        assert!(second.expires_at > first.expires_at);
    }

    #[tokio::test]
    async fn test_acquire_conflict_for_other_holder() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();

        let err = service
            .acquire(&key("1"), &holder("bob"))
            .await
            .unwrap_err();
        match err {
            LeaseError::Conflict(current) => assert_eq!(current.holder.id, "alice"),
            other => panic!("expected conflict, got {other:?}"),
        }

        // Loser must not have overwritten the winner's lease
        let leases = service.query("article", Some("1")).await.unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].holder.id, "alice");
    }

    #[tokio::test]
    async fn test_acquire_takes_over_expired_lease() {
        let (service, store) = service_with_store();
        seed_expired(&store, &key("1"), "alice").await;

        let lease = service.acquire(&key("1"), &holder("bob")).await.unwrap();
        assert_eq!(lease.holder.id, "bob");
    }

    #[tokio::test]
    async fn test_acquire_different_keys_do_not_conflict() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();
        service.acquire(&key("2"), &holder("bob")).await.unwrap();

        let leases = service.query("article", None).await.unwrap();
        assert_eq!(leases.len(), 2);
    }

    #[tokio::test]
    async fn test_force_acquire_transfers_holder() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();

        let lease = service
            .force_acquire(&key("1"), &holder("bob"))
            .await
            .unwrap();
        assert_eq!(lease.holder.id, "bob");

        let leases = service.query("article", Some("1")).await.unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].holder.id, "bob");
    }

    #[tokio::test]
    async fn test_force_acquire_extends_expiry_for_same_holder() {
        let service = service();
        let first = service.acquire(&key("1"), &holder("alice")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let second = service
            .force_acquire(&key("1"), &holder("alice"))
            .await
            .unwrap();
        assert!(second.expires_at > first.expires_at);
    }

    #[tokio::test]
    async fn test_release_by_holder_deletes() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();
        service.release(&key("1"), "alice", 0).await.unwrap();

        let leases = service.query("article", Some("1")).await.unwrap();
        assert!(leases.is_empty());
    }

    #[tokio::test]
    async fn test_release_with_grace_schedules_expiry() {
        let (service, store) = service_with_store();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();
        service.release(&key("1"), "alice", 30).await.unwrap();

        // Still present and still blocking others during the grace window
        let current = store.get(&key("1")).await.unwrap().unwrap();
        let remaining = current.expires_at - Utc::now();
        assert!(remaining <= Duration::seconds(30));
        assert!(remaining > Duration::seconds(25));
        assert!(service.is_locked(&key("1"), Some("bob")).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_by_other_actor_forbidden() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();

        let err = service.release(&key("1"), "bob", 0).await.unwrap_err();
        match err {
            LeaseError::Forbidden(current) => assert_eq!(current.holder.id, "alice"),
            other => panic!("expected forbidden, got {other:?}"),
        }

        // Lease unchanged
        let leases = service.query("article", Some("1")).await.unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].holder.id, "alice");
    }

    #[tokio::test]
    async fn test_release_absent_key_is_noop() {
        let service = service();
        service.release(&key("1"), "alice", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_excludes_expired() {
        let (service, store) = service_with_store();
        seed_expired(&store, &key("1"), "alice").await;
        service.acquire(&key("2"), &holder("bob")).await.unwrap();

        let leases = service.query("article", None).await.unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].holder.id, "bob");
    }

    #[tokio::test]
    async fn test_is_locked_excluding_actor() {
        let service = service();
        service.acquire(&key("1"), &holder("alice")).await.unwrap();

        assert!(service.is_locked(&key("1"), None).await.unwrap());
        assert!(service.is_locked(&key("1"), Some("bob")).await.unwrap());
        assert!(!service.is_locked(&key("1"), Some("alice")).await.unwrap());
        assert!(!service.is_locked(&key("2"), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_locked_ignores_expired() {
        let (service, store) = service_with_store();
        seed_expired(&store, &key("1"), "alice").await;
        assert!(!service.is_locked(&key("1"), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (service, store) = service_with_store();
        seed_expired(&store, &key("1"), "alice").await;
        seed_expired(&store, &key("2"), "bob").await;
        service.acquire(&key("3"), &holder("carol")).await.unwrap();

        let purged = service.sweep_expired().await.unwrap();
        assert_eq!(purged, 2);
        assert_eq!(store.len(), 1);
        assert!(service.is_locked(&key("3"), None).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_acquire_single_winner() {
        let service = Arc::new(service());
        let contended = key("hot");

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            let contended = contended.clone();
            handles.push(tokio::spawn(async move {
                service.acquire(&contended, &holder(&format!("actor-{i}"))).await
            }));
        }

        let mut winners = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(LeaseError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(conflicts, 7);

        let leases = service.query("article", Some("hot")).await.unwrap();
        assert_eq!(leases.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sweep_concurrent_with_acquires() {
        let (service, store) = service_with_store();
        let service = Arc::new(service);
        for i in 0..20 {
            seed_expired(&store, &key(&format!("stale-{i}")), "alice").await;
        }

        let sweeper = {
            let service = service.clone();
            tokio::spawn(async move { service.sweep_expired().await })
        };
        let mut acquires = Vec::new();
        for i in 0..20 {
            let service = service.clone();
            acquires.push(tokio::spawn(async move {
                service
                    .acquire(&key(&format!("live-{i}")), &holder("bob"))
                    .await
            }));
        }

        sweeper.await.unwrap().unwrap();
        for handle in acquires {
            handle.await.unwrap().unwrap();
        }

        let live = service.query("article", None).await.unwrap();
        assert_eq!(live.len(), 20);
        assert!(live.iter().all(|l| l.resource_id.starts_with("live-")));
    }
}
