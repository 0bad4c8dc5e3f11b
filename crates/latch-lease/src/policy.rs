//! Expiration policy - pure TTL math
//!
//! Every function is deterministic given an injected `now`; no clocks are
//! read here so the rules are trivially testable.

use chrono::{DateTime, Duration, Utc};

/// Default lease lifetime in seconds
pub const DEFAULT_TTL_SECONDS: i64 = 180;

/// TTL rules for leases
#[derive(Clone, Copy, Debug)]
pub struct ExpirationPolicy {
    ttl_seconds: i64,
}

impl ExpirationPolicy {
    pub fn new(ttl_seconds: i64) -> Self {
        Self { ttl_seconds }
    }

    /// Configured lease lifetime in seconds
    pub fn default_ttl(&self) -> i64 {
        self.ttl_seconds
    }

    /// Expiry comparison is strict: a lease whose expiry equals `now` is
    /// already expired, so there is no flapping at the boundary instant.
    pub fn is_expired(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        expires_at <= now
    }

    /// Absolute expiry `ttl_seconds` after `now`
    pub fn extend(now: DateTime<Utc>, ttl_seconds: i64) -> DateTime<Utc> {
        now + Duration::seconds(ttl_seconds)
    }

    /// Expiry for a lease created or renewed at `now`
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Self::extend(now, self.ttl_seconds)
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_from_adds_ttl() {
        let policy = ExpirationPolicy::new(180);
        let now = Utc::now();
        assert_eq!(policy.expiry_from(now), now + Duration::seconds(180));
    }

    #[test]
    fn test_is_expired_boundary_is_strict() {
        let policy = ExpirationPolicy::default();
        let now = Utc::now();
        assert!(policy.is_expired(now, now));
        assert!(policy.is_expired(now - Duration::seconds(1), now));
        assert!(!policy.is_expired(now + Duration::seconds(1), now));
    }

    #[test]
    fn test_extend_is_deterministic() {
        let now = Utc::now();
        assert_eq!(
            ExpirationPolicy::extend(now, 30),
            ExpirationPolicy::extend(now, 30)
        );
    }
}
