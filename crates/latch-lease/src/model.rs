//! Lease data model
//!
//! A lease is a time-bounded advisory claim on a single resource instance,
//! identified by the composite `(resource_type, resource_id)` key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite lease identity: the kind of resource plus the instance id.
///
/// The serialized form `"{resource_type}.{resource_id}"` is the storage
/// primary key; the composite itself is the contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseKey {
    pub resource_type: String,
    pub resource_id: String,
}

impl LeaseKey {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Storage key format: resource_type.resource_id
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_id)
    }
}

impl fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.resource_id)
    }
}

/// Identity of the actor holding a lease
///
/// The id is an opaque identifier resolved by the caller; name and email are
/// display attributes so a blocked editor can be told who holds the lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseHolder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl LeaseHolder {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// An advisory lock on one resource instance
///
/// A lease whose `expires_at` has passed is semantically absent even while
/// the row still exists; the sweeper deletes such rows lazily.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub resource_type: String,
    pub resource_id: String,
    pub holder: LeaseHolder,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn new(key: LeaseKey, holder: LeaseHolder, expires_at: DateTime<Utc>) -> Self {
        Self {
            resource_type: key.resource_type,
            resource_id: key.resource_id,
            holder,
            expires_at,
        }
    }

    pub fn key(&self) -> LeaseKey {
        LeaseKey::new(self.resource_type.clone(), self.resource_id.clone())
    }

    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_id)
    }
}
