//! Typed results for lease operations
//!
//! The service returns one of these kinds instead of a generic failure so the
//! boundary can map each deterministically to a status code.

use crate::model::Lease;

/// Lease operation errors
#[derive(thiserror::Error, Debug)]
pub enum LeaseError {
    /// The resource is held, unexpired, by a different actor. The current
    /// lease is attached so the caller can display who holds it.
    #[error("object is locked by another holder")]
    Conflict(Box<Lease>),

    /// The actor tried to release a lease it does not hold.
    #[error("lease is held by another holder")]
    Forbidden(Box<Lease>),

    /// Underlying storage failure; fatal for the current request.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LeaseError {
    /// The lease attached to a conflict or forbidden result, if any
    pub fn current_lease(&self) -> Option<&Lease> {
        match self {
            LeaseError::Conflict(lease) | LeaseError::Forbidden(lease) => Some(lease),
            LeaseError::Storage(_) => None,
        }
    }
}
