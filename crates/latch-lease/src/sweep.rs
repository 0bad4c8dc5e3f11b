//! Background sweeper that purges expired lease rows
//!
//! Expired leases are already semantically absent; the sweeper only reclaims
//! the rows. Deployments can run it in-process or disable it and call the
//! purge operation from an external scheduler instead.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::service::LeaseService;

/// Periodic expired-lease purger
pub struct ExpiredLeaseSweeper {
    service: Arc<LeaseService>,
    period: Duration,
}

impl ExpiredLeaseSweeper {
    pub fn new(service: Arc<LeaseService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Run the sweep loop (runs forever)
    pub async fn start(&self) {
        tracing::info!("lease sweeper started, period {:?}", self.period);
        let mut interval = tokio::time::interval(self.period);

        loop {
            interval.tick().await;
            match self.service.sweep_expired().await {
                Ok(purged) if purged > 0 => {
                    debug!("sweep pass removed {} leases", purged);
                }
                Ok(_) => {}
                Err(e) => {
                    error!("sweep pass failed: {}", e);
                }
            }
        }
    }
}
