//! Main entry point for the Latch lock server.
//!
//! Wires configuration, logging, the lease store backend, the lease service,
//! the background sweeper, and the HTTP server together.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use tracing::info;

use latch_lease::{
    DbLeaseStore, ExpirationPolicy, ExpiredLeaseSweeper, LeaseService, LeaseStore,
    MemoryLeaseStore,
};
use latch_server::{api, model, startup};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = model::Configuration::new();
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let storage_mode = configuration.storage_mode();
    info!("storage mode: {}", storage_mode);

    let store: Arc<dyn LeaseStore> = match storage_mode.as_str() {
        "database" => {
            let db = configuration.database_connection().await?;
            Arc::new(DbLeaseStore::new(db))
        }
        _ => Arc::new(MemoryLeaseStore::new()),
    };

    let policy = ExpirationPolicy::new(configuration.ttl_seconds());
    let lease_service = Arc::new(LeaseService::new(store, policy));

    let sweep_interval = configuration.sweep_interval_seconds();
    if sweep_interval > 0 {
        let sweeper = ExpiredLeaseSweeper::new(
            lease_service.clone(),
            Duration::from_secs(sweep_interval as u64),
        );
        tokio::spawn(async move { sweeper.start().await });
    } else {
        info!("background sweeper disabled; rely on the purge-expired endpoint");
    }

    let address = configuration.server_address();
    let port = configuration.server_port();
    let state = model::AppState::new(configuration);
    info!("lock API listening on {}:{}", address, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(lease_service.clone()))
            .service(api::v1::routes())
    })
    .bind((address, port))?
    .run()
    .await?;

    Ok(())
}
