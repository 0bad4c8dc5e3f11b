//! V1 maintenance endpoints
//!
//! `purge-expired` is the entry point for external schedulers
//! (cron-equivalent); `config` hands polling clients the informational lock
//! settings.

use std::sync::Arc;

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use tracing::error;

use latch_common::ErrorCode;
use latch_lease::LeaseService;

use crate::model::app_state::AppState;

#[derive(Debug, Serialize)]
struct PurgeResponse {
    purged: u64,
}

#[derive(Debug, Serialize)]
struct LockConfigResponse {
    ttl_seconds: i64,
    ping_seconds: i64,
    release_grace_seconds: i64,
}

/// POST /v1/ops/lock/purge-expired
#[post("/lock/purge-expired")]
async fn purge_expired(service: web::Data<Arc<LeaseService>>) -> HttpResponse {
    match service.sweep_expired().await {
        Ok(purged) => HttpResponse::Ok().json(PurgeResponse { purged }),
        Err(e) => {
            error!("expired lease purge failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorCode::SERVER_ERROR)
        }
    }
}

/// GET /v1/ops/lock/config
#[get("/lock/config")]
async fn lock_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(LockConfigResponse {
        ttl_seconds: state.configuration.ttl_seconds(),
        ping_seconds: state.configuration.ping_seconds(),
        release_grace_seconds: state.configuration.grace_seconds(),
    })
}

pub fn routes() -> actix_web::Scope {
    web::scope("/ops").service(purge_expired).service(lock_config)
}
