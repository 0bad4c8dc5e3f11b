//! V1 lock endpoints
//!
//! Resource-oriented API over the lease collection, scoped by resource type
//! and optional resource id:
//! - `GET    /v1/lock/{type}` and `GET /v1/lock/{type}/{id}` - read leases
//! - `POST   /v1/lock/{type}/{id}` - acquire or renew
//! - `PUT    /v1/lock/{type}/{id}` - force-acquire
//! - `DELETE /v1/lock/{type}/{id}` - release

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::error;

use latch_common::{ErrorCode, is_valid};
use latch_lease::{LeaseError, LeaseKey, LeaseService};

use crate::api::authorize;
use crate::model::app_state::AppState;

fn resource_type_mapped(state: &AppState, resource_type: &str) -> bool {
    let allowed = state.configuration.resource_types();
    allowed.is_empty() || allowed.iter().any(|t| t == resource_type)
}

fn storage_failure(err: &LeaseError) -> HttpResponse {
    error!("lease storage failure: {}", err);
    HttpResponse::InternalServerError().json(ErrorCode::SERVER_ERROR)
}

/// GET /v1/lock/{resource_type}
#[get("/{resource_type}")]
async fn list_for_type(
    req: HttpRequest,
    state: web::Data<AppState>,
    service: web::Data<Arc<LeaseService>>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(denied) = authorize(&req) {
        return denied;
    }

    let resource_type = path.into_inner();
    if !is_valid(&resource_type) {
        return HttpResponse::BadRequest().json(ErrorCode::ILLEGAL_ARGUMENT);
    }
    if !resource_type_mapped(&state, &resource_type) {
        return HttpResponse::NotFound().json(ErrorCode::RESOURCE_TYPE_UNKNOWN);
    }

    match service.query(&resource_type, None).await {
        Ok(leases) => HttpResponse::Ok().json(leases),
        Err(e) => storage_failure(&e),
    }
}

/// GET /v1/lock/{resource_type}/{resource_id}
#[get("/{resource_type}/{resource_id}")]
async fn list_for_resource(
    req: HttpRequest,
    state: web::Data<AppState>,
    service: web::Data<Arc<LeaseService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    if let Err(denied) = authorize(&req) {
        return denied;
    }

    let (resource_type, resource_id) = path.into_inner();
    if !is_valid(&resource_type) || !is_valid(&resource_id) {
        return HttpResponse::BadRequest().json(ErrorCode::ILLEGAL_ARGUMENT);
    }
    if !resource_type_mapped(&state, &resource_type) {
        return HttpResponse::NotFound().json(ErrorCode::RESOURCE_TYPE_UNKNOWN);
    }

    match service.query(&resource_type, Some(&resource_id)).await {
        Ok(leases) => HttpResponse::Ok().json(leases),
        Err(e) => storage_failure(&e),
    }
}

/// POST /v1/lock/{resource_type}/{resource_id}
///
/// Acquire or renew a lease. A conflict returns 409 with the current lease
/// in the body so the caller can display who holds it.
#[post("/{resource_type}/{resource_id}")]
async fn acquire(
    req: HttpRequest,
    state: web::Data<AppState>,
    service: web::Data<Arc<LeaseService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let actor = match authorize(&req) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };

    let (resource_type, resource_id) = path.into_inner();
    if !is_valid(&resource_type) || !is_valid(&resource_id) {
        return HttpResponse::BadRequest().json(ErrorCode::ILLEGAL_ARGUMENT);
    }
    if !resource_type_mapped(&state, &resource_type) {
        return HttpResponse::NotFound().json(ErrorCode::RESOURCE_TYPE_UNKNOWN);
    }

    let key = LeaseKey::new(resource_type, resource_id);
    match service.acquire(&key, &actor).await {
        Ok(lease) => HttpResponse::Ok().json(lease),
        Err(LeaseError::Conflict(current)) => HttpResponse::Conflict().json(*current),
        Err(e) => storage_failure(&e),
    }
}

/// PUT /v1/lock/{resource_type}/{resource_id}
///
/// Force-acquire: assign the lease to the caller even if someone else holds
/// it. The caller is expected to have confirmed the preemption already.
#[put("/{resource_type}/{resource_id}")]
async fn force_acquire(
    req: HttpRequest,
    state: web::Data<AppState>,
    service: web::Data<Arc<LeaseService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let actor = match authorize(&req) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };

    let (resource_type, resource_id) = path.into_inner();
    if !is_valid(&resource_type) || !is_valid(&resource_id) {
        return HttpResponse::BadRequest().json(ErrorCode::ILLEGAL_ARGUMENT);
    }
    if !resource_type_mapped(&state, &resource_type) {
        return HttpResponse::NotFound().json(ErrorCode::RESOURCE_TYPE_UNKNOWN);
    }

    let key = LeaseKey::new(resource_type, resource_id);
    match service.force_acquire(&key, &actor).await {
        Ok(lease) => HttpResponse::Ok().json(lease),
        Err(e) => storage_failure(&e),
    }
}

/// DELETE /v1/lock/{resource_type}/{resource_id}
///
/// Release the caller's lease. Absent leases release successfully; a lease
/// held by someone else is left in place and answered with 403. A configured
/// grace period schedules expiry instead of deleting immediately.
#[delete("/{resource_type}/{resource_id}")]
async fn release(
    req: HttpRequest,
    state: web::Data<AppState>,
    service: web::Data<Arc<LeaseService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let actor = match authorize(&req) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };

    let (resource_type, resource_id) = path.into_inner();
    if !is_valid(&resource_type) || !is_valid(&resource_id) {
        return HttpResponse::BadRequest().json(ErrorCode::ILLEGAL_ARGUMENT);
    }
    if !resource_type_mapped(&state, &resource_type) {
        return HttpResponse::NotFound().json(ErrorCode::RESOURCE_TYPE_UNKNOWN);
    }

    let key = LeaseKey::new(resource_type, resource_id);
    let grace = state.configuration.grace_seconds();
    match service.release(&key, &actor.id, grace).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(LeaseError::Forbidden(_)) => HttpResponse::Forbidden().json(ErrorCode::LEASE_HELD),
        Err(e) => storage_failure(&e),
    }
}

pub fn routes() -> actix_web::Scope {
    web::scope("/lock")
        .service(list_for_type)
        .service(list_for_resource)
        .service(acquire)
        .service(force_acquire)
        .service(release)
}
