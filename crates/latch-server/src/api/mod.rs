//! HTTP API for the lease engine
//!
//! The caller (an authenticating front proxy or application layer) resolves
//! identity and the "may this actor modify this resource type" verdict before
//! the request reaches these handlers, and passes both in trusted headers.

use actix_web::{HttpRequest, HttpResponse};

use latch_common::ErrorCode;
use latch_lease::LeaseHolder;

pub mod v1;

/// Opaque id of the already-authenticated actor
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Display name of the actor
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
/// Contact address of the actor
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
/// Pre-resolved permission verdict for the targeted resource type
pub const ACTOR_CAN_WRITE_HEADER: &str = "x-actor-can-write";

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Actor identity from the trusted identity headers
pub fn actor_from_request(req: &HttpRequest) -> Option<LeaseHolder> {
    let id = header_value(req, ACTOR_ID_HEADER).filter(|id| !id.is_empty())?;
    Some(LeaseHolder {
        id,
        name: header_value(req, ACTOR_NAME_HEADER).unwrap_or_default(),
        email: header_value(req, ACTOR_EMAIL_HEADER).unwrap_or_default(),
    })
}

/// Whether the caller resolved the actor's write permission to true
pub fn caller_may_write(req: &HttpRequest) -> bool {
    header_value(req, ACTOR_CAN_WRITE_HEADER)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Identity and permission gate shared by every lock endpoint
pub(crate) fn authorize(req: &HttpRequest) -> Result<LeaseHolder, HttpResponse> {
    let Some(actor) = actor_from_request(req) else {
        return Err(HttpResponse::Unauthorized().json(ErrorCode::UNAUTHORIZED));
    };
    if !caller_may_write(req) {
        return Err(HttpResponse::Unauthorized().json(ErrorCode::UNAUTHORIZED));
    }
    Ok(actor)
}
