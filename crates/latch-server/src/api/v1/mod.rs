//! V1 API handlers

pub mod lock;
pub mod ops;

use actix_web::{Scope, web};

pub fn routes() -> Scope {
    web::scope("/v1")
        .service(lock::routes())
        .service(ops::routes())
}
