use actix_web::{get, web, HttpResponse, Scope};
use serde_json::json;

use crate::utils::types::ApiResponse;

#[get("")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(json!({
        "service": "tradesage-backend",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

// The scope carries the prefix; an empty-prefix scope would match every
// request and shadow the routes registered after it.
pub fn health_scope() -> Scope {
    web::scope("/health")
        .service(health_check)
}
