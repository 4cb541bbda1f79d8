// src/routes/indicators.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{get, put, web, HttpResponse, Responder};

use crate::middleware::tier::PremiumTier;
use crate::models::IndicatorSettings;
use crate::services::indicators::IndicatorStore;
use crate::utils::types::ApiResponse;

#[get("")]
pub async fn get_indicators(store: web::Data<IndicatorStore>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok(store.current().await))
}

/// Apply the submitted settings through the editor and publish them.
/// Unknown indicator ids are ignored; a typed parameter rejection aborts
/// the whole batch so nothing half-applied is ever published.
#[put("")]
pub async fn save_indicators(
    body: web::Json<Vec<IndicatorSettings>>,
    store: web::Data<IndicatorStore>,
) -> impl Responder {
    match store.apply(body.into_inner()).await {
        Ok(saved) => HttpResponse::Ok().json(ApiResponse::ok_with(
            "indicator settings saved",
            saved,
        )),
        Err(e) => HttpResponse::BadRequest().json(ApiResponse::<()>::err(e.to_string())),
    }
}

pub fn indicators_scope() -> impl HttpServiceFactory {
    web::scope("/api/premium/indicators")
        .wrap(PremiumTier)
        .service(get_indicators)
        .service(save_indicators)
}
