// src/routes/chart.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::middleware::tier::PremiumTier;
use crate::models::TimeFrame;
use crate::services::chart::{WidgetConfig, VENDOR_SCRIPT_URL};
use crate::utils::types::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct ChartParams {
    pub symbol: String,
    pub timeframe: Option<TimeFrame>,
}

/// Hand the client everything it needs to embed the vendor widget: the
/// script URL plus a ready-made constructor config.
#[get("")]
pub async fn chart_config(params: web::Query<ChartParams>) -> impl Responder {
    let timeframe = params.timeframe.unwrap_or(TimeFrame::H1);
    let config = WidgetConfig::new(&params.symbol, timeframe);

    HttpResponse::Ok().json(ApiResponse::ok(json!({
        "script_url": VENDOR_SCRIPT_URL,
        "widget": config,
    })))
}

pub fn chart_scope() -> impl HttpServiceFactory {
    web::scope("/api/premium/chart-config")
        .wrap(PremiumTier)
        .service(chart_config)
}
