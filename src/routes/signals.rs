// src/routes/signals.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};

use crate::services::market_data::MarketBook;
use crate::services::query::{filter_signals, SignalQuery};
use crate::utils::types::ApiResponse;

#[get("")]
pub async fn list_signals(
    query: web::Query<SignalQuery>,
    book: web::Data<MarketBook>,
) -> impl Responder {
    let signals = book.signals();
    let matched = filter_signals(signals, &query);

    HttpResponse::Ok().json(ApiResponse::ok_with(
        format!("showing {} of {} signals", matched.len(), signals.len()),
        matched,
    ))
}

pub fn signals_scope() -> impl HttpServiceFactory {
    web::scope("/api/signals").service(list_signals)
}
