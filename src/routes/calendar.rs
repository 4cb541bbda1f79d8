// src/routes/calendar.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::config::settings::Settings;
use crate::middleware::tier::PremiumTier;
use crate::services::calendar::{self, CalendarSource, DEFAULT_WINDOW_DAYS};
use crate::utils::types::ApiResponse;

const MAX_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
    pub days: Option<u32>,
}

#[get("")]
pub async fn economic_calendar(
    params: web::Query<CalendarParams>,
    client: web::Data<reqwest::Client>,
    settings: web::Data<Settings>,
) -> impl Responder {
    let days = params
        .days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .clamp(1, MAX_WINDOW_DAYS);
    let today = Utc::now().date_naive();

    let feed = calendar::load_calendar(&client, &settings, today, days).await;

    // the fallback is still a 200: the dashboard stays usable, the client
    // just shows a transient warning
    match feed.source {
        CalendarSource::Live => HttpResponse::Ok().json(ApiResponse::ok(feed)),
        CalendarSource::Fallback => HttpResponse::Ok().json(ApiResponse::ok_with(
            "live calendar unavailable, serving local schedule",
            feed,
        )),
    }
}

pub fn calendar_scope() -> impl HttpServiceFactory {
    web::scope("/api/premium/calendar")
        .wrap(PremiumTier)
        .service(economic_calendar)
}
