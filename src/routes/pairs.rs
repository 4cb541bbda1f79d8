// src/routes/pairs.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::TimeFrame;
use crate::services::market_data::{Favorites, MarketBook};
use crate::services::query::{filter_pairs, PairQuery};
use crate::services::series::{self, SeriesRequest, Trend};
use crate::utils::types::ApiResponse;

/// Fallback sparkline volatility, as a fraction of the pair's price.
const DEFAULT_VOLATILITY_RATIO: f64 = 0.0005;
const DEFAULT_SERIES_POINTS: usize = 60;

#[get("")]
pub async fn list_pairs(
    query: web::Query<PairQuery>,
    book: web::Data<MarketBook>,
    favorites: web::Data<Favorites>,
) -> impl Responder {
    let pairs = book.pairs().await;
    // an explicit `favorites=` list wins over the server-side registry
    let favorite_ids = query
        .favorite_ids()
        .unwrap_or_else(|| favorites.ids().into_iter().collect());

    let matched = filter_pairs(&pairs, &query, &favorite_ids);
    HttpResponse::Ok().json(ApiResponse::ok_with(
        format!("showing {} of {} pairs", matched.len(), pairs.len()),
        matched,
    ))
}

#[post("/{id}/favorite")]
pub async fn toggle_favorite(
    path: web::Path<String>,
    book: web::Data<MarketBook>,
    favorites: web::Data<Favorites>,
) -> impl Responder {
    let id = path.into_inner();
    if book.pair(&id).await.is_none() {
        return HttpResponse::NotFound()
            .json(ApiResponse::<()>::err(format!("unknown pair `{id}`")));
    }

    let is_favorite = favorites.toggle(&id);
    HttpResponse::Ok().json(ApiResponse::ok_with(
        if is_favorite { "added to favourites" } else { "removed from favourites" },
        is_favorite,
    ))
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    pub volatility: Option<f64>,
    pub count: Option<usize>,
    #[serde(default)]
    pub trend: Trend,
    pub timeframe: Option<TimeFrame>,
}

#[get("/{id}/series")]
pub async fn pair_series(
    path: web::Path<String>,
    params: web::Query<SeriesParams>,
    book: web::Data<MarketBook>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(pair) = book.pair(&id).await else {
        return HttpResponse::NotFound()
            .json(ApiResponse::<()>::err(format!("unknown pair `{id}`")));
    };

    let mut req = SeriesRequest::new(
        pair.price,
        params
            .volatility
            .unwrap_or(pair.price * DEFAULT_VOLATILITY_RATIO),
        params.count.unwrap_or(DEFAULT_SERIES_POINTS),
        params.trend,
    );
    if let Some(timeframe) = params.timeframe {
        req = req.with_timeframe(timeframe);
    }

    match series::generate(&req, &mut rand::thread_rng()) {
        Ok(points) => HttpResponse::Ok().json(ApiResponse::ok(points)),
        Err(e) => HttpResponse::BadRequest().json(ApiResponse::<()>::err(e.to_string())),
    }
}

pub fn pairs_scope() -> impl HttpServiceFactory {
    web::scope("/api/pairs")
        .service(list_pairs)
        .service(toggle_favorite)
        .service(pair_series)
}
