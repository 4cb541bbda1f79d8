
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::time::Duration;

use tradesage_backend::{
    config::settings::Settings,
    routes::{
        calendar::calendar_scope,
        chart::chart_scope,
        health::health_scope,
        indicators::indicators_scope,
        pairs::pairs_scope,
        signals::signals_scope,
    },
    services::indicators::IndicatorStore,
    services::market_data::{spawn_ticker, Favorites, MarketBook},
};

fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();
    log::info!("Starting TradeSage backend…");

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        std::process::exit(1);
    });

    let port = settings.server_port;
    let settings_clone = settings.clone();

    let book = MarketBook::seeded();
    let favorites = Favorites::default();
    let indicators = IndicatorStore::with_defaults();
    let http_client = reqwest::Client::new();

    // --- live price ticker --------------------------------------------------
    let ticker_id = spawn_ticker(
        book.clone(),
        Duration::from_secs(settings.tick_interval_secs),
    );
    log::info!(
        "price ticker {ticker_id} running every {}s",
        settings.tick_interval_secs
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(settings_clone.clone()))
            .app_data(web::Data::new(book.clone()))
            .app_data(web::Data::new(favorites.clone()))
            .app_data(web::Data::new(indicators.clone()))
            .app_data(web::Data::new(http_client.clone()))

            //scope
            .service(health_scope())
            .service(pairs_scope())
            .service(signals_scope())
            .service(indicators_scope())
            .service(calendar_scope())
            .service(chart_scope())
    })
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
