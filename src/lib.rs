pub mod config;
pub mod middleware;
pub mod models;
pub mod routes {
    pub mod calendar;
    pub mod chart;
    pub mod health;
    pub mod indicators;
    pub mod pairs;
    pub mod signals;
}
pub mod services {
    pub mod calendar;
    pub mod chart;
    pub mod indicators;
    pub mod market_data;
    pub mod query;
    pub mod series;
}

pub mod utils;
