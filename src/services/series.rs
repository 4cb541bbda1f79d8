//! Mock price-series generator.
//! -----------------------------------------------------------------
//! ‣ Bounded random walk from a base price, with an optional trend bias.
//! ‣ Timestamps run evenly backward from "now", oldest first, so the
//!   newest point is exactly one step behind the current instant.
//! ‣ The RNG is injected so tests can seed it; production call sites
//!   pass `rand::thread_rng()`.
//! -----------------------------------------------------------------

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PricePoint, TimeFrame};

/// Walks never go below this, so generated prices stay positive.
pub const PRICE_FLOOR: f64 = 0.001;

/// Per-step drift applied for a trending walk, as a fraction of price.
pub const TREND_BIAS: f64 = 0.0002;

pub const DEFAULT_STEP_MS: i64 = 60_000; // 1 minute

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Sideways,
}

impl Trend {
    fn bias(self) -> f64 {
        match self {
            Trend::Up => TREND_BIAS,
            Trend::Down => -TREND_BIAS,
            Trend::Sideways => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesRequest {
    pub base_price: f64,
    pub volatility: f64,
    pub count: usize,
    pub trend: Trend,
    pub step_ms: i64,
}

impl SeriesRequest {
    pub fn new(base_price: f64, volatility: f64, count: usize, trend: Trend) -> Self {
        Self { base_price, volatility, count, trend, step_ms: DEFAULT_STEP_MS }
    }

    pub fn with_timeframe(mut self, timeframe: TimeFrame) -> Self {
        self.step_ms = timeframe.step_ms();
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("base price must be positive, got {0}")]
    NonPositiveBasePrice(f64),
    #[error("volatility must not be negative, got {0}")]
    NegativeVolatility(f64),
    #[error("series must contain at least one point")]
    EmptySeries,
}

/// Generate `req.count` points of a random walk around `req.base_price`.
///
/// Each step adds `uniform(-0.5, 0.5) * volatility + price * bias` and
/// clamps at [`PRICE_FLOOR`]. Points come back oldest first with strictly
/// increasing timestamps.
pub fn generate<R: Rng>(req: &SeriesRequest, rng: &mut R) -> Result<Vec<PricePoint>, SeriesError> {
    if !(req.base_price > 0.0) {
        return Err(SeriesError::NonPositiveBasePrice(req.base_price));
    }
    if req.volatility < 0.0 || req.volatility.is_nan() {
        return Err(SeriesError::NegativeVolatility(req.volatility));
    }
    if req.count == 0 {
        return Err(SeriesError::EmptySeries);
    }

    let now = Utc::now().timestamp_millis();
    let bias = req.trend.bias();
    let mut price = req.base_price;
    let mut data = Vec::with_capacity(req.count);

    for i in 0..req.count {
        let delta = (rng.gen::<f64>() - 0.5) * req.volatility + price * bias;
        price = (price + delta).max(PRICE_FLOOR);

        data.push(PricePoint {
            timestamp: now - ((req.count - i) as i64) * req.step_ms,
            price,
        });
    }

    Ok(data)
}
