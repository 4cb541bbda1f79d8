//! Centralised in-memory market state for the dashboard.
//! -----------------------------------------------------------------
//! ‣ Owns the seeded pair list and the static signal list in *one*
//!   place; routes only ever see snapshots.
//! ‣ The live ticker nudges every pair on a fixed interval to simulate
//!   market movement; the per-tick transition is pure and RNG-injected.
//! ‣ Ticker tasks are registered in a static abort map so they can be
//!   released when the owning server shuts a book down.
//! -----------------------------------------------------------------

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{abortable, AbortHandle};
use rand::Rng;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{IndicatorReading, SignalType, TimeFrame, TradingPair, TradingSignal};

/// Widest per-tick move, in percent. Drift is uniform in ±this.
pub const MAX_TICK_DRIFT_PCT: f64 = 0.05;

type TickerMap = DashMap<Uuid, AbortHandle>;
static TICKERS: once_cell::sync::Lazy<TickerMap> = once_cell::sync::Lazy::new(TickerMap::default);

/// Cloneable handle over the process-lifetime market state.
#[derive(Clone)]
pub struct MarketBook {
    pairs: Arc<RwLock<Vec<TradingPair>>>,
    signals: Arc<Vec<TradingSignal>>,
}

impl MarketBook {
    pub fn seeded() -> Self {
        Self {
            pairs: Arc::new(RwLock::new(seed_pairs())),
            signals: Arc::new(seed_signals()),
        }
    }

    pub async fn pairs(&self) -> Vec<TradingPair> {
        self.pairs.read().await.clone()
    }

    pub async fn pair(&self, id: &str) -> Option<TradingPair> {
        self.pairs.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub fn signals(&self) -> &[TradingSignal] {
        &self.signals
    }

    pub async fn tick<R: Rng>(&self, rng: &mut R) {
        let mut pairs = self.pairs.write().await;
        apply_tick(&mut pairs, rng);
    }
}

/// One ticker transition: every pair drifts by a uniform ±0.05 percent.
/// Nothing is clamped; sign and magnitude follow the walk wherever it goes.
pub fn apply_tick<R: Rng>(pairs: &mut [TradingPair], rng: &mut R) {
    for pair in pairs {
        let drift_pct = (rng.gen::<f64>() - 0.5) * (2.0 * MAX_TICK_DRIFT_PCT);
        let change = pair.price * (drift_pct / 100.0);

        pair.price += change;
        pair.change += change;
        pair.change_percent += drift_pct;
    }
}

/// Start the periodic ticker for `book`. Returns a handle id usable with
/// [`stop_ticker`]; the task holds the only timer and serialises its ticks.
pub fn spawn_ticker(book: MarketBook, period: Duration) -> Uuid {
    let (task, abort) = abortable(async move {
        let mut iv = tokio::time::interval(period);
        iv.tick().await; // first tick fires immediately; skip it
        loop {
            iv.tick().await;
            {
                let mut pairs = book.pairs.write().await;
                let mut rng = rand::thread_rng();
                apply_tick(&mut pairs, &mut rng);
            }
        }
    });

    tokio::spawn(task);

    let id = Uuid::new_v4();
    TICKERS.insert(id, abort);
    id
}

/// Abort a running ticker and release its timer. Unknown ids are a no-op.
pub fn stop_ticker(id: Uuid) -> bool {
    if let Some((_, abort)) = TICKERS.remove(&id) {
        abort.abort();
        true
    } else {
        false
    }
}

/// In-memory favourite-pair registry shared across requests.
#[derive(Clone, Default)]
pub struct Favorites {
    ids: Arc<DashMap<String, ()>>,
}

impl Favorites {
    /// Flip membership; returns whether the pair is a favourite afterwards.
    pub fn toggle(&self, pair_id: &str) -> bool {
        if self.ids.remove(pair_id).is_some() {
            false
        } else {
            self.ids.insert(pair_id.to_string(), ());
            true
        }
    }

    pub fn contains(&self, pair_id: &str) -> bool {
        self.ids.contains_key(pair_id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().map(|e| e.key().clone()).collect()
    }
}

// ================================================================
// Seed data — the fixed mock universe the dashboard starts from
// ================================================================

pub fn seed_pairs() -> Vec<TradingPair> {
    vec![
        TradingPair {
            id: "xauusd".into(),
            symbol: "XAU/USD".into(),
            name: "Gold".into(),
            price: 2024.75,
            change: 12.50,
            change_percent: 0.62,
            high_24h: 2030.15,
            low_24h: 2010.30,
            volume_24h: 156_487.0,
        },
        TradingPair {
            id: "xagusd".into(),
            symbol: "XAG/USD".into(),
            name: "Silver".into(),
            price: 23.15,
            change: -0.28,
            change_percent: -1.20,
            high_24h: 23.55,
            low_24h: 22.96,
            volume_24h: 89_542.0,
        },
        TradingPair {
            id: "eurusd".into(),
            symbol: "EUR/USD".into(),
            name: "Euro / US Dollar".into(),
            price: 1.0785,
            change: 0.0023,
            change_percent: 0.21,
            high_24h: 1.0802,
            low_24h: 1.0755,
            volume_24h: 245_689.0,
        },
        TradingPair {
            id: "gbpusd".into(),
            symbol: "GBP/USD".into(),
            name: "British Pound / US Dollar".into(),
            price: 1.2650,
            change: -0.0045,
            change_percent: -0.35,
            high_24h: 1.2705,
            low_24h: 1.2635,
            volume_24h: 187_456.0,
        },
        TradingPair {
            id: "usdjpy".into(),
            symbol: "USD/JPY".into(),
            name: "US Dollar / Japanese Yen".into(),
            price: 155.75,
            change: 0.45,
            change_percent: 0.29,
            high_24h: 156.10,
            low_24h: 154.95,
            volume_24h: 201_542.0,
        },
        TradingPair {
            id: "usdchf".into(),
            symbol: "USD/CHF".into(),
            name: "US Dollar / Swiss Franc".into(),
            price: 0.9050,
            change: 0.0025,
            change_percent: 0.28,
            high_24h: 0.9075,
            low_24h: 0.9015,
            volume_24h: 134_567.0,
        },
    ]
}

pub fn seed_signals() -> Vec<TradingSignal> {
    let now = chrono::Utc::now().timestamp_millis();
    let reading = |name: &str, value: &str, signal: SignalType| IndicatorReading {
        name: name.into(),
        value: value.into(),
        signal,
    };

    vec![
        TradingSignal {
            id: "1".into(),
            pair_id: "xauusd".into(),
            symbol: "XAU/USD".into(),
            signal_type: SignalType::Buy,
            confidence: 87,
            entry_price: 2024.75,
            stop_loss: 2020.00,
            take_profit: 2035.50,
            timeframe: TimeFrame::H1,
            timestamp: now - 15 * 60_000,
            indicators: vec![
                reading("RSI", "28", SignalType::Buy),
                reading("MACD", "Crossing Up", SignalType::Buy),
                reading("MA Cross", "50/200 SMA Bullish", SignalType::Buy),
                reading("Bollinger Bands", "Lower Band Touch", SignalType::Buy),
            ],
        },
        TradingSignal {
            id: "2".into(),
            pair_id: "usdjpy".into(),
            symbol: "USD/JPY".into(),
            signal_type: SignalType::Sell,
            confidence: 75,
            entry_price: 155.75,
            stop_loss: 156.25,
            take_profit: 154.50,
            timeframe: TimeFrame::M15,
            timestamp: now - 8 * 60_000,
            indicators: vec![
                reading("RSI", "74", SignalType::Sell),
                reading("MACD", "Crossing Down", SignalType::Sell),
                reading("MA Cross", "Negative", SignalType::Neutral),
                reading("Bollinger Bands", "Upper Band Touch", SignalType::Sell),
            ],
        },
        TradingSignal {
            id: "3".into(),
            pair_id: "eurusd".into(),
            symbol: "EUR/USD".into(),
            signal_type: SignalType::Buy,
            confidence: 68,
            entry_price: 1.0785,
            stop_loss: 1.0770,
            take_profit: 1.0820,
            timeframe: TimeFrame::M5,
            timestamp: now - 4 * 60_000,
            indicators: vec![
                reading("RSI", "32", SignalType::Buy),
                reading("MACD", "Bullish Divergence", SignalType::Buy),
                reading("MA Cross", "Positive", SignalType::Buy),
                reading("Bollinger Bands", "Middle", SignalType::Neutral),
            ],
        },
    ]
}

// ──────────────────────────────────────────────────────────────
// UNIT-TESTS  ▸  tick transition & favourites
// ──────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tick_moves_every_pair_within_bounds() {
        let mut pairs = seed_pairs();
        let before = pairs.clone();
        let mut rng = StdRng::seed_from_u64(11);

        apply_tick(&mut pairs, &mut rng);

        assert_eq!(pairs.len(), before.len());
        for (new, old) in pairs.iter().zip(before.iter()) {
            let drift = new.change_percent - old.change_percent;
            assert!(drift.abs() <= MAX_TICK_DRIFT_PCT);

            // price and absolute change move together by the same delta
            let price_delta = new.price - old.price;
            let change_delta = new.change - old.change;
            assert!((price_delta - change_delta).abs() < 1e-12);
            assert!((price_delta - old.price * (drift / 100.0)).abs() < 1e-12);

            // 24h range fields are untouched by the ticker
            assert_eq!(new.high_24h, old.high_24h);
            assert_eq!(new.low_24h, old.low_24h);
        }
    }

    #[test]
    fn repeated_ticks_keep_seed_prices_positive() {
        let mut pairs = seed_pairs();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10_000 {
            apply_tick(&mut pairs, &mut rng);
        }
        assert!(pairs.iter().all(|p| p.price > 0.0));
    }

    #[test]
    fn favourites_toggle_roundtrip() {
        let favs = Favorites::default();
        assert!(favs.toggle("eurusd"));
        assert!(favs.contains("eurusd"));
        assert!(!favs.toggle("eurusd"));
        assert!(!favs.contains("eurusd"));
        assert!(favs.ids().is_empty());
    }

    #[tokio::test]
    async fn book_snapshot_reflects_tick() {
        let book = MarketBook::seeded();
        let before = book.pairs().await;
        let mut rng = StdRng::seed_from_u64(2);
        book.tick(&mut rng).await;
        let after = book.pairs().await;
        assert_eq!(before.len(), after.len());
        assert!(before
            .iter()
            .zip(after.iter())
            .any(|(b, a)| (b.price - a.price).abs() > 0.0));
    }

    #[tokio::test]
    async fn ticker_registry_aborts_on_stop() {
        let book = MarketBook::seeded();
        let id = spawn_ticker(book, Duration::from_secs(3600));
        assert!(stop_ticker(id));
        assert!(!stop_ticker(id));
    }
}
