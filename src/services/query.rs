//! Pure filter/sort helpers over the in-memory signal and pair lists.
//! Criteria structs derive `Deserialize` so the routes can bind them
//! straight from query strings.

use std::collections::HashSet;

use serde::Deserialize;

use crate::models::{SignalType, TimeFrame, TradingPair, TradingSignal};

pub const DEFAULT_MAX_SIGNALS: usize = 15;

fn default_signal_limit() -> usize {
    DEFAULT_MAX_SIGNALS
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalQuery {
    #[serde(default)]
    pub search: String,
    /// `None` means ALL.
    #[serde(default, rename = "type")]
    pub signal_type: Option<SignalType>,
    #[serde(default)]
    pub min_confidence: u8,
    /// `None` means ALL.
    #[serde(default)]
    pub timeframe: Option<TimeFrame>,
    #[serde(default = "default_signal_limit")]
    pub limit: usize,
}

impl Default for SignalQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            signal_type: None,
            min_confidence: 0,
            timeframe: None,
            limit: DEFAULT_MAX_SIGNALS,
        }
    }
}

/// Filter signals, preserving their original order, then truncate to
/// `query.limit`. An empty search string matches everything.
pub fn filter_signals(signals: &[TradingSignal], query: &SignalQuery) -> Vec<TradingSignal> {
    let needle = query.search.to_lowercase();

    signals
        .iter()
        .filter(|signal| {
            let matches_search =
                needle.is_empty() || signal.symbol.to_lowercase().contains(&needle);
            let matches_type = query
                .signal_type
                .map_or(true, |t| signal.signal_type == t);
            let matches_confidence = signal.confidence >= query.min_confidence;
            let matches_timeframe = query.timeframe.map_or(true, |tf| signal.timeframe == tf);

            matches_search && matches_type && matches_confidence && matches_timeframe
        })
        .take(query.limit)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PairTab {
    #[default]
    All,
    Favorites,
    Gainers,
    Losers,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Price,
    Change,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PairQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub tab: PairTab,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
    /// Comma-separated pair ids; when absent the caller's favourite
    /// registry is consulted instead.
    #[serde(default)]
    pub favorites: Option<String>,
}

impl PairQuery {
    pub fn favorite_ids(&self) -> Option<HashSet<String>> {
        self.favorites.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Filter by search text and tab, then stable-sort by the chosen field.
/// Ties keep their seed order; `desc` reverses the comparison only.
pub fn filter_pairs(
    pairs: &[TradingPair],
    query: &PairQuery,
    favorites: &HashSet<String>,
) -> Vec<TradingPair> {
    let needle = query.search.to_lowercase();

    let mut selected: Vec<TradingPair> = pairs
        .iter()
        .filter(|pair| {
            let matches_search = needle.is_empty()
                || pair.symbol.to_lowercase().contains(&needle)
                || pair.name.to_lowercase().contains(&needle);

            let matches_tab = match query.tab {
                PairTab::All => true,
                PairTab::Favorites => favorites.contains(&pair.id),
                PairTab::Gainers => pair.change > 0.0,
                PairTab::Losers => pair.change < 0.0,
            };

            matches_search && matches_tab
        })
        .cloned()
        .collect();

    selected.sort_by(|a, b| {
        let ordering = match query.sort {
            SortField::Name => a.symbol.cmp(&b.symbol),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Change => a.change_percent.total_cmp(&b.change_percent),
        };
        match query.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::market_data::{seed_pairs, seed_signals};

    #[test]
    fn buy_filter_returns_only_buy_signals() {
        let signals = seed_signals();
        let query = SignalQuery {
            signal_type: Some(SignalType::Buy),
            limit: DEFAULT_MAX_SIGNALS,
            ..Default::default()
        };
        let out = filter_signals(&signals, &query);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.signal_type == SignalType::Buy));
        // original order preserved
        assert_eq!(out[0].symbol, "XAU/USD");
        assert_eq!(out[1].symbol, "EUR/USD");
    }

    #[test]
    fn confidence_and_timeframe_filters_stack() {
        let signals = seed_signals();
        let query = SignalQuery {
            min_confidence: 70,
            timeframe: Some(TimeFrame::M15),
            limit: DEFAULT_MAX_SIGNALS,
            ..Default::default()
        };
        let out = filter_signals(&signals, &query);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "USD/JPY");
    }

    #[test]
    fn search_is_case_insensitive_and_empty_matches_all() {
        let signals = seed_signals();
        let all = filter_signals(&signals, &SignalQuery {
            limit: DEFAULT_MAX_SIGNALS,
            ..Default::default()
        });
        assert_eq!(all.len(), signals.len());

        let query = SignalQuery {
            search: "eur".into(),
            limit: DEFAULT_MAX_SIGNALS,
            ..Default::default()
        };
        let out = filter_signals(&signals, &query);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "EUR/USD");
    }

    #[test]
    fn limit_truncates_after_filtering() {
        let signals = seed_signals();
        let query = SignalQuery { limit: 1, ..Default::default() };
        let out = filter_signals(&signals, &query);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");
    }

    #[test]
    fn sequential_filters_equal_combined_filter() {
        let signals = seed_signals();
        let type_only = SignalQuery {
            signal_type: Some(SignalType::Buy),
            limit: usize::MAX,
            ..Default::default()
        };
        let conf_only = SignalQuery {
            min_confidence: 80,
            limit: usize::MAX,
            ..Default::default()
        };
        let combined = SignalQuery {
            signal_type: Some(SignalType::Buy),
            min_confidence: 80,
            limit: usize::MAX,
            ..Default::default()
        };

        let sequential = filter_signals(&filter_signals(&signals, &type_only), &conf_only);
        assert_eq!(sequential, filter_signals(&signals, &combined));
    }

    #[test]
    fn change_ascending_puts_losers_first() {
        let pairs = seed_pairs();
        let query = PairQuery {
            sort: SortField::Change,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let out = filter_pairs(&pairs, &query, &HashSet::new());
        assert_eq!(out.first().unwrap().symbol, "XAG/USD"); // -1.20%
        assert_eq!(out.last().unwrap().symbol, "XAU/USD"); // +0.62%

        // GBP/USD (-0.35%) sorts before EUR/USD (+0.21%)
        let gbp = out.iter().position(|p| p.symbol == "GBP/USD").unwrap();
        let eur = out.iter().position(|p| p.symbol == "EUR/USD").unwrap();
        assert!(gbp < eur);
    }

    #[test]
    fn desc_reverses_the_comparison() {
        let pairs = seed_pairs();
        let asc = PairQuery {
            sort: SortField::Price,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let desc = PairQuery {
            sort: SortField::Price,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let up = filter_pairs(&pairs, &asc, &HashSet::new());
        let down = filter_pairs(&pairs, &desc, &HashSet::new());
        let mut reversed = up.clone();
        reversed.reverse();
        assert_eq!(down, reversed);
    }

    #[test]
    fn search_matches_symbol_or_name() {
        let pairs = seed_pairs();
        let query = PairQuery { search: "gold".into(), ..Default::default() };
        let out = filter_pairs(&pairs, &query, &HashSet::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "XAU/USD");

        let query = PairQuery { search: "usd/".into(), ..Default::default() };
        let out = filter_pairs(&pairs, &query, &HashSet::new());
        assert_eq!(out.len(), 2); // USD/JPY, USD/CHF
    }

    #[test]
    fn tabs_partition_by_sign_and_membership() {
        let pairs = seed_pairs();
        let favorites: HashSet<String> = ["eurusd".to_string()].into_iter().collect();

        let gainers = filter_pairs(
            &pairs,
            &PairQuery { tab: PairTab::Gainers, ..Default::default() },
            &favorites,
        );
        assert!(gainers.iter().all(|p| p.change > 0.0));

        let losers = filter_pairs(
            &pairs,
            &PairQuery { tab: PairTab::Losers, ..Default::default() },
            &favorites,
        );
        assert!(losers.iter().all(|p| p.change < 0.0));
        assert_eq!(gainers.len() + losers.len(), pairs.len());

        let favs = filter_pairs(
            &pairs,
            &PairQuery { tab: PairTab::Favorites, ..Default::default() },
            &favorites,
        );
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].id, "eurusd");
    }

    #[test]
    fn no_match_yields_empty_not_error() {
        let pairs = seed_pairs();
        let query = PairQuery { search: "btc".into(), ..Default::default() };
        assert!(filter_pairs(&pairs, &query, &HashSet::new()).is_empty());
    }

    #[test]
    fn favorite_ids_parses_comma_list() {
        let query = PairQuery {
            favorites: Some("eurusd, gbpusd,,".into()),
            ..Default::default()
        };
        let ids = query.favorite_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("eurusd") && ids.contains("gbpusd"));

        assert!(PairQuery::default().favorite_ids().is_none());
    }
}
