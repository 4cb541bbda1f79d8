use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One tradable forex/commodity pair. Seeded once at startup and mutated in
/// place by the live ticker; `low_24h <= price <= high_24h` is assumed from
/// the seed data, the ticker does not re-clamp it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingPair {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
}

/// A single sample of a generated price series. Timestamp is epoch millis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub timestamp: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    Neutral,
}

/// One indicator reading embedded in a signal ("RSI • 28", etc).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorReading {
    pub name: String,
    pub value: String,
    pub signal: SignalType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingSignal {
    pub id: String,
    pub pair_id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Canonical 0-100 integer scale; see [`normalize_confidence`].
    pub confidence: u8,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timeframe: TimeFrame,
    /// Epoch millis of signal creation.
    pub timestamp: i64,
    pub indicators: Vec<IndicatorReading>,
}

/// Normalize a raw confidence reading onto the canonical 0-100 scale.
/// Upstream datasets disagree (some carry 0-1 fractions, some 0-100
/// percentages); anything in (0, 1] is treated as a fraction, everything
/// else is clamped and rounded.
pub fn normalize_confidence(raw: f64) -> u8 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    let pct = if raw <= 1.0 { raw * 100.0 } else { raw };
    pct.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl TimeFrame {
    /// Interval code understood by the chart vendor's embed widget.
    pub fn interval_code(self) -> &'static str {
        match self {
            TimeFrame::M1 => "1",
            TimeFrame::M5 => "5",
            TimeFrame::M15 => "15",
            TimeFrame::H1 => "60",
            TimeFrame::H4 => "240",
            TimeFrame::D1 => "D",
        }
    }

    /// Sampling step for generated price series, in milliseconds.
    pub fn step_ms(self) -> i64 {
        match self {
            TimeFrame::M1 => 60_000,
            TimeFrame::M5 => 5 * 60_000,
            TimeFrame::M15 => 15 * 60_000,
            TimeFrame::H1 => 3_600_000,
            TimeFrame::H4 => 4 * 3_600_000,
            TimeFrame::D1 => 86_400_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFrame::M1 => "1m",
            TimeFrame::M5 => "5m",
            TimeFrame::M15 => "15m",
            TimeFrame::H1 => "1h",
            TimeFrame::H4 => "4h",
            TimeFrame::D1 => "1d",
        }
    }
}

/// Typed indicator parameter value. Editing a parameter must keep its
/// declared runtime type; see `services::indicators`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "string",
            ParamValue::Flag(_) => "boolean",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSettings {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub parameters: BTreeMap<String, ParamValue>,
    /// Influence on the blended signal, 0.0..=1.0.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Map the free-form impact string the calendar provider sends.
    pub fn from_provider(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("high") {
            Impact::High
        } else if lower.contains("medium") || lower.contains("moderate") {
            Impact::Medium
        } else {
            Impact::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomicEvent {
    pub id: String,
    pub title: String,
    pub country: String,
    pub date: NaiveDate,
    pub time: String,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}
