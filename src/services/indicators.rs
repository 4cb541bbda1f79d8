//! Draft/saved editor over the indicator configuration list.
//!
//! The editor never touches the caller's copy before `save()`; `reset()`
//! rolls the draft back to the last published (or originally seeded)
//! state. Parameter edits are typed: a value must match the parameter's
//! declared runtime type or the edit is rejected outright instead of
//! silently storing garbage.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{IndicatorSettings, ParamValue};

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("indicator `{indicator}` has no parameter `{key}`")]
    UnknownKey { indicator: String, key: String },
    #[error("parameter `{key}` expects a {expected} value, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },
    #[error("parameter `{key}` must be a finite number")]
    NotFinite { key: String },
}

pub struct IndicatorEditor {
    original: Vec<IndicatorSettings>,
    draft: Vec<IndicatorSettings>,
}

impl IndicatorEditor {
    pub fn new(seed: Vec<IndicatorSettings>) -> Self {
        Self { draft: seed.clone(), original: seed }
    }

    pub fn draft(&self) -> &[IndicatorSettings] {
        &self.draft
    }

    /// Enable or disable an indicator. Unknown ids are a no-op; disabling
    /// keeps the parameters and weight intact.
    pub fn toggle(&mut self, id: &str, enabled: bool) {
        if let Some(indicator) = self.draft.iter_mut().find(|i| i.id == id) {
            indicator.enabled = enabled;
        }
    }

    /// Set an indicator's signal weight, clamped into 0.0..=1.0.
    /// Unknown ids are a no-op.
    pub fn set_weight(&mut self, id: &str, weight: f64) {
        if let Some(indicator) = self.draft.iter_mut().find(|i| i.id == id) {
            indicator.weight = weight.clamp(0.0, 1.0);
        }
    }

    /// Replace one parameter value. The new value must match the declared
    /// runtime type of the existing parameter; numbers must be finite.
    /// Unknown indicator ids are a no-op (`Ok`), unknown keys and type
    /// mismatches are rejected and leave the draft untouched.
    pub fn set_parameter(
        &mut self,
        id: &str,
        key: &str,
        value: ParamValue,
    ) -> Result<(), ParamError> {
        let Some(indicator) = self.draft.iter_mut().find(|i| i.id == id) else {
            return Ok(());
        };

        let Some(current) = indicator.parameters.get_mut(key) else {
            return Err(ParamError::UnknownKey {
                indicator: indicator.id.clone(),
                key: key.to_string(),
            });
        };

        if current.type_name() != value.type_name() {
            return Err(ParamError::TypeMismatch {
                key: key.to_string(),
                expected: current.type_name(),
                got: value.type_name(),
            });
        }
        if let ParamValue::Number(n) = &value {
            if !n.is_finite() {
                return Err(ParamError::NotFinite { key: key.to_string() });
            }
        }

        *current = value;
        Ok(())
    }

    /// Publish the draft as the new baseline and hand it back.
    pub fn save(&mut self) -> Vec<IndicatorSettings> {
        self.original = self.draft.clone();
        self.original.clone()
    }

    /// Discard pending edits, restoring the last-saved state.
    pub fn reset(&mut self) {
        self.draft = self.original.clone();
    }
}

/// Shared saved-settings store backing the indicators endpoint. Each
/// update runs through a fresh [`IndicatorEditor`] so route submissions
/// obey the same typed-edit rules as any other caller.
#[derive(Clone)]
pub struct IndicatorStore {
    saved: Arc<RwLock<Vec<IndicatorSettings>>>,
}

impl IndicatorStore {
    pub fn with_defaults() -> Self {
        Self {
            saved: Arc::new(RwLock::new(default_indicator_settings())),
        }
    }

    pub async fn current(&self) -> Vec<IndicatorSettings> {
        self.saved.read().await.clone()
    }

    /// Apply a submitted settings list on top of the saved baseline and
    /// publish the result. Unknown ids are ignored; the first rejected
    /// parameter aborts the batch, leaving the saved state untouched.
    pub async fn apply(
        &self,
        incoming: Vec<IndicatorSettings>,
    ) -> Result<Vec<IndicatorSettings>, ParamError> {
        let mut saved = self.saved.write().await;
        let mut editor = IndicatorEditor::new(saved.clone());

        for indicator in incoming {
            editor.toggle(&indicator.id, indicator.enabled);
            editor.set_weight(&indicator.id, indicator.weight);
            for (key, value) in indicator.parameters {
                editor.set_parameter(&indicator.id, &key, value)?;
            }
        }

        *saved = editor.save();
        Ok(saved.clone())
    }
}

/// The six stock indicators the dashboard ships with.
pub fn default_indicator_settings() -> Vec<IndicatorSettings> {
    let number = ParamValue::Number;
    let text = |s: &str| ParamValue::Text(s.to_string());

    let params = |entries: Vec<(&str, ParamValue)>| -> BTreeMap<String, ParamValue> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    };

    vec![
        IndicatorSettings {
            id: "rsi".into(),
            name: "Relative Strength Index (RSI)".into(),
            enabled: true,
            parameters: params(vec![
                ("period", number(14.0)),
                ("overbought", number(70.0)),
                ("oversold", number(30.0)),
            ]),
            weight: 1.0,
        },
        IndicatorSettings {
            id: "macd".into(),
            name: "Moving Average Convergence Divergence (MACD)".into(),
            enabled: true,
            parameters: params(vec![
                ("fast_period", number(12.0)),
                ("slow_period", number(26.0)),
                ("signal_period", number(9.0)),
            ]),
            weight: 1.0,
        },
        IndicatorSettings {
            id: "ma".into(),
            name: "Moving Average Crossover".into(),
            enabled: true,
            parameters: params(vec![
                ("fast_period", number(50.0)),
                ("slow_period", number(200.0)),
                ("ma_type", text("SMA")),
            ]),
            weight: 1.0,
        },
        IndicatorSettings {
            id: "bb".into(),
            name: "Bollinger Bands".into(),
            enabled: true,
            parameters: params(vec![
                ("period", number(20.0)),
                ("standard_deviations", number(2.0)),
            ]),
            weight: 1.0,
        },
        IndicatorSettings {
            id: "fib".into(),
            name: "Fibonacci Retracement".into(),
            enabled: false,
            parameters: params(vec![
                ("use_auto_high_low", ParamValue::Flag(true)),
                ("levels", text("0.236, 0.382, 0.5, 0.618, 0.786")),
            ]),
            weight: 0.8,
        },
        IndicatorSettings {
            id: "stoch".into(),
            name: "Stochastic Oscillator".into(),
            enabled: false,
            parameters: params(vec![
                ("k_period", number(14.0)),
                ("d_period", number(3.0)),
                ("slowing", number(3.0)),
            ]),
            weight: 0.7,
        },
    ]
}
