//! Engine defaults for alerting and forecasting.

use serde::{Deserialize, Serialize};

use filastock_core::Quantity;

pub const LOW_STOCK_THRESHOLD_ENV: &str = "FILASTOCK_LOW_STOCK_THRESHOLD";
pub const FORECAST_WINDOW_DAYS_ENV: &str = "FILASTOCK_FORECAST_WINDOW_DAYS";

/// Caller-side defaults. The engine functions themselves take thresholds and
/// rates as parameters; this only supplies studio-wide values for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Open-unit quantity under which an item without sealed reserve is low.
    pub low_stock_threshold: Quantity,
    /// Trailing window used to derive the daily consumption rate.
    pub forecast_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: Quantity::whole(100),
            forecast_window_days: 30,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOW_STOCK_THRESHOLD_ENV) {
            match raw.parse::<Quantity>() {
                Ok(threshold) => config.low_stock_threshold = threshold,
                Err(err) => tracing::warn!(
                    value = %raw,
                    error = %err,
                    "ignoring invalid {}", LOW_STOCK_THRESHOLD_ENV
                ),
            }
        }

        if let Some(raw) = lookup(FORECAST_WINDOW_DAYS_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(days) if days > 0 => config.forecast_window_days = days,
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {}; expected a positive number of days", FORECAST_WINDOW_DAYS_ENV
                ),
            }
        }

        config
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
