//! Material stock engine: consumption, replenishment and alerting for
//! filament spools and resin bottles.
//!
//! Every operation is a pure function over a [`StockItem`]: it returns the next
//! state plus exactly one [`LedgerEntry`], or an error with the input left
//! untouched. Loading and saving items is the caller's concern.

pub mod alerts;
pub mod config;
pub mod costing;
pub mod depletion;
pub mod item;
pub mod ledger;
pub mod report;

pub use alerts::{
    StockTotals, active_totals, forecast_days_until_depletion, is_low_stock, low_stock_items,
    percent_remaining_in_open_unit,
};
pub use config::EngineConfig;
pub use costing::{ReplenishStock, replenish, weighted_average_price};
pub use depletion::{ConsumeStock, Drawdown, consume, draw_down};
pub use item::{CreateStockItem, MaterialKind, StockItem, StockItemId, StockItemRecord};
pub use ledger::{
    ConsumeOutcome, LedgerEntry, LedgerEntryId, LedgerEntryKind, LedgerEntryRecord,
};
pub use report::{ConsumptionSummary, average_daily_consumption, consumption_summary};
