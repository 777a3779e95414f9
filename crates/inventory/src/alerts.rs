//! Low-stock alerts, open-unit gauges and depletion forecasts.
//!
//! Everything here is a read over `&StockItem`; nothing returns a new state.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use filastock_core::{DomainError, DomainResult, QUANTITY_SCALE, Quantity};

use crate::config::EngineConfig;
use crate::item::{MaterialKind, StockItem};
use crate::report::average_daily_consumption;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// How full the open unit is, in percent, clamped to `[0, 100]`.
pub fn percent_remaining_in_open_unit(item: &StockItem) -> Decimal {
    let ratio = item
        .open_remaining()
        .value()
        .checked_div(item.unit_size().value())
        .unwrap_or(Decimal::ZERO);
    let percent = ratio.checked_mul(HUNDRED).unwrap_or(HUNDRED);
    percent
        .clamp(Decimal::ZERO, HUNDRED)
        .round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether the item needs a purchase: the open unit is under `threshold` and no
/// sealed reserve is left. Archived items are never low.
pub fn is_low_stock(item: &StockItem, threshold: Quantity) -> bool {
    !item.is_archived() && item.open_remaining() < threshold && item.sealed_units() == 0
}

/// Days until the item runs out at `daily_rate` per day.
///
/// A zero or negative rate never depletes the stock and yields infinity.
pub fn forecast_days_until_depletion(item: &StockItem, daily_rate: Decimal) -> DomainResult<f64> {
    if daily_rate <= Decimal::ZERO {
        return Ok(f64::INFINITY);
    }
    let days = item
        .total_available()?
        .value()
        .checked_div(daily_rate)
        .and_then(|days| days.to_f64())
        .unwrap_or(f64::INFINITY);
    Ok(days)
}

impl StockItem {
    pub fn percent_remaining_in_open_unit(&self) -> Decimal {
        percent_remaining_in_open_unit(self)
    }

    pub fn is_low_stock(&self, threshold: Quantity) -> bool {
        is_low_stock(self, threshold)
    }

    /// Forecast from the item's own ledger over the configured trailing window.
    pub fn forecast(&self, now: DateTime<Utc>, config: &EngineConfig) -> DomainResult<f64> {
        let rate = average_daily_consumption(self.ledger(), now, config.forecast_window_days)?;
        forecast_days_until_depletion(self, rate)
    }
}

/// Active (non-archived) items that need purchasing action.
pub fn low_stock_items(items: &[StockItem], threshold: Quantity) -> Vec<&StockItem> {
    items
        .iter()
        .filter(|item| is_low_stock(item, threshold))
        .collect()
}

/// Aggregate stock across the active (non-archived) items of a studio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTotals {
    pub items: usize,
    pub value_minor: i64,
    /// Grams of filament on hand.
    pub filament: Quantity,
    /// Milliliters of resin on hand.
    pub resin: Quantity,
}

/// Fails if any running total leaves its representable range.
pub fn active_totals(items: &[StockItem]) -> DomainResult<StockTotals> {
    items
        .iter()
        .filter(|item| !item.is_archived())
        .try_fold(StockTotals::default(), |mut totals, item| {
            totals.items += 1;
            totals.value_minor = totals
                .value_minor
                .checked_add(item.stock_value_minor())
                .ok_or_else(|| DomainError::invariant("total stock value overflow"))?;
            let available = item.total_available()?;
            match item.material() {
                MaterialKind::Filament => totals.filament = totals.filament.checked_add(available)?,
                MaterialKind::Resin => totals.resin = totals.resin.checked_add(available)?,
            }
            Ok(totals)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depletion::ConsumeStock;
    use crate::item::{CreateStockItem, StockItemId};
    use crate::ledger::{ConsumeOutcome, LedgerEntryId};
    use chrono::Duration;
    use filastock_core::{AggregateId, EntryId};
    use proptest::prelude::*;

    #[test]
    fn percent_of_open_unit() {
        let item = StockItem::fixture(1000, 250, 0, 8000);
        assert_eq!(item.percent_remaining_in_open_unit(), Decimal::new(25, 0));

        let item = StockItem::fixture(750, 250, 0, 8000);
        assert_eq!(item.percent_remaining_in_open_unit(), Decimal::new(3333, 2));

        let item = StockItem::fixture(1000, 0, 0, 8000);
        assert_eq!(item.percent_remaining_in_open_unit(), Decimal::ZERO);
    }

    #[test]
    fn sealed_reserve_suppresses_low_stock() {
        let threshold = Quantity::whole(100);

        let nearly_empty_with_reserve = StockItem::fixture(1000, 10, 1, 8000);
        assert!(!nearly_empty_with_reserve.is_low_stock(threshold));

        let nearly_empty = StockItem::fixture(1000, 10, 0, 8000);
        assert!(nearly_empty.is_low_stock(threshold));

        let at_threshold = StockItem::fixture(1000, 100, 0, 8000);
        assert!(!at_threshold.is_low_stock(threshold));
    }

    #[test]
    fn archived_items_are_not_alerted_or_totalled() {
        let threshold = Quantity::whole(100);
        let low = StockItem::fixture(1000, 10, 0, 8000);
        let archived = StockItem::fixture(1000, 10, 0, 8000).archive().unwrap();
        let healthy = StockItem::fixture(1000, 500, 2, 8000);

        let items = vec![low.clone(), archived, healthy];
        let alerts = low_stock_items(&items, threshold);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id_typed(), low.id_typed());

        let totals = active_totals(&items).unwrap();
        assert_eq!(totals.items, 2);
        assert_eq!(totals.filament, Quantity::whole(2510));
        assert_eq!(totals.resin, Quantity::ZERO);
        assert_eq!(totals.value_minor, 80 + 20000);
    }

    #[test]
    fn forecast_divides_total_stock_by_rate() {
        let item = StockItem::fixture(1000, 500, 1, 8000);
        let days = forecast_days_until_depletion(&item, Decimal::new(50, 0)).unwrap();
        assert_eq!(days, 30.0);
    }

    #[test]
    fn forecast_with_zero_rate_is_infinite() {
        let item = StockItem::fixture(1000, 500, 1, 8000);
        let days = forecast_days_until_depletion(&item, Decimal::ZERO).unwrap();
        assert!(days.is_infinite());
        assert!(
            forecast_days_until_depletion(&item, Decimal::NEGATIVE_ONE)
                .unwrap()
                .is_infinite()
        );
    }

    #[test]
    fn forecast_from_ledger_uses_trailing_window() {
        let now = Utc::now();
        let item = StockItem::fixture(1000, 1000, 0, 8000);
        let (item, _) = item
            .consume(&ConsumeStock {
                entry_id: LedgerEntryId::new(EntryId::new()),
                quantity: Quantity::whole(300),
                reason: "calibration cubes".to_string(),
                outcome: ConsumeOutcome::Success,
                occurred_at: now - Duration::days(2),
            })
            .unwrap();

        let config = EngineConfig::default();
        // 300 over 30 days = 10/day, 700 left.
        assert_eq!(item.forecast(now, &config).unwrap(), 70.0);

        let stale = item.forecast(now + Duration::days(60), &config).unwrap();
        assert!(stale.is_infinite());
    }

    #[test]
    fn totals_overflow_is_an_error() {
        let bulk = |name: &str| {
            StockItem::create(&CreateStockItem {
                item_id: StockItemId::new(AggregateId::new()),
                name: name.to_string(),
                material: MaterialKind::Resin,
                unit_size: Quantity::new(Decimal::MAX).unwrap(),
                unit_price_minor: 1,
                purchased_units: 1,
                occurred_at: Utc::now(),
            })
            .unwrap()
        };
        let items = vec![bulk("Vat A"), bulk("Vat B")];

        let err = active_totals(&items).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    proptest! {
        /// Property: reads never change the item.
        #[test]
        fn reads_do_not_mutate(open in 0u32..=1000, sealed in 0u32..5, threshold in 0u32..2000) {
            let item = StockItem::fixture(1000, open, sealed, 8000);
            let before = item.clone();

            let pct = item.percent_remaining_in_open_unit();
            let _ = item.is_low_stock(Quantity::whole(threshold));

            prop_assert!(pct >= Decimal::ZERO && pct <= HUNDRED);
            prop_assert_eq!(item, before);
        }
    }
}
