//! Replenishment and weighted-average unit costing.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use filastock_core::{DomainError, DomainResult};

use crate::item::StockItem;
use crate::ledger::{LedgerEntry, LedgerEntryId};

/// Command: ReplenishStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishStock {
    /// Id the resulting ledger entry is recorded under.
    pub entry_id: LedgerEntryId,
    /// Sealed units received.
    pub units_added: u32,
    /// Amount paid for all of them, in minor currency units.
    pub total_paid_minor: i64,
    pub occurred_at: DateTime<Utc>,
}

fn overflow() -> DomainError {
    DomainError::invariant("stock value exceeds representable range")
}

/// Blend the value of stock on hand with a new purchase into one unit price.
///
/// `existing_units` counts the open unit as a fraction. The result is rounded
/// to the nearest minor unit and never drops below one.
///
/// The price lies between the old price and the purchase's per-unit price to
/// within ±1 minor unit, since the result is rounded. A sliver of 0.000001
/// units at 8000 topped up with 3 units for 10000 prices at 3333, just under
/// the exact per-unit cost of 3333.33.
pub fn weighted_average_price(
    existing_units: Decimal,
    unit_price_minor: i64,
    units_added: u32,
    total_paid_minor: i64,
) -> DomainResult<i64> {
    let existing_value = existing_units
        .checked_mul(Decimal::from(unit_price_minor))
        .ok_or_else(overflow)?;
    let new_total_units = existing_units
        .checked_add(Decimal::from(units_added))
        .ok_or_else(overflow)?;
    if new_total_units <= Decimal::ZERO {
        return Ok(unit_price_minor);
    }

    let new_total_value = existing_value
        .checked_add(Decimal::from(total_paid_minor))
        .ok_or_else(overflow)?;
    let price = new_total_value
        .checked_div(new_total_units)
        .ok_or_else(overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(overflow)?;

    Ok(price.max(1))
}

/// Add sealed units bought for `total_paid_minor` and re-price the item.
///
/// The open unit is left untouched; only later consumption draws on it.
pub fn replenish(item: &StockItem, cmd: &ReplenishStock) -> DomainResult<(StockItem, LedgerEntry)> {
    item.ensure_active()?;

    if cmd.units_added == 0 {
        return Err(DomainError::invalid_quantity("units added must be positive"));
    }
    if cmd.total_paid_minor < 0 {
        return Err(DomainError::invalid_quantity(
            "total paid cannot be negative",
        ));
    }

    let new_unit_price_minor = weighted_average_price(
        item.existing_units(),
        item.unit_price_minor(),
        cmd.units_added,
        cmd.total_paid_minor,
    )?;
    let sealed_units = item
        .sealed_units()
        .checked_add(cmd.units_added)
        .ok_or_else(|| DomainError::invalid_quantity("sealed unit count overflow"))?;
    item.unit_size()
        .checked_times(sealed_units)?
        .checked_add(item.open_remaining())?;

    tracing::debug!(
        item_id = %item.id_typed(),
        units_added = cmd.units_added,
        previous_price_minor = item.unit_price_minor(),
        new_price_minor = new_unit_price_minor,
        "stock replenished"
    );

    let entry = LedgerEntry::replenish(
        cmd.entry_id,
        item.id_typed(),
        cmd.units_added,
        cmd.total_paid_minor,
        new_unit_price_minor,
        cmd.occurred_at,
    );
    let next = item.commit(
        item.open_remaining(),
        sealed_units,
        new_unit_price_minor,
        entry.clone(),
    );
    Ok((next, entry))
}

impl StockItem {
    pub fn replenish(&self, cmd: &ReplenishStock) -> DomainResult<(StockItem, LedgerEntry)> {
        replenish(self, cmd)
    }
}
