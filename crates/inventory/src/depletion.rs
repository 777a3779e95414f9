//! Cascading draw-down of an open unit and its sealed reserves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filastock_core::{DomainError, DomainResult, Quantity};

use crate::item::StockItem;
use crate::ledger::{ConsumeOutcome, LedgerEntry, LedgerEntryId};

/// Command: ConsumeStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeStock {
    /// Id the resulting ledger entry is recorded under.
    pub entry_id: LedgerEntryId,
    pub quantity: Quantity,
    /// Free text, e.g. "print failure" or "manual adjustment".
    pub reason: String,
    pub outcome: ConsumeOutcome,
    pub occurred_at: DateTime<Utc>,
}

/// Stock levels after a draw-down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Drawdown {
    pub open_remaining: Quantity,
    pub sealed_units: u32,
    /// Sealed units opened to satisfy the request.
    pub units_opened: u32,
}

/// Draw `requested` from the open unit, then from sealed units one at a time.
///
/// Fails without partial consumption when the request exceeds the total stock.
pub fn draw_down(
    unit_size: Quantity,
    open_remaining: Quantity,
    sealed_units: u32,
    requested: Quantity,
) -> DomainResult<Drawdown> {
    if requested.is_zero() {
        return Err(DomainError::invalid_quantity(
            "consumed quantity must be positive",
        ));
    }

    let available = unit_size
        .checked_times(sealed_units)?
        .checked_add(open_remaining)?;
    if requested > available {
        return Err(DomainError::insufficient_stock(requested, available));
    }

    if let Some(left) = open_remaining.checked_sub(requested) {
        return Ok(Drawdown {
            open_remaining: left,
            sealed_units,
            units_opened: 0,
        });
    }

    let mut remaining = requested.checked_sub(open_remaining).unwrap_or(requested);
    let mut open = Quantity::ZERO;
    let mut sealed = sealed_units;
    let mut opened = 0;

    while !remaining.is_zero() && sealed > 0 {
        sealed -= 1;
        opened += 1;
        if let Some(left) = unit_size.checked_sub(remaining) {
            open = left;
            remaining = Quantity::ZERO;
        } else if let Some(rest) = remaining.checked_sub(unit_size) {
            // The freshly opened unit is drained entirely.
            remaining = rest;
        }
    }

    if !remaining.is_zero() {
        return Err(DomainError::invariant(format!(
            "cascade ended with {remaining} undrawn"
        )));
    }

    Ok(Drawdown {
        open_remaining: open,
        sealed_units: sealed,
        units_opened: opened,
    })
}

/// Consume material from an item, returning the next state and its ledger entry.
pub fn consume(item: &StockItem, cmd: &ConsumeStock) -> DomainResult<(StockItem, LedgerEntry)> {
    item.ensure_active()?;

    let drawdown = draw_down(
        item.unit_size(),
        item.open_remaining(),
        item.sealed_units(),
        cmd.quantity,
    )?;

    if drawdown.units_opened > 0 {
        tracing::debug!(
            item_id = %item.id_typed(),
            units_opened = drawdown.units_opened,
            sealed_left = drawdown.sealed_units,
            "consumption cascaded into sealed units"
        );
    }

    let entry = LedgerEntry::consume(
        cmd.entry_id,
        item.id_typed(),
        cmd.quantity,
        cmd.reason.clone(),
        cmd.outcome,
        cmd.occurred_at,
    );
    let next = item.commit(
        drawdown.open_remaining,
        drawdown.sealed_units,
        item.unit_price_minor(),
        entry.clone(),
    );
    Ok((next, entry))
}

impl StockItem {
    pub fn consume(&self, cmd: &ConsumeStock) -> DomainResult<(StockItem, LedgerEntry)> {
        consume(self, cmd)
    }
}
