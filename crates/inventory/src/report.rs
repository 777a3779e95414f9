//! Read-only aggregations over ledger entries (waste, velocity, spend).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use filastock_core::{DomainError, DomainResult, Quantity};
use filastock_events::Event;

use crate::ledger::{ConsumeOutcome, LedgerEntry, LedgerEntryKind};

/// Consumption and purchasing totals for a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    pub entries: usize,
    pub consumed: Quantity,
    pub successful: Quantity,
    pub failed: Quantity,
    pub cancelled: Quantity,
    pub manual: Quantity,
    /// Failed plus cancelled consumption.
    pub waste: Quantity,
    pub units_purchased: u64,
    pub spent_minor: i64,
}

impl ConsumptionSummary {
    fn record(&mut self, entry: &LedgerEntry) -> DomainResult<()> {
        self.entries += 1;
        match entry.kind() {
            LedgerEntryKind::Consume {
                quantity, outcome, ..
            } => {
                let quantity = *quantity;
                self.consumed = self.consumed.checked_add(quantity)?;
                let bucket = match outcome {
                    ConsumeOutcome::Success => &mut self.successful,
                    ConsumeOutcome::Failure => &mut self.failed,
                    ConsumeOutcome::Cancelled => &mut self.cancelled,
                    ConsumeOutcome::Manual => &mut self.manual,
                };
                *bucket = bucket.checked_add(quantity)?;
                if outcome.is_waste() {
                    self.waste = self.waste.checked_add(quantity)?;
                }
            }
            LedgerEntryKind::Replenish {
                units_added,
                total_paid_minor,
                ..
            } => {
                self.units_purchased += u64::from(*units_added);
                self.spent_minor = self
                    .spent_minor
                    .checked_add(*total_paid_minor)
                    .ok_or_else(|| DomainError::invariant("total spend overflow"))?;
            }
        }
        Ok(())
    }
}

/// Summarize entries with `from <= occurred_at < to`.
pub fn consumption_summary(
    ledger: &[LedgerEntry],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DomainResult<ConsumptionSummary> {
    let mut summary = ConsumptionSummary::default();
    for entry in ledger.iter().filter(|e| e.occurred_between(from, to)) {
        summary.record(entry)?;
    }
    Ok(summary)
}

/// Average consumption per day over the `window_days` ending at `now` (inclusive).
///
/// Returns zero for an empty window, which forecasts as "never depletes".
pub fn average_daily_consumption(
    ledger: &[LedgerEntry],
    now: DateTime<Utc>,
    window_days: u32,
) -> DomainResult<Decimal> {
    if window_days == 0 {
        return Ok(Decimal::ZERO);
    }
    let from = now - Duration::days(i64::from(window_days));
    let consumed = Quantity::checked_sum(
        ledger
            .iter()
            .filter(|entry| {
                let at = entry.occurred_at();
                at > from && at <= now
            })
            .filter_map(LedgerEntry::consumed_quantity),
    )?;
    Ok(consumed.value() / Decimal::from(window_days))
}
