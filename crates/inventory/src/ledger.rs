//! Append-only stock ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filastock_core::{DomainError, Entity, EntryId, Quantity};
use filastock_events::Event;

use crate::item::StockItemId;

/// Ledger entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerEntryId(pub EntryId);

impl LedgerEntryId {
    pub fn new(id: EntryId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// How the job that consumed material ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumeOutcome {
    Success,
    Failure,
    Cancelled,
    Manual,
}

impl ConsumeOutcome {
    /// Material consumed by a failed or cancelled print.
    pub fn is_waste(self) -> bool {
        matches!(self, ConsumeOutcome::Failure | ConsumeOutcome::Cancelled)
    }
}

/// What happened, per entry kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    Consume {
        /// Full requested quantity, not the per-unit breakdown.
        quantity: Quantity,
        reason: String,
        outcome: ConsumeOutcome,
    },
    Replenish {
        units_added: u32,
        total_paid_minor: i64,
        new_unit_price_minor: i64,
    },
}

/// One immutable record of a state-changing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LedgerEntryRecord")]
pub struct LedgerEntry {
    id: LedgerEntryId,
    item_id: StockItemId,
    occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    kind: LedgerEntryKind,
}

impl LedgerEntry {
    pub fn consume(
        id: LedgerEntryId,
        item_id: StockItemId,
        quantity: Quantity,
        reason: impl Into<String>,
        outcome: ConsumeOutcome,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id,
            occurred_at,
            kind: LedgerEntryKind::Consume {
                quantity,
                reason: reason.into(),
                outcome,
            },
        }
    }

    pub fn replenish(
        id: LedgerEntryId,
        item_id: StockItemId,
        units_added: u32,
        total_paid_minor: i64,
        new_unit_price_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id,
            occurred_at,
            kind: LedgerEntryKind::Replenish {
                units_added,
                total_paid_minor,
                new_unit_price_minor,
            },
        }
    }

    pub fn id_typed(&self) -> LedgerEntryId {
        self.id
    }

    pub fn item_id(&self) -> StockItemId {
        self.item_id
    }

    pub fn kind(&self) -> &LedgerEntryKind {
        &self.kind
    }

    pub fn is_consume(&self) -> bool {
        matches!(self.kind, LedgerEntryKind::Consume { .. })
    }

    pub fn is_replenish(&self) -> bool {
        matches!(self.kind, LedgerEntryKind::Replenish { .. })
    }

    /// Consumed quantity, for `CONSUME` entries.
    pub fn consumed_quantity(&self) -> Option<Quantity> {
        match &self.kind {
            LedgerEntryKind::Consume { quantity, .. } => Some(*quantity),
            LedgerEntryKind::Replenish { .. } => None,
        }
    }
}

/// Stored shape of a [`LedgerEntry`], validated on conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntryRecord {
    pub id: LedgerEntryId,
    pub item_id: StockItemId,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LedgerEntryKind,
}

impl TryFrom<LedgerEntryRecord> for LedgerEntry {
    type Error = DomainError;

    fn try_from(record: LedgerEntryRecord) -> Result<Self, Self::Error> {
        match &record.kind {
            LedgerEntryKind::Consume { quantity, .. } if quantity.is_zero() => {
                return Err(DomainError::invariant(format!(
                    "consume entry {} has no quantity",
                    record.id
                )));
            }
            LedgerEntryKind::Replenish { units_added: 0, .. } => {
                return Err(DomainError::invariant(format!(
                    "replenish entry {} adds no units",
                    record.id
                )));
            }
            LedgerEntryKind::Replenish {
                total_paid_minor,
                new_unit_price_minor,
                ..
            } if *total_paid_minor < 0 || *new_unit_price_minor <= 0 => {
                return Err(DomainError::invariant(format!(
                    "replenish entry {} has paid {total_paid_minor} at price {new_unit_price_minor}",
                    record.id
                )));
            }
            _ => {}
        }

        Ok(Self {
            id: record.id,
            item_id: record.item_id,
            occurred_at: record.occurred_at,
            kind: record.kind,
        })
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Event for LedgerEntry {
    fn event_type(&self) -> &'static str {
        match self.kind {
            LedgerEntryKind::Consume { .. } => "inventory.stock.consumed",
            LedgerEntryKind::Replenish { .. } => "inventory.stock.replenished",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
