use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use filastock_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Quantity};

use crate::ledger::LedgerEntry;

/// Stock item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockItemId(pub AggregateId);

impl StockItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of consumable; fixes the unit quantities are measured in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    /// Spools, measured in grams.
    Filament,
    /// Bottles, measured in milliliters.
    Resin,
}

impl MaterialKind {
    pub fn unit_label(self) -> &'static str {
        match self {
            MaterialKind::Filament => "g",
            MaterialKind::Resin => "ml",
        }
    }
}

/// Command: CreateStockItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStockItem {
    pub item_id: StockItemId,
    pub name: String,
    pub material: MaterialKind,
    /// Contents of one unopened unit.
    pub unit_size: Quantity,
    /// Price of one full unit in minor currency units.
    pub unit_price_minor: i64,
    /// Units bought with the initial purchase; one of them is opened right away.
    pub purchased_units: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: StockItem.
///
/// One consumable material type, tracked as a single open unit plus a count of
/// sealed reserve units. Values are never mutated in place: every operation
/// returns the next state and leaves `self` untouched.
///
/// Loading goes through [`StockItemRecord`], so a stored item that breaks the
/// stock invariants is rejected instead of reaching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StockItemRecord")]
pub struct StockItem {
    id: StockItemId,
    name: String,
    material: MaterialKind,
    unit_size: Quantity,
    unit_price_minor: i64,
    sealed_units: u32,
    open_remaining: Quantity,
    ledger: Vec<LedgerEntry>,
    archived: bool,
    created_at: DateTime<Utc>,
    version: u64,
}

impl StockItem {
    pub fn create(cmd: &CreateStockItem) -> DomainResult<Self> {
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.unit_size.is_zero() {
            return Err(DomainError::invalid_quantity("unit size must be positive"));
        }
        if cmd.unit_price_minor <= 0 {
            return Err(DomainError::validation("unit price must be positive"));
        }

        let (sealed_units, open_remaining) = match cmd.purchased_units {
            0 => (0, Quantity::ZERO),
            n => (n - 1, cmd.unit_size),
        };
        cmd.unit_size.checked_times(cmd.purchased_units)?;

        Ok(Self {
            id: cmd.item_id,
            name: cmd.name.trim().to_string(),
            material: cmd.material,
            unit_size: cmd.unit_size,
            unit_price_minor: cmd.unit_price_minor,
            sealed_units,
            open_remaining,
            ledger: Vec::new(),
            archived: false,
            created_at: cmd.occurred_at,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> StockItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> MaterialKind {
        self.material
    }

    pub fn unit_size(&self) -> Quantity {
        self.unit_size
    }

    pub fn unit_price_minor(&self) -> i64 {
        self.unit_price_minor
    }

    pub fn sealed_units(&self) -> u32 {
        self.sealed_units
    }

    pub fn open_remaining(&self) -> Quantity {
        self.open_remaining
    }

    /// Chronological (oldest first) ledger of every consume/replenish.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total physical stock: open unit remainder plus every sealed unit.
    pub fn total_available(&self) -> DomainResult<Quantity> {
        self.unit_size
            .checked_times(self.sealed_units)?
            .checked_add(self.open_remaining)
    }

    /// Stock on hand expressed in units, the open unit counted as a fraction.
    pub fn existing_units(&self) -> Decimal {
        let open_fraction = self
            .open_remaining
            .value()
            .checked_div(self.unit_size.value())
            .unwrap_or(Decimal::ZERO);
        Decimal::from(self.sealed_units) + open_fraction
    }

    /// Value of the stock on hand at the current unit price, in minor units.
    pub fn stock_value_minor(&self) -> i64 {
        self.existing_units()
            .checked_mul(Decimal::from(self.unit_price_minor))
            .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|v| v.to_i64())
            .unwrap_or(i64::MAX)
    }

    /// Soft-delete. Archived items keep their ledger but reject every mutation.
    pub fn archive(&self) -> DomainResult<StockItem> {
        self.ensure_active()?;
        let mut next = self.clone();
        next.archived = true;
        next.version += 1;
        Ok(next)
    }

    pub(crate) fn ensure_active(&self) -> DomainResult<()> {
        if self.archived {
            return Err(DomainError::archived(self.id));
        }
        Ok(())
    }

    /// Build the successor state for an applied ledger entry.
    pub(crate) fn commit(
        &self,
        open_remaining: Quantity,
        sealed_units: u32,
        unit_price_minor: i64,
        entry: LedgerEntry,
    ) -> StockItem {
        let mut next = self.clone();
        next.open_remaining = open_remaining;
        next.sealed_units = sealed_units;
        next.unit_price_minor = unit_price_minor;
        next.ledger.push(entry);
        next.version += 1;
        next
    }

    #[cfg(test)]
    pub(crate) fn fixture(
        unit_size: u32,
        open_remaining: u32,
        sealed_units: u32,
        unit_price_minor: i64,
    ) -> StockItem {
        StockItem {
            id: StockItemId::new(AggregateId::new()),
            name: "PLA Red".to_string(),
            material: MaterialKind::Filament,
            unit_size: Quantity::whole(unit_size),
            unit_price_minor,
            sealed_units,
            open_remaining: Quantity::whole(open_remaining),
            ledger: Vec::new(),
            archived: false,
            created_at: Utc::now(),
            version: 0,
        }
    }
}

/// Stored shape of a [`StockItem`], validated on conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct StockItemRecord {
    pub id: StockItemId,
    pub name: String,
    pub material: MaterialKind,
    pub unit_size: Quantity,
    pub unit_price_minor: i64,
    pub sealed_units: u32,
    pub open_remaining: Quantity,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl TryFrom<StockItemRecord> for StockItem {
    type Error = DomainError;

    fn try_from(record: StockItemRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(DomainError::invariant("stored item has an empty name"));
        }
        if record.unit_size.is_zero() {
            return Err(DomainError::invariant("stored unit size must be positive"));
        }
        if record.unit_price_minor <= 0 {
            return Err(DomainError::invariant(format!(
                "stored unit price must be positive, got {}",
                record.unit_price_minor
            )));
        }
        if record.open_remaining > record.unit_size {
            return Err(DomainError::invariant(format!(
                "open unit holds {} but a unit is only {}",
                record.open_remaining, record.unit_size
            )));
        }
        if let Some(entry) = record.ledger.iter().find(|e| e.item_id() != record.id) {
            return Err(DomainError::invariant(format!(
                "ledger entry {} belongs to item {}",
                entry.id_typed(),
                entry.item_id()
            )));
        }

        let item = Self {
            id: record.id,
            name: record.name,
            material: record.material,
            unit_size: record.unit_size,
            unit_price_minor: record.unit_price_minor,
            sealed_units: record.sealed_units,
            open_remaining: record.open_remaining,
            ledger: record.ledger,
            archived: record.archived,
            created_at: record.created_at,
            version: record.version,
        };
        item.total_available()?;
        Ok(item)
    }
}

impl AggregateRoot for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ConsumeOutcome, LedgerEntryId};
    use filastock_core::EntryId;
    use serde_json::json;

    fn create_cmd(purchased_units: u32) -> CreateStockItem {
        CreateStockItem {
            item_id: StockItemId::new(AggregateId::new()),
            name: "PETG Black, Brand X".to_string(),
            material: MaterialKind::Filament,
            unit_size: Quantity::whole(1000),
            unit_price_minor: 8000,
            purchased_units,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn create_opens_one_purchased_unit() {
        let item = StockItem::create(&create_cmd(3)).unwrap();
        assert_eq!(item.sealed_units(), 2);
        assert_eq!(item.open_remaining(), Quantity::whole(1000));
        assert_eq!(item.total_available().unwrap(), Quantity::whole(3000));
        assert!(item.ledger().is_empty());
        assert_eq!(item.version(), 0);
    }

    #[test]
    fn create_without_purchase_starts_empty() {
        let item = StockItem::create(&create_cmd(0)).unwrap();
        assert_eq!(item.sealed_units(), 0);
        assert_eq!(item.open_remaining(), Quantity::ZERO);
        assert_eq!(item.total_available().unwrap(), Quantity::ZERO);
    }

    #[test]
    fn create_rejects_non_positive_unit_size_and_price() {
        let mut cmd = create_cmd(1);
        cmd.unit_size = Quantity::ZERO;
        assert!(matches!(
            StockItem::create(&cmd),
            Err(DomainError::InvalidQuantity(_))
        ));

        let mut cmd = create_cmd(1);
        cmd.unit_price_minor = 0;
        assert!(matches!(
            StockItem::create(&cmd),
            Err(DomainError::Validation(_))
        ));

        let mut cmd = create_cmd(1);
        cmd.name = "   ".to_string();
        assert!(StockItem::create(&cmd).is_err());
    }

    #[test]
    fn stock_value_counts_open_unit_as_fraction() {
        let item = StockItem::fixture(1000, 250, 2, 8000);
        assert_eq!(item.existing_units(), Decimal::new(225, 2));
        assert_eq!(item.stock_value_minor(), 18000);
    }

    #[test]
    fn archive_is_terminal() {
        let item = StockItem::fixture(1000, 500, 1, 8000);
        let archived = item.archive().unwrap();
        assert!(archived.is_archived());
        assert!(!item.is_archived());
        assert_eq!(archived.version(), item.version() + 1);

        let err = archived.archive().unwrap_err();
        assert!(matches!(err, DomainError::ArchivedItem(_)));
    }

    fn stored(item: &StockItem) -> serde_json::Value {
        serde_json::to_value(item).unwrap()
    }

    fn load(value: serde_json::Value) -> Result<StockItem, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn loading_accepts_a_saved_item() {
        let item = StockItem::fixture(1000, 500, 1, 8000);
        assert_eq!(load(stored(&item)).unwrap(), item);
    }

    #[test]
    fn loading_rejects_negative_price_with_overfull_open_unit() {
        let mut value = stored(&StockItem::fixture(1000, 500, 1, 8000));
        value["unit_price_minor"] = json!(-500);
        value["open_remaining"] = json!("5000");

        let err = load(value).unwrap_err();
        assert!(err.to_string().contains("invariant violated"));
    }

    #[test]
    fn loading_rejects_open_unit_larger_than_unit_size() {
        let mut value = stored(&StockItem::fixture(1000, 500, 1, 8000));
        value["open_remaining"] = json!("1000.01");

        let err = load(value).unwrap_err();
        assert!(err.to_string().contains("open unit holds 1000.01"));
    }

    #[test]
    fn loading_rejects_non_positive_price_and_unit_size() {
        let item = StockItem::fixture(1000, 500, 1, 8000);

        let mut zero_price = stored(&item);
        zero_price["unit_price_minor"] = json!(0);
        assert!(load(zero_price).is_err());

        let mut zero_unit = stored(&item);
        zero_unit["unit_size"] = json!("0");
        zero_unit["open_remaining"] = json!("0");
        let err = load(zero_unit).unwrap_err();
        assert!(err.to_string().contains("unit size must be positive"));
    }

    #[test]
    fn loading_rejects_blank_name() {
        let mut value = stored(&StockItem::fixture(1000, 500, 1, 8000));
        value["name"] = json!("  ");
        assert!(load(value).is_err());
    }

    #[test]
    fn loading_rejects_ledger_entry_of_another_item() {
        let other = StockItemId::new(AggregateId::new());
        let entry = LedgerEntry::replenish(
            LedgerEntryId::new(EntryId::new()),
            other,
            1,
            8000,
            8000,
            Utc::now(),
        );
        let mut value = stored(&StockItem::fixture(1000, 500, 1, 8000));
        value["ledger"] = json!([serde_json::to_value(&entry).unwrap()]);

        let err = load(value).unwrap_err();
        assert!(err.to_string().contains(&format!("belongs to item {other}")));
    }

    #[test]
    fn loading_rejects_malformed_ledger_entries() {
        let item = StockItem::fixture(1000, 500, 1, 8000);
        let consume = LedgerEntry::consume(
            LedgerEntryId::new(EntryId::new()),
            item.id_typed(),
            Quantity::whole(10),
            "calibration cube",
            ConsumeOutcome::Success,
            Utc::now(),
        );
        let replenish = LedgerEntry::replenish(
            LedgerEntryId::new(EntryId::new()),
            item.id_typed(),
            1,
            8000,
            8000,
            Utc::now(),
        );

        let mut empty_consume = serde_json::to_value(&consume).unwrap();
        empty_consume["quantity"] = json!("0");
        let mut value = stored(&item);
        value["ledger"] = json!([empty_consume]);
        assert!(load(value).is_err());

        let mut no_units = serde_json::to_value(&replenish).unwrap();
        no_units["units_added"] = json!(0);
        let mut value = stored(&item);
        value["ledger"] = json!([no_units]);
        assert!(load(value).is_err());

        let mut value = stored(&item);
        value["ledger"] = json!([
            serde_json::to_value(&consume).unwrap(),
            serde_json::to_value(&replenish).unwrap()
        ]);
        assert_eq!(load(value).unwrap().ledger().len(), 2);
    }
}
