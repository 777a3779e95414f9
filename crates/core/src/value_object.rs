//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// - **Value Object**: `Quantity` (850.00 g is 850.00 g wherever it appears)
/// - **Entity**: a ledger entry (two consumptions of 850 g are still two events)
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Spool {
///     grams: u32,
///     diameter_mm: u32,
/// }
///
/// impl ValueObject for Spool {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
