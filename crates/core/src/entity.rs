//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Ledger entries are entities: two entries with identical contents but
/// different ids are different events.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
