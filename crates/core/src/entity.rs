//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Receipts and invoices are entities: two snapshots with the same id describe
/// the same document even when balances differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// True when `other` refers to the same document, regardless of state.
    fn same_identity_as(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }
}
