//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
/// `Money` and allocation lines are value objects; receipts and invoices are
/// entities (see [`crate::Entity`]).
///
/// ```ignore
/// let a = Money::parse("10.00")?;
/// let b = Money::parse("10")?;
/// assert_eq!(a, b); // equal by value
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
