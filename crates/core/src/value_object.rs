//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. Money
/// amounts and GSTINs are value objects: two `Amount`s of `1800.00` are the
/// same amount no matter which invoice they came from.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct StateCode(String);
///
/// impl ValueObject for StateCode {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
