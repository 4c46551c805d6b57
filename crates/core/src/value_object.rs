//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two amounts of
/// 25 are the same amount, while two accounts holding 25 are still two accounts.
///
/// - **Value Object**: `Amount`, a transaction endpoint
/// - **Entity**: `Account` (see [`crate::Entity`])
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
