//! `ledger-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, the aggregate/entity traits and the domain error model.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::Aggregate;
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, CustomerId};
pub use money::Amount;
pub use value_object::ValueObject;
