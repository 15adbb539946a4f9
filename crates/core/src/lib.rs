//! Domain foundation: ids and codes, errors, aggregate traits.
//!
//! Pure domain primitives shared by the inventory, recipe, sales and
//! deduction crates (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{BranchCode, CompanyCode, ItemCode, MovementId, OrderId, ProfileCode, Uom, WarehouseCode};
