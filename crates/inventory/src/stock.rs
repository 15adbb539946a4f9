//! On-hand stock reads and the availability check.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{ItemCode, WarehouseCode};

/// Stock row key: one item in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item: ItemCode,
    pub warehouse: WarehouseCode,
}

impl StockKey {
    pub fn new(item: ItemCode, warehouse: WarehouseCode) -> Self {
        Self { item, warehouse }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.item, self.warehouse)
    }
}

/// Read-only view of on-hand quantities.
pub trait StockReader: Send + Sync {
    /// Current on-hand quantity. A missing stock row reads as zero.
    fn on_hand(&self, item: &ItemCode, warehouse: &WarehouseCode) -> Decimal;
}

impl<R> StockReader for std::sync::Arc<R>
where
    R: StockReader + ?Sized,
{
    fn on_hand(&self, item: &ItemCode, warehouse: &WarehouseCode) -> Decimal {
        (**self).on_hand(item, warehouse)
    }
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub item: ItemCode,
    pub warehouse: WarehouseCode,
    pub required: Decimal,
    pub available: Decimal,
    pub sufficient: bool,
    /// `max(0, required - available)`.
    pub shortage: Decimal,
}

/// Check whether `required` of `item` is on hand in `warehouse`.
///
/// Advisory only: the ledger re-validates when the movement is written.
pub fn check<R>(reader: &R, item: &ItemCode, warehouse: &WarehouseCode, required: Decimal) -> Availability
where
    R: StockReader + ?Sized,
{
    let available = reader.on_hand(item, warehouse);
    Availability {
        item: item.clone(),
        warehouse: warehouse.clone(),
        required,
        available,
        sufficient: available >= required,
        shortage: (required - available).max(Decimal::ZERO),
    }
}
