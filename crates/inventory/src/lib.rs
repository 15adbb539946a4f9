//! Inventory domain module.
//!
//! Unit conversion, on-hand availability checks, the stock movement aggregate
//! and the ledger seam the deduction engine writes through.

pub mod ledger;
pub mod movement;
pub mod stock;
pub mod uom;

pub use ledger::{InMemoryStockLedger, LedgerError, NewMovement, StockLedger};
pub use movement::{
    AmendMovement, CancelMovement, CommitMovement, MovementAmended, MovementCancelled, MovementCommand,
    MovementCommitted, MovementEvent, MovementKind, MovementLine, MovementPurpose, MovementStatus,
    StockMovement,
};
pub use stock::{Availability, StockKey, StockReader, check};
pub use uom::{Conversion, ConversionEntry, ConversionNotFound, ConversionSource, UomOverrides, UomTable};
