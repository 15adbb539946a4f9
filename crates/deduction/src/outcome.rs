//! Structured results of engine operations.
//!
//! The engine never fails the lifecycle event it runs for. Everything that
//! went wrong is reported here as a [`Warning`] instead.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{ItemCode, MovementId, OrderId, Uom, WarehouseCode};
use larder_inventory::{MovementKind, MovementLine};

use crate::warehouse::ResolvedWarehouse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Sold item has no active default recipe; nothing deducted for it.
    NoActiveRecipe { item: ItemCode },
    /// Recipe exists but cannot be used (zero yield, no lines, ...).
    InvalidRecipe { item: ItemCode, reason: String },
    /// Recipe unit could not be converted; the unconverted quantity was used.
    ConversionFallback {
        ingredient: ItemCode,
        from: Uom,
        to: Uom,
    },
    /// Ingredient missing from the catalog.
    UnknownIngredient { ingredient: ItemCode },
    /// No warehouse on profile, branch or company.
    NoWarehouse,
    /// Ingredient skipped from the movement.
    InsufficientStock {
        ingredient: ItemCode,
        warehouse: WarehouseCode,
        required: Decimal,
        available: Decimal,
        shortage: Decimal,
    },
    /// A live deduction already exists for the order.
    AlreadyDeducted { movement: MovementId },
    MovementCreationFailed {
        movement_kind: MovementKind,
        reason: String,
    },
    MovementReversalFailed { movement: MovementId, reason: String },
}

impl Warning {
    /// Emit the warning as a structured log event.
    pub fn log(&self, order: OrderId) {
        match self {
            Warning::NoActiveRecipe { item } => {
                tracing::warn!(order_id = %order, item = %item, "no active recipe; item skipped");
            }
            Warning::InvalidRecipe { item, reason } => {
                tracing::warn!(order_id = %order, item = %item, reason = %reason, "recipe unusable; item skipped");
            }
            Warning::ConversionFallback { ingredient, from, to } => {
                tracing::warn!(
                    order_id = %order,
                    ingredient = %ingredient,
                    from = %from,
                    to = %to,
                    "unit conversion fell back to recipe quantity"
                );
            }
            Warning::UnknownIngredient { ingredient } => {
                tracing::warn!(order_id = %order, ingredient = %ingredient, "ingredient not in catalog");
            }
            Warning::NoWarehouse => {
                tracing::warn!(order_id = %order, "no warehouse resolved; stock untouched");
            }
            Warning::InsufficientStock {
                ingredient,
                warehouse,
                required,
                available,
                shortage,
            } => {
                tracing::warn!(
                    order_id = %order,
                    ingredient = %ingredient,
                    warehouse = %warehouse,
                    required = %required,
                    available = %available,
                    shortage = %shortage,
                    "insufficient stock; ingredient skipped"
                );
            }
            Warning::AlreadyDeducted { movement } => {
                tracing::warn!(order_id = %order, movement_id = %movement, "order already deducted");
            }
            Warning::MovementCreationFailed { movement_kind, reason } => {
                tracing::warn!(order_id = %order, movement_kind = ?movement_kind, reason = %reason, "stock movement not created");
            }
            Warning::MovementReversalFailed { movement, reason } => {
                tracing::warn!(
                    order_id = %order,
                    movement_id = %movement,
                    reason = %reason,
                    "stock movement not reversed"
                );
            }
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoActiveRecipe { item } => write!(f, "no active recipe for {item}"),
            Warning::InvalidRecipe { item, reason } => write!(f, "recipe for {item} is unusable: {reason}"),
            Warning::ConversionFallback { ingredient, from, to } => {
                write!(f, "no conversion {from} -> {to} for {ingredient}; recipe quantity used")
            }
            Warning::UnknownIngredient { ingredient } => write!(f, "ingredient {ingredient} is not in the catalog"),
            Warning::NoWarehouse => write!(f, "no default warehouse found"),
            Warning::InsufficientStock {
                ingredient,
                warehouse,
                required,
                available,
                shortage,
            } => write!(
                f,
                "insufficient stock for {ingredient} in {warehouse}: required {required}, available {available}, short {shortage}"
            ),
            Warning::AlreadyDeducted { movement } => write!(f, "already deducted by {movement}"),
            Warning::MovementCreationFailed { movement_kind, reason } => {
                write!(f, "failed to create {movement_kind:?} movement: {reason}")
            }
            Warning::MovementReversalFailed { movement, reason } => {
                write!(f, "failed to reverse {movement}: {reason}")
            }
        }
    }
}

/// Why an operation posted nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Deduction flag is off for the order's profile.
    Disabled,
    NoWarehouse,
    AlreadyDeducted,
    /// Nothing changed between the original and updated order.
    NoChanges,
    /// Draft edits have no stock effect.
    NotSubmitted,
    /// Every ingredient was skipped, or there was nothing to reverse.
    NothingToPost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    pub order: OrderId,
    pub warehouse: Option<ResolvedWarehouse>,
    pub movement: Option<MovementId>,
    pub lines: Vec<MovementLine>,
    /// Sum of line amounts, 2 dp.
    pub food_cost: Decimal,
    pub skipped: Option<SkipReason>,
    pub warnings: Vec<Warning>,
}

impl DeductionOutcome {
    pub(crate) fn new(order: OrderId) -> Self {
        Self {
            order,
            warehouse: None,
            movement: None,
            lines: Vec::new(),
            food_cost: Decimal::ZERO,
            skipped: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    pub order: OrderId,
    pub warehouse: Option<ResolvedWarehouse>,
    /// Issue for added items and increased quantities.
    pub issue: Option<MovementId>,
    /// Receipt for removed items and decreased quantities.
    pub receipt: Option<MovementId>,
    pub deducted: Vec<MovementLine>,
    pub restored: Vec<MovementLine>,
    /// Food cost of the deducted lines, 2 dp.
    pub food_cost: Decimal,
    pub skipped: Option<SkipReason>,
    pub warnings: Vec<Warning>,
}

impl AdjustmentOutcome {
    pub(crate) fn new(order: OrderId) -> Self {
        Self {
            order,
            warehouse: None,
            issue: None,
            receipt: None,
            deducted: Vec::new(),
            restored: Vec::new(),
            food_cost: Decimal::ZERO,
            skipped: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }
}

/// A movement that could not be cancelled and was offset instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    pub reversed: MovementId,
    pub movement: MovementId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationOutcome {
    pub order: OrderId,
    /// Movements reversed through the ledger's native cancel.
    pub cancelled: Vec<MovementId>,
    pub compensations: Vec<Compensation>,
    pub skipped: Option<SkipReason>,
    pub warnings: Vec<Warning>,
}

impl RestorationOutcome {
    pub(crate) fn new(order: OrderId) -> Self {
        Self {
            order,
            cancelled: Vec::new(),
            compensations: Vec::new(),
            skipped: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    pub fn reversed_count(&self) -> usize {
        self.cancelled.len() + self.compensations.len()
    }
}
