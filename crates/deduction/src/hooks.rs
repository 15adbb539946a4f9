//! Order lifecycle hooks.
//!
//! Each hook applies the order transition first, then runs the engine and
//! writes annotations to the order. Only the transition itself can fail; the
//! engine's problems come back as warnings in the outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use larder_core::{Aggregate, DomainError};
use larder_inventory::StockLedger;
use larder_recipes::Catalog;
use larder_sales::{
    Annotate, CancelOrder, DeleteOrder, OrderCommand, OrderLine, OrderStatus, PosOrder, ReplaceLines,
    SubmitOrder,
};

use crate::engine::DeductionEngine;
use crate::outcome::{AdjustmentOutcome, DeductionOutcome, RestorationOutcome, SkipReason, Warning};

pub struct OrderHooks<C, L> {
    engine: DeductionEngine<C, L>,
}

impl<C, L> OrderHooks<C, L>
where
    C: Catalog,
    L: StockLedger,
{
    pub fn new(engine: DeductionEngine<C, L>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DeductionEngine<C, L> {
        &self.engine
    }

    pub fn on_submit(&self, order: &mut PosOrder, at: DateTime<Utc>) -> Result<DeductionOutcome, DomainError> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::SubmitOrder(SubmitOrder {
            order_id,
            occurred_at: at,
        }))?;

        let outcome = self.engine.deduct(order);
        if let Some(movement) = outcome.movement {
            let sold: Decimal = order.lines().iter().map(|l| l.qty).sum();
            annotate(
                order,
                format!(
                    "Ingredient stock movement {movement} created: {} ingredient lines for {sold} items sold. Food cost: {:.2}",
                    outcome.lines.len(),
                    outcome.food_cost
                ),
                at,
            );
        }
        annotate_warnings(order, &outcome.warnings, at);
        Ok(outcome)
    }

    /// Replace the order's lines; submitted orders get their stock adjusted.
    pub fn on_update_after_submit(
        &self,
        order: &mut PosOrder,
        lines: Vec<OrderLine>,
        at: DateTime<Utc>,
    ) -> Result<AdjustmentOutcome, DomainError> {
        let order_id = order.id_typed();
        let original = order.clone();
        order.execute(&OrderCommand::ReplaceLines(ReplaceLines {
            order_id,
            lines,
            occurred_at: at,
        }))?;

        if original.status() != OrderStatus::Submitted {
            return Ok(AdjustmentOutcome::new(order_id).skip(SkipReason::NotSubmitted));
        }

        let outcome = self.engine.adjust(&original, order);
        if let Some(movement) = outcome.receipt {
            annotate(
                order,
                format!(
                    "Adjustment stock movement {movement} restored {} ingredient lines after edit",
                    outcome.restored.len()
                ),
                at,
            );
        }
        if let Some(movement) = outcome.issue {
            annotate(
                order,
                format!(
                    "Adjustment stock movement {movement} issued {} ingredient lines after edit. Food cost: {:.2}",
                    outcome.deducted.len(),
                    outcome.food_cost
                ),
                at,
            );
        }
        annotate_warnings(order, &outcome.warnings, at);
        Ok(outcome)
    }

    pub fn on_cancel(&self, order: &mut PosOrder, at: DateTime<Utc>) -> Result<RestorationOutcome, DomainError> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::CancelOrder(CancelOrder {
            order_id,
            occurred_at: at,
        }))?;
        Ok(self.restore(order, "cancellation", at))
    }

    pub fn on_delete(&self, order: &mut PosOrder, at: DateTime<Utc>) -> Result<RestorationOutcome, DomainError> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::DeleteOrder(DeleteOrder {
            order_id,
            occurred_at: at,
        }))?;
        Ok(self.restore(order, "deletion", at))
    }

    fn restore(&self, order: &mut PosOrder, reason: &str, at: DateTime<Utc>) -> RestorationOutcome {
        let outcome = self.engine.restore(order);
        for movement in &outcome.cancelled {
            annotate(
                order,
                format!("Stock movement {movement} cancelled due to order {reason}"),
                at,
            );
        }
        for compensation in &outcome.compensations {
            annotate(
                order,
                format!(
                    "Stock movement {} reversed by {} due to order {reason}",
                    compensation.reversed, compensation.movement
                ),
                at,
            );
        }
        annotate_warnings(order, &outcome.warnings, at);
        outcome
    }
}

fn annotate_warnings(order: &mut PosOrder, warnings: &[Warning], at: DateTime<Utc>) {
    for warning in warnings {
        annotate(order, format!("Inventory warning: {warning}"), at);
    }
}

fn annotate(order: &mut PosOrder, note: String, at: DateTime<Utc>) {
    let order_id = order.id_typed();
    if let Err(err) = order.execute(&OrderCommand::Annotate(Annotate {
        order_id,
        note,
        occurred_at: at,
    })) {
        tracing::warn!(order_id = %order_id, error = ?err, "failed to annotate order");
    }
}
