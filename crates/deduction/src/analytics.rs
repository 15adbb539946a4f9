//! Food cost of a whole order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{ItemCode, OrderId};
use larder_recipes::{Catalog, RecipeExpander, food_cost, percentage, round_money};
use larder_sales::PosOrder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFoodCost {
    pub item: ItemCode,
    pub qty: Decimal,
    pub selling_price: Decimal,
    pub food_cost: Decimal,
    pub profit: Decimal,
    pub profit_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFoodCost {
    pub order: OrderId,
    /// Lines with an active recipe; others do not count.
    pub lines: Vec<LineFoodCost>,
    pub total_selling_price: Decimal,
    pub total_food_cost: Decimal,
    pub total_profit: Decimal,
    pub profit_percentage: Decimal,
    pub food_cost_percentage: Decimal,
}

/// Selling price is what the order charged (`qty * rate`), falling back to
/// the catalog price when the line carries no rate.
pub fn order_food_cost<C>(expander: &RecipeExpander, catalog: &C, order: &PosOrder) -> OrderFoodCost
where
    C: Catalog + ?Sized,
{
    let lines: Vec<LineFoodCost> = order
        .lines()
        .iter()
        .filter_map(|line| {
            let cost = food_cost(expander, catalog, &line.item, line.qty).ok()?;
            let selling_price = if line.rate > Decimal::ZERO {
                round_money(line.qty * line.rate)
            } else {
                cost.selling_price
            };
            let profit = selling_price - cost.total_food_cost;
            Some(LineFoodCost {
                item: line.item.clone(),
                qty: line.qty,
                selling_price,
                food_cost: cost.total_food_cost,
                profit,
                profit_percentage: percentage(profit, selling_price),
            })
        })
        .collect();

    let total_selling_price: Decimal = lines.iter().map(|l| l.selling_price).sum();
    let total_food_cost: Decimal = lines.iter().map(|l| l.food_cost).sum();
    let total_profit = total_selling_price - total_food_cost;

    OrderFoodCost {
        order: order.id_typed(),
        lines,
        total_selling_price,
        total_food_cost,
        total_profit,
        profit_percentage: percentage(total_profit, total_selling_price),
        food_cost_percentage: percentage(total_food_cost, total_selling_price),
    }
}
