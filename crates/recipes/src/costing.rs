//! Food cost of a menu item from its recipe.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use larder_core::{ItemCode, Uom};

use crate::catalog::Catalog;
use crate::expand::{ExpandError, RecipeExpander};

/// Money and percentages are reported with two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_money(part / whole * Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientCost {
    pub item: ItemCode,
    pub name: Option<String>,
    pub qty: Decimal,
    pub uom: Uom,
    pub rate: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodCost {
    pub item: ItemCode,
    pub qty: Decimal,
    pub recipe: String,
    pub breakdown: Vec<IngredientCost>,
    pub total_food_cost: Decimal,
    /// Selling price for `qty` units (unit price times quantity).
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub profit_percentage: Decimal,
    pub food_cost_percentage: Decimal,
}

/// Cost of producing `qty` of `item` against its selling price.
pub fn food_cost<C>(
    expander: &RecipeExpander,
    catalog: &C,
    item: &ItemCode,
    qty: Decimal,
) -> Result<FoodCost, ExpandError>
where
    C: Catalog + ?Sized,
{
    let expansion = expander.expand(catalog, item, qty)?;

    let breakdown: Vec<IngredientCost> = expansion
        .requirements
        .iter()
        .map(|req| {
            let rate = if req.recipe_qty.is_zero() {
                Decimal::ZERO
            } else {
                req.amount / req.recipe_qty
            };
            IngredientCost {
                item: req.item.clone(),
                name: catalog.item(&req.item).map(|i| i.name),
                qty: req.recipe_qty,
                uom: req.recipe_uom.clone(),
                rate,
                cost: round_money(req.amount),
            }
        })
        .collect();

    let total_food_cost = round_money(expansion.total_amount());
    let unit_price = catalog
        .item(item)
        .and_then(|i| i.selling_price)
        .unwrap_or_default();
    let selling_price = round_money(unit_price * qty);
    let profit = selling_price - total_food_cost;

    Ok(FoodCost {
        item: item.clone(),
        qty,
        recipe: expansion.recipe,
        breakdown,
        total_food_cost,
        selling_price,
        profit,
        profit_percentage: percentage(profit, selling_price),
        food_cost_percentage: percentage(total_food_cost, selling_price),
    })
}
