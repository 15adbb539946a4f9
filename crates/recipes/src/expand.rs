//! Recipe explosion: sold menu quantity -> raw ingredient requirements.
//!
//! Pure calculation. Availability and movements are the engine's business.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use larder_core::{DomainError, ItemCode, Uom, WarehouseCode};
use larder_inventory::UomTable;

use crate::catalog::Catalog;
use crate::recipe::RecipeLine;

/// Ingredient needed for one expansion (or a whole order, after merging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub item: ItemCode,
    /// Quantity in the recipe line's unit.
    pub recipe_qty: Decimal,
    pub recipe_uom: Uom,
    /// Quantity in the ingredient's stock unit (or the recipe unit on fallback).
    pub qty: Decimal,
    pub uom: Uom,
    /// Cost of `recipe_qty` at the recipe line's rate.
    pub amount: Decimal,
    /// Set when no unit conversion was found and `qty` is unconverted.
    pub conversion_fallback: bool,
    /// Filled in by the caller once a warehouse is resolved.
    pub warehouse: Option<WarehouseCode>,
}

impl IngredientRequirement {
    pub fn with_warehouse(mut self, warehouse: WarehouseCode) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    /// Scale every quantity and the amount by `factor`.
    pub fn scaled(&self, factor: Decimal) -> Self {
        Self {
            recipe_qty: self.recipe_qty * factor,
            qty: self.qty * factor,
            amount: self.amount * factor,
            ..self.clone()
        }
    }
}

/// Non-fatal notes produced while expanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpandWarning {
    /// No conversion from the recipe unit to the stock unit; the unconverted
    /// quantity was kept.
    ConversionFallback {
        ingredient: ItemCode,
        from: Uom,
        to: Uom,
    },
    /// The ingredient is not in the catalog; its recipe unit was kept.
    UnknownIngredient { ingredient: ItemCode },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// Valid "nothing to deduct" outcome for items sold without a recipe.
    #[error("no active default recipe for {0}")]
    NoActiveRecipe(ItemCode),

    #[error("recipe for {item} is unusable: {reason}")]
    InvalidRecipe { item: ItemCode, reason: DomainError },

    #[error("sold quantity must be positive (got {0})")]
    InvalidQuantity(Decimal),
}

/// Result of exploding one menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub menu_item: ItemCode,
    pub sold_qty: Decimal,
    pub recipe: String,
    pub requirements: Vec<IngredientRequirement>,
    pub warnings: Vec<ExpandWarning>,
}

impl Expansion {
    pub fn has_fallback(&self) -> bool {
        self.requirements.iter().any(|r| r.conversion_fallback)
    }

    pub fn total_amount(&self) -> Decimal {
        self.requirements.iter().map(|r| r.amount).sum()
    }
}

/// Explodes recipes using a static unit table plus per-item overrides.
#[derive(Debug, Clone, Default)]
pub struct RecipeExpander {
    uom: UomTable,
}

impl RecipeExpander {
    pub fn new(uom: UomTable) -> Self {
        Self { uom }
    }

    pub fn uom_table(&self) -> &UomTable {
        &self.uom
    }

    /// Explode `item`'s active default recipe for `sold_qty` units sold.
    pub fn expand<C>(&self, catalog: &C, item: &ItemCode, sold_qty: Decimal) -> Result<Expansion, ExpandError>
    where
        C: Catalog + ?Sized,
    {
        if sold_qty <= Decimal::ZERO {
            return Err(ExpandError::InvalidQuantity(sold_qty));
        }

        let recipe = catalog
            .active_default_recipe(item)
            .ok_or_else(|| ExpandError::NoActiveRecipe(item.clone()))?;
        recipe.validate().map_err(|reason| ExpandError::InvalidRecipe {
            item: item.clone(),
            reason,
        })?;

        let mut warnings = Vec::new();
        let requirements: Vec<IngredientRequirement> = recipe
            .lines
            .iter()
            .map(|line| {
                // Multiply first: a batch of 3 sold 3 times is exactly one batch.
                let recipe_qty = line.qty * sold_qty / recipe.quantity;
                self.resolve_line(catalog, line, recipe_qty, &mut warnings)
            })
            .collect();

        Ok(Expansion {
            menu_item: item.clone(),
            sold_qty,
            recipe: recipe.name,
            requirements: merge_requirements(requirements),
            warnings,
        })
    }

    fn resolve_line<C>(
        &self,
        catalog: &C,
        line: &RecipeLine,
        recipe_qty: Decimal,
        warnings: &mut Vec<ExpandWarning>,
    ) -> IngredientRequirement
    where
        C: Catalog + ?Sized,
    {
        let unconverted = IngredientRequirement {
            item: line.item.clone(),
            recipe_qty,
            recipe_uom: line.uom.clone(),
            qty: recipe_qty,
            uom: line.uom.clone(),
            amount: recipe_qty * line.rate,
            conversion_fallback: false,
            warehouse: None,
        };

        let Some(ingredient) = catalog.item(&line.item) else {
            warnings.push(ExpandWarning::UnknownIngredient {
                ingredient: line.item.clone(),
            });
            return unconverted;
        };

        if ingredient.stock_uom == line.uom {
            return unconverted;
        }

        match self.uom.convert(
            recipe_qty,
            &line.uom,
            &ingredient.stock_uom,
            Some(&ingredient.uom_conversions),
        ) {
            Ok(conversion) => IngredientRequirement {
                qty: conversion.converted_qty,
                uom: conversion.converted_uom,
                ..unconverted
            },
            Err(err) => {
                tracing::warn!(
                    ingredient = %line.item,
                    from = %err.from,
                    to = %err.to,
                    "unit conversion not found; using recipe quantity unconverted"
                );
                warnings.push(ExpandWarning::ConversionFallback {
                    ingredient: line.item.clone(),
                    from: err.from,
                    to: err.to,
                });
                IngredientRequirement {
                    conversion_fallback: true,
                    ..unconverted
                }
            }
        }
    }
}

/// Merge requirements that reference the same ingredient.
///
/// First appearance keeps its position, units and warehouse; quantities and
/// amounts are summed. An ingredient never appears twice in the output.
pub fn merge_requirements(
    requirements: impl IntoIterator<Item = IngredientRequirement>,
) -> Vec<IngredientRequirement> {
    let mut merged: Vec<IngredientRequirement> = Vec::new();
    for req in requirements {
        match merged.iter_mut().find(|m| m.item == req.item) {
            Some(existing) => {
                if existing.uom != req.uom {
                    tracing::warn!(
                        ingredient = %req.item,
                        kept = %existing.uom,
                        merged = %req.uom,
                        "merging ingredient quantities expressed in different units"
                    );
                    existing.conversion_fallback = true;
                }
                existing.recipe_qty += req.recipe_qty;
                existing.qty += req.qty;
                existing.amount += req.amount;
                existing.conversion_fallback |= req.conversion_fallback;
            }
            None => merged.push(req),
        }
    }
    merged
}

/// Raw recipe lines of an item's active default recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredients {
    pub item: ItemCode,
    pub recipe: String,
    pub output_qty: Decimal,
    pub output_uom: Uom,
    pub ingredients: Vec<RecipeLine>,
}

pub fn recipe_ingredients<C>(catalog: &C, item: &ItemCode) -> Result<RecipeIngredients, ExpandError>
where
    C: Catalog + ?Sized,
{
    let recipe = catalog
        .active_default_recipe(item)
        .ok_or_else(|| ExpandError::NoActiveRecipe(item.clone()))?;
    Ok(RecipeIngredients {
        item: item.clone(),
        recipe: recipe.name,
        output_qty: recipe.quantity,
        output_uom: recipe.uom,
        ingredients: recipe.lines,
    })
}

/// A sales item that has an active default recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemRecipe {
    pub item: ItemCode,
    pub name: String,
    pub recipe: String,
    pub output_qty: Decimal,
}

/// Sales items with an active default recipe, sorted by name.
pub fn menu_items_with_recipe<C>(catalog: &C) -> Vec<MenuItemRecipe>
where
    C: Catalog + ?Sized,
{
    let mut rows: Vec<MenuItemRecipe> = catalog
        .items()
        .into_iter()
        .filter(|i| i.is_sales_item)
        .filter_map(|i| {
            catalog.active_default_recipe(&i.code).map(|r| MenuItemRecipe {
                item: i.code,
                name: i.name,
                recipe: r.name,
                output_qty: r.quantity,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}
