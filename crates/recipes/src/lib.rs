//! Recipes domain module.
//!
//! Catalog model (items and recipes), the catalog lookup seam, recipe
//! explosion into ingredient requirements and food-cost calculation. Pure
//! logic: no IO and no stock access.

pub mod catalog;
pub mod costing;
pub mod expand;
pub mod item;
pub mod recipe;

pub use catalog::{Catalog, InMemoryCatalog};
pub use costing::{FoodCost, IngredientCost, food_cost, percentage, round_money};
pub use expand::{
    ExpandError, ExpandWarning, Expansion, IngredientRequirement, MenuItemRecipe, RecipeExpander,
    RecipeIngredients, merge_requirements, menu_items_with_recipe, recipe_ingredients,
};
pub use item::Item;
pub use recipe::{Recipe, RecipeLine};
