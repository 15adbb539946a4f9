//! Catalog lookup seam (items and recipes are owned by the catalog system).

use std::collections::BTreeMap;
use std::sync::Arc;

use larder_core::{DomainResult, ItemCode, Uom};

use crate::item::Item;
use crate::recipe::Recipe;

/// Read-only catalog access.
pub trait Catalog: Send + Sync {
    fn item(&self, code: &ItemCode) -> Option<Item>;

    /// The single active+default recipe for `code`, if any.
    ///
    /// At most one such recipe is assumed to exist; when several do, the first
    /// registered one is returned.
    fn active_default_recipe(&self, code: &ItemCode) -> Option<Recipe>;

    fn items(&self) -> Vec<Item>;

    fn stock_unit(&self, code: &ItemCode) -> Option<Uom> {
        self.item(code).map(|i| i.stock_uom)
    }
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn item(&self, code: &ItemCode) -> Option<Item> {
        (**self).item(code)
    }

    fn active_default_recipe(&self, code: &ItemCode) -> Option<Recipe> {
        (**self).active_default_recipe(code)
    }

    fn items(&self) -> Vec<Item> {
        (**self).items()
    }
}

/// In-memory catalog for tests, simulations and the CLI.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: BTreeMap<ItemCode, Item>,
    recipes: Vec<Recipe>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn insert_item(&mut self, item: Item) -> DomainResult<()> {
        item.validate()?;
        self.items.insert(item.code.clone(), item);
        Ok(())
    }

    pub fn insert_recipe(&mut self, recipe: Recipe) -> DomainResult<()> {
        recipe.validate()?;
        self.recipes.push(recipe);
        Ok(())
    }

    pub fn with_item(mut self, item: Item) -> DomainResult<Self> {
        self.insert_item(item)?;
        Ok(self)
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> DomainResult<Self> {
        self.insert_recipe(recipe)?;
        Ok(self)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }
}

impl Catalog for InMemoryCatalog {
    fn item(&self, code: &ItemCode) -> Option<Item> {
        self.items.get(code).cloned()
    }

    fn active_default_recipe(&self, code: &ItemCode) -> Option<Recipe> {
        self.recipes
            .iter()
            .find(|r| &r.item == code && r.is_active_default())
            .cloned()
    }

    fn items(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }
}
