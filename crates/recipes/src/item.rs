use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, ItemCode, Uom};
use larder_inventory::UomOverrides;

/// Catalog item: either a sellable menu item or a raw ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub code: ItemCode,
    pub name: String,
    #[serde(default)]
    pub is_sales_item: bool,
    /// Non-stock items (most menu items) never appear on movements.
    #[serde(default = "default_true")]
    pub is_stock_item: bool,
    pub stock_uom: Uom,
    /// Factors from the stock unit to alternative units.
    #[serde(default)]
    pub uom_conversions: UomOverrides,
    /// Selling price per unit, for menu items.
    #[serde(default)]
    pub selling_price: Option<Decimal>,
}

fn default_true() -> bool {
    true
}

impl Item {
    /// A sellable, non-stock menu item counted in `Nos`.
    pub fn menu_item(code: impl Into<ItemCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            is_sales_item: true,
            is_stock_item: false,
            stock_uom: Uom::new("Nos"),
            uom_conversions: UomOverrides::new(),
            selling_price: None,
        }
    }

    /// A stocked raw ingredient.
    pub fn ingredient(
        code: impl Into<ItemCode>,
        name: impl Into<String>,
        stock_uom: impl Into<Uom>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            is_sales_item: false,
            is_stock_item: true,
            stock_uom: stock_uom.into(),
            uom_conversions: UomOverrides::new(),
            selling_price: None,
        }
    }

    pub fn with_selling_price(mut self, price: Decimal) -> Self {
        self.selling_price = Some(price);
        self
    }

    pub fn with_conversion(mut self, uom: impl Into<Uom>, factor: Decimal) -> Self {
        self.uom_conversions = self.uom_conversions.with(uom, factor);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.code.is_blank() {
            return Err(DomainError::validation("item code cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(format!("item {} has no name", self.code)));
        }
        if self.stock_uom.is_blank() {
            return Err(DomainError::validation(format!("item {} has no stock unit", self.code)));
        }
        if matches!(self.selling_price, Some(p) if p < Decimal::ZERO) {
            return Err(DomainError::validation(format!(
                "item {} has a negative selling price",
                self.code
            )));
        }
        Ok(())
    }
}
