use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, ItemCode, Uom};

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub item: ItemCode,
    pub qty: Decimal,
    pub uom: Uom,
    /// Cost per `uom`.
    #[serde(default)]
    pub rate: Decimal,
}

impl RecipeLine {
    pub fn new(item: impl Into<ItemCode>, qty: Decimal, uom: impl Into<Uom>) -> Self {
        Self {
            item: item.into(),
            qty,
            uom: uom.into(),
            rate: Decimal::ZERO,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }
}

/// Bill of materials for one item, yielding `quantity` of `uom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub item: ItemCode,
    pub quantity: Decimal,
    pub uom: Uom,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_default: bool,
    pub lines: Vec<RecipeLine>,
}

fn default_true() -> bool {
    true
}

impl Recipe {
    /// An active, default recipe with no lines yet.
    pub fn new(
        name: impl Into<String>,
        item: impl Into<ItemCode>,
        quantity: Decimal,
        uom: impl Into<Uom>,
    ) -> Self {
        Self {
            name: name.into(),
            item: item.into(),
            quantity,
            uom: uom.into(),
            is_active: true,
            is_default: true,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: RecipeLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn is_active_default(&self) -> bool {
        self.is_active && self.is_default
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("recipe name cannot be empty"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "recipe {} must yield a positive quantity",
                self.name
            )));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(format!("recipe {} has no lines", self.name)));
        }
        for line in &self.lines {
            if line.qty <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "recipe {}: quantity of {} must be positive",
                    self.name, line.item
                )));
            }
            if line.rate < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "recipe {}: rate of {} cannot be negative",
                    self.name, line.item
                )));
            }
            if line.item == self.item {
                return Err(DomainError::invariant(format!(
                    "recipe {} consumes its own output",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
