//! JSON scenarios: master data, opening stock and a list of order steps.
//!
//! Steps are replayed in order through [`OrderHooks`]. A step the order
//! aggregate rejects is reported and the replay continues.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use larder_core::{Aggregate, BranchCode, CompanyCode, ItemCode, OrderId, ProfileCode, WarehouseCode};
use larder_deduction::{DeductionConfig, DeductionEngine, OrderHooks};
use larder_inventory::{ConversionEntry, InMemoryStockLedger, UomTable};
use larder_recipes::{InMemoryCatalog, Item, Recipe, RecipeExpander};
use larder_sales::{AddLine, CreateOrder, OrderCommand, OrderLine, PosOrder};

const BUNDLED: &str = include_str!("../scenarios/burger.json");

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningStock {
    pub item: ItemCode,
    pub warehouse: WarehouseCode,
    pub qty: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Create {
        order: String,
        #[serde(default)]
        profile: Option<ProfileCode>,
        #[serde(default)]
        branch: Option<BranchCode>,
        #[serde(default)]
        company: Option<CompanyCode>,
    },
    Add {
        order: String,
        item: ItemCode,
        qty: Decimal,
        #[serde(default)]
        rate: Decimal,
    },
    Submit {
        order: String,
    },
    /// Replace all lines (edit after submit).
    Edit {
        order: String,
        lines: Vec<OrderLine>,
    },
    Cancel {
        order: String,
    },
    Delete {
        order: String,
    },
    Simulate {
        order: String,
    },
    Status {
        order: String,
    },
    FoodCost {
        order: String,
    },
    ValidateStock {
        item: ItemCode,
        qty: Decimal,
        warehouse: WarehouseCode,
    },
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Step::Create { .. } => "create",
            Step::Add { .. } => "add",
            Step::Submit { .. } => "submit",
            Step::Edit { .. } => "edit",
            Step::Cancel { .. } => "cancel",
            Step::Delete { .. } => "delete",
            Step::Simulate { .. } => "simulate",
            Step::Status { .. } => "status",
            Step::FoodCost { .. } => "food_cost",
            Step::ValidateStock { .. } => "validate_stock",
        }
    }

    fn order(&self) -> Option<&str> {
        match self {
            Step::Create { order, .. }
            | Step::Add { order, .. }
            | Step::Submit { order }
            | Step::Edit { order, .. }
            | Step::Cancel { order }
            | Step::Delete { order }
            | Step::Simulate { order }
            | Step::Status { order }
            | Step::FoodCost { order } => Some(order),
            Step::ValidateStock { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: DeductionConfig,
    /// Appended to the standard conversion table.
    #[serde(default)]
    pub conversions: Vec<ConversionEntry>,
    pub items: Vec<Item>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub stock: Vec<OpeningStock>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockRow {
    pub item: ItemCode,
    pub warehouse: WarehouseCode,
    pub qty: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    /// Final order state, by scenario name.
    pub orders: BTreeMap<String, Value>,
    pub stock: Vec<StockRow>,
}

type Hooks = OrderHooks<InMemoryCatalog, Arc<InMemoryStockLedger>>;

impl Scenario {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let scenario: Self = serde_json::from_str(raw).context("invalid scenario JSON")?;
        scenario.config.validate().context("invalid deduction config")?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// The burger demo shipped with the binary.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json_str(BUNDLED)
    }

    pub fn run(self) -> anyhow::Result<Report> {
        let mut catalog = InMemoryCatalog::new();
        for item in self.items {
            let code = item.code.clone();
            catalog
                .insert_item(item)
                .with_context(|| format!("invalid item {code}"))?;
        }
        for recipe in self.recipes {
            let name = recipe.name.clone();
            catalog
                .insert_recipe(recipe)
                .with_context(|| format!("invalid recipe {name}"))?;
        }

        let ledger = Arc::new(InMemoryStockLedger::new());
        for row in &self.stock {
            ledger
                .set_on_hand(row.item.clone(), row.warehouse.clone(), row.qty)
                .with_context(|| format!("failed to set opening stock for {}", row.item))?;
        }

        let mut entries = UomTable::standard().entries().to_vec();
        entries.extend(self.conversions);
        let engine = DeductionEngine::new(self.config, catalog, ledger.clone())
            .with_expander(RecipeExpander::new(UomTable::from_entries(entries)));
        let hooks = OrderHooks::new(engine);

        let mut orders: BTreeMap<String, PosOrder> = BTreeMap::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.into_iter().enumerate() {
            let mut report = StepReport {
                step: index + 1,
                action: step.action(),
                order: step.order().map(str::to_string),
                result: None,
                error: None,
            };
            match apply(&hooks, &mut orders, step) {
                Ok(result) => report.result = result,
                Err(err) => {
                    tracing::warn!(step = report.step, action = report.action, error = %err, "step rejected");
                    report.error = Some(format!("{err:#}"));
                }
            }
            steps.push(report);
        }

        let orders = orders
            .into_iter()
            .map(|(name, order)| {
                let view = serde_json::json!({
                    "order_id": order.id_typed(),
                    "status": order.status(),
                    "lines": order.lines(),
                    "annotations": order.annotations(),
                });
                (name, view)
            })
            .collect();
        let stock = ledger
            .snapshot()
            .into_iter()
            .map(|(key, qty)| StockRow {
                item: key.item,
                warehouse: key.warehouse,
                qty,
            })
            .collect();

        Ok(Report { steps, orders, stock })
    }
}

fn apply(hooks: &Hooks, orders: &mut BTreeMap<String, PosOrder>, step: Step) -> anyhow::Result<Option<Value>> {
    let now = Utc::now();
    let value = match step {
        Step::Create {
            order,
            profile,
            branch,
            company,
        } => {
            if orders.contains_key(&order) {
                return Err(anyhow!("order {order} already exists"));
            }
            let order_id = OrderId::new();
            let mut pos = PosOrder::empty(order_id);
            pos.execute(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                profile,
                branch,
                company,
                occurred_at: now,
            }))?;
            orders.insert(order, pos);
            serde_json::json!({ "order_id": order_id })
        }
        Step::Add { order, item, qty, rate } => {
            let pos = find(orders, &order)?;
            let order_id = pos.id_typed();
            pos.execute(&OrderCommand::AddLine(AddLine {
                order_id,
                line: OrderLine::new(item, qty, rate),
                occurred_at: now,
            }))?;
            return Ok(None);
        }
        Step::Submit { order } => serde_json::to_value(hooks.on_submit(find(orders, &order)?, now)?)?,
        Step::Edit { order, lines } => {
            serde_json::to_value(hooks.on_update_after_submit(find(orders, &order)?, lines, now)?)?
        }
        Step::Cancel { order } => serde_json::to_value(hooks.on_cancel(find(orders, &order)?, now)?)?,
        Step::Delete { order } => serde_json::to_value(hooks.on_delete(find(orders, &order)?, now)?)?,
        Step::Simulate { order } => serde_json::to_value(hooks.engine().simulate(find(orders, &order)?))?,
        Step::Status { order } => {
            let order_id = find(orders, &order)?.id_typed();
            serde_json::to_value(hooks.engine().deduction_status(order_id))?
        }
        Step::FoodCost { order } => {
            serde_json::to_value(hooks.engine().order_food_cost(find(orders, &order)?))?
        }
        Step::ValidateStock { item, qty, warehouse } => {
            serde_json::to_value(hooks.engine().validate_recipe_stock(&item, qty, &warehouse)?)?
        }
    };
    Ok(Some(value))
}

fn find<'a>(orders: &'a mut BTreeMap<String, PosOrder>, name: &str) -> anyhow::Result<&'a mut PosOrder> {
    orders.get_mut(name).ok_or_else(|| anyhow!("unknown order {name}"))
}
