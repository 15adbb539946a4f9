//! Inventory deduction for POS orders.
//!
//! Binds recipe explosion and the stock ledger to the order lifecycle:
//! configuration and warehouse resolution, the deduction/restoration engine,
//! line diffs for edits, lifecycle hooks, simulation and order food cost.

pub mod analytics;
pub mod config;
pub mod diff;
pub mod engine;
pub mod hooks;
pub mod outcome;
pub mod warehouse;

pub use analytics::{LineFoodCost, OrderFoodCost, order_food_cost};
pub use config::{BranchSettings, CompanySettings, ConfigError, DeductionConfig, ProfileSettings};
pub use diff::{LineDiff, diff_lines};
pub use engine::{
    DeductionEngine, DeductionStatus, IngredientStock, MovementSummary, RecipeStockCheck,
    SimulatedIngredient, SimulatedLine, Simulation,
};
pub use hooks::OrderHooks;
pub use outcome::{
    AdjustmentOutcome, Compensation, DeductionOutcome, RestorationOutcome, SkipReason, Warning,
};
pub use warehouse::{ResolvedWarehouse, WarehouseDirectory, WarehouseSource, resolve};
