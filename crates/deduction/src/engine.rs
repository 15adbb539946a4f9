//! Recipe-driven deduction and restoration.
//!
//! - **submit**: explode every order line, merge across the order, skip
//!   ingredients that are short, post one Issue.
//! - **edit after submit**: diff per item; deduct bucket becomes one Issue,
//!   restore bucket one Receipt.
//! - **cancel / delete**: reverse every live movement of the order, each in
//!   isolation (native cancel, or a compensating movement when the ledger no
//!   longer allows cancelling it).
//!
//! The ledger's movements for an order are the only record of what was
//! deducted; the engine keeps no state of its own.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{ItemCode, MovementId, OrderId, Uom, WarehouseCode};
use larder_inventory::{
    Availability, LedgerError, MovementKind, MovementLine, MovementPurpose, MovementStatus,
    NewMovement, StockLedger, StockMovement, check,
};
use larder_recipes::{
    Catalog, ExpandError, ExpandWarning, IngredientRequirement, RecipeExpander, merge_requirements,
    round_money,
};
use larder_sales::PosOrder;

use crate::analytics::{OrderFoodCost, order_food_cost};
use crate::config::DeductionConfig;
use crate::diff::diff_lines;
use crate::outcome::{
    AdjustmentOutcome, Compensation, DeductionOutcome, RestorationOutcome, SkipReason, Warning,
};
use crate::warehouse::{ResolvedWarehouse, resolve};

/// Ingredient requirement joined with its availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedIngredient {
    pub requirement: IngredientRequirement,
    /// `None` when no warehouse could be resolved.
    pub availability: Option<Availability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedLine {
    pub item: ItemCode,
    pub qty: Decimal,
    pub recipe: Option<String>,
    pub ingredients: Vec<SimulatedIngredient>,
}

/// Dry run of a submit: nothing is written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub order: OrderId,
    /// Whether a real submit would deduct at all.
    pub enabled: bool,
    pub warehouse: Option<ResolvedWarehouse>,
    pub lines: Vec<SimulatedLine>,
    pub all_sufficient: bool,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientStock {
    pub item: ItemCode,
    pub recipe_qty: Decimal,
    pub recipe_uom: Uom,
    pub required: Decimal,
    pub stock_uom: Uom,
    pub available: Decimal,
    pub sufficient: bool,
    pub shortage: Decimal,
    pub conversion_fallback: bool,
}

/// Can `qty` of an item be produced from stock in `warehouse`?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStockCheck {
    pub item: ItemCode,
    pub qty: Decimal,
    pub warehouse: WarehouseCode,
    pub recipe: String,
    pub ingredients: Vec<IngredientStock>,
    pub all_sufficient: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSummary {
    pub id: MovementId,
    pub kind: MovementKind,
    pub purpose: MovementPurpose,
    pub status: MovementStatus,
    pub warehouse: WarehouseCode,
    pub reverses: Option<MovementId>,
    pub lines: usize,
    pub total_amount: Decimal,
}

impl From<&StockMovement> for MovementSummary {
    fn from(m: &StockMovement) -> Self {
        Self {
            id: m.id_typed(),
            kind: m.kind(),
            purpose: m.purpose(),
            status: m.status(),
            warehouse: m.warehouse().clone(),
            reverses: m.reverses(),
            lines: m.lines().len(),
            total_amount: m.total_amount(),
        }
    }
}

/// What the ledger says about an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionStatus {
    pub order: OrderId,
    pub movements: Vec<MovementSummary>,
    /// Live Issues not yet reversed.
    pub active_issues: Vec<MovementId>,
    /// Net quantity taken out of stock per ingredient (Issues minus Receipts).
    pub net_issued: BTreeMap<ItemCode, Decimal>,
    pub is_deducted: bool,
}

pub struct DeductionEngine<C, L> {
    config: DeductionConfig,
    catalog: C,
    ledger: L,
    expander: RecipeExpander,
}

impl<C, L> DeductionEngine<C, L>
where
    C: Catalog,
    L: StockLedger,
{
    pub fn new(config: DeductionConfig, catalog: C, ledger: L) -> Self {
        Self {
            config,
            catalog,
            ledger,
            expander: RecipeExpander::default(),
        }
    }

    pub fn with_expander(mut self, expander: RecipeExpander) -> Self {
        self.expander = expander;
        self
    }

    pub fn config(&self) -> &DeductionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn expander(&self) -> &RecipeExpander {
        &self.expander
    }

    pub fn is_enabled(&self, order: &PosOrder) -> bool {
        self.config.deduction_enabled(order.profile())
    }

    pub fn resolve_warehouse(&self, order: &PosOrder) -> Option<ResolvedWarehouse> {
        resolve(&self.config, order.profile(), order.branch(), order.company())
    }

    /// Submit: one Issue for the whole order.
    pub fn deduct(&self, order: &PosOrder) -> DeductionOutcome {
        let order_id = order.id_typed();
        let mut outcome = DeductionOutcome::new(order_id);

        if !self.is_enabled(order) {
            tracing::debug!(order_id = %order_id, "inventory deduction disabled for profile");
            return outcome.skip(SkipReason::Disabled);
        }

        if let Some(existing) = self.live_movements(order_id).into_iter().find(|m| {
            m.purpose() == MovementPurpose::Deduction && m.kind() == MovementKind::Issue
        }) {
            record(order_id, &mut outcome.warnings, Warning::AlreadyDeducted {
                movement: existing.id_typed(),
            });
            return outcome.skip(SkipReason::AlreadyDeducted);
        }

        let Some(resolved) = self.resolve_warehouse(order) else {
            record(order_id, &mut outcome.warnings, Warning::NoWarehouse);
            return outcome.skip(SkipReason::NoWarehouse);
        };
        let warehouse = resolved.warehouse.clone();
        outcome.warehouse = Some(resolved);

        let requirements = self.requirements_for(order_id, order.quantities_by_item(), &mut outcome.warnings);
        match self.post_issue(
            order_id,
            &warehouse,
            MovementPurpose::Deduction,
            &requirements,
            &mut outcome.warnings,
        ) {
            Some((id, lines)) => {
                outcome.food_cost = food_cost(&lines);
                outcome.movement = Some(id);
                outcome.lines = lines;
                tracing::info!(
                    order_id = %order_id,
                    movement_id = %id,
                    warehouse = %warehouse,
                    lines = outcome.lines.len(),
                    food_cost = %outcome.food_cost,
                    "ingredients deducted"
                );
                outcome
            }
            None => outcome.skip(SkipReason::NothingToPost),
        }
    }

    /// Edit after submit: post the net difference between two versions.
    pub fn adjust(&self, original: &PosOrder, updated: &PosOrder) -> AdjustmentOutcome {
        let order_id = updated.id_typed();
        let mut outcome = AdjustmentOutcome::new(order_id);

        if !self.is_enabled(updated) {
            tracing::debug!(order_id = %order_id, "inventory deduction disabled for profile");
            return outcome.skip(SkipReason::Disabled);
        }

        let diff = diff_lines(&original.quantities_by_item(), &updated.quantities_by_item());
        if diff.is_empty() {
            return outcome.skip(SkipReason::NoChanges);
        }

        let Some(resolved) = self.resolve_warehouse(updated) else {
            record(order_id, &mut outcome.warnings, Warning::NoWarehouse);
            return outcome.skip(SkipReason::NoWarehouse);
        };
        let warehouse = resolved.warehouse.clone();
        outcome.warehouse = Some(resolved);

        // Taken before anything is posted, so this edit's own Issue does not
        // count towards what may be given back.
        let issued = self.net_issued(order_id, Some(&warehouse));

        let restore = self.requirements_for(order_id, diff.restore, &mut outcome.warnings);
        let restore_lines = cap_to_issued(&restore, &issued);
        if !restore_lines.is_empty() {
            let posted = self.create_with_warning(
                order_id,
                NewMovement {
                    kind: MovementKind::Receipt,
                    purpose: MovementPurpose::Adjustment,
                    warehouse: warehouse.clone(),
                    lines: restore_lines.clone(),
                    correlation: Some(order_id),
                    reverses: None,
                },
                &mut outcome.warnings,
            );
            if let Some(id) = posted {
                outcome.receipt = Some(id);
                outcome.restored = restore_lines;
            }
        }

        let deduct = self.requirements_for(order_id, diff.deduct, &mut outcome.warnings);
        if let Some((id, lines)) = self.post_issue(
            order_id,
            &warehouse,
            MovementPurpose::Adjustment,
            &deduct,
            &mut outcome.warnings,
        ) {
            outcome.food_cost = food_cost(&lines);
            outcome.issue = Some(id);
            outcome.deducted = lines;
        }

        if outcome.issue.is_none() && outcome.receipt.is_none() {
            return outcome.skip(SkipReason::NothingToPost);
        }

        tracing::info!(
            order_id = %order_id,
            issue = ?outcome.issue,
            receipt = ?outcome.receipt,
            deducted = outcome.deducted.len(),
            restored = outcome.restored.len(),
            "inventory adjusted after edit"
        );
        outcome
    }

    /// Cancel/delete: reverse every live deduction and adjustment.
    pub fn restore(&self, order: &PosOrder) -> RestorationOutcome {
        let order_id = order.id_typed();
        let mut outcome = RestorationOutcome::new(order_id);

        if !self.is_enabled(order) {
            tracing::debug!(order_id = %order_id, "inventory deduction disabled for profile");
            return outcome.skip(SkipReason::Disabled);
        }

        let mut targets: Vec<StockMovement> = self
            .live_movements(order_id)
            .into_iter()
            .filter(|m| m.purpose() != MovementPurpose::Reversal)
            .collect();
        // Give stock back before taking any out again.
        targets.sort_by_key(|m| match m.kind() {
            MovementKind::Issue => 0,
            MovementKind::Receipt => 1,
        });

        if targets.is_empty() {
            return outcome.skip(SkipReason::NothingToPost);
        }

        for movement in targets {
            self.reverse(order_id, &movement, &mut outcome);
        }

        tracing::info!(
            order_id = %order_id,
            cancelled = outcome.cancelled.len(),
            compensated = outcome.compensations.len(),
            failures = outcome.warnings.len(),
            "inventory restored"
        );
        outcome
    }

    /// Dry-run of [`Self::deduct`], per order line.
    pub fn simulate(&self, order: &PosOrder) -> Simulation {
        let order_id = order.id_typed();
        let mut warnings = Vec::new();
        let warehouse = self.resolve_warehouse(order);
        if warehouse.is_none() {
            warnings.push(Warning::NoWarehouse);
        }

        let lines = order
            .lines()
            .iter()
            .map(|line| {
                let mut simulated = SimulatedLine {
                    item: line.item.clone(),
                    qty: line.qty,
                    recipe: None,
                    ingredients: Vec::new(),
                };
                match self.expander.expand(&self.catalog, &line.item, line.qty) {
                    Ok(expansion) => {
                        warnings.extend(expansion.warnings.iter().map(expand_warning));
                        simulated.recipe = Some(expansion.recipe);
                        simulated.ingredients = expansion
                            .requirements
                            .into_iter()
                            .map(|requirement| SimulatedIngredient {
                                availability: warehouse.as_ref().map(|w| {
                                    check(&self.ledger, &requirement.item, &w.warehouse, requirement.qty)
                                }),
                                requirement,
                            })
                            .collect();
                    }
                    Err(err) => warnings.push(expand_error(&line.item, err)),
                }
                simulated
            })
            .collect::<Vec<_>>();

        let all_sufficient = warehouse.is_some()
            && lines
                .iter()
                .flat_map(|l| &l.ingredients)
                .all(|i| i.availability.as_ref().is_some_and(|a| a.sufficient));

        tracing::debug!(order_id = %order_id, lines = lines.len(), all_sufficient, "deduction simulated");
        Simulation {
            order: order_id,
            enabled: self.is_enabled(order),
            warehouse,
            lines,
            all_sufficient,
            warnings,
        }
    }

    pub fn validate_recipe_stock(
        &self,
        item: &ItemCode,
        qty: Decimal,
        warehouse: &WarehouseCode,
    ) -> Result<RecipeStockCheck, ExpandError> {
        let expansion = self.expander.expand(&self.catalog, item, qty)?;

        let ingredients: Vec<IngredientStock> = expansion
            .requirements
            .into_iter()
            .map(|req| {
                let availability = check(&self.ledger, &req.item, warehouse, req.qty);
                IngredientStock {
                    item: req.item,
                    recipe_qty: req.recipe_qty,
                    recipe_uom: req.recipe_uom,
                    required: req.qty,
                    stock_uom: req.uom,
                    available: availability.available,
                    sufficient: availability.sufficient,
                    shortage: availability.shortage,
                    conversion_fallback: req.conversion_fallback,
                }
            })
            .collect();

        Ok(RecipeStockCheck {
            item: item.clone(),
            qty,
            warehouse: warehouse.clone(),
            recipe: expansion.recipe,
            all_sufficient: ingredients.iter().all(|i| i.sufficient),
            ingredients,
        })
    }

    pub fn deduction_status(&self, order: OrderId) -> DeductionStatus {
        let movements = self.ledger.movements_for(order);
        let active_issues: Vec<MovementId> = self
            .live_movements(order)
            .iter()
            .filter(|m| m.kind() == MovementKind::Issue && m.purpose() != MovementPurpose::Reversal)
            .map(|m| m.id_typed())
            .collect();

        DeductionStatus {
            order,
            movements: movements.iter().map(MovementSummary::from).collect(),
            is_deducted: !active_issues.is_empty(),
            active_issues,
            net_issued: self.net_issued(order, None),
        }
    }

    pub fn order_food_cost(&self, order: &PosOrder) -> OrderFoodCost {
        order_food_cost(&self.expander, &self.catalog, order)
    }

    /// Movements in force and not yet offset by a compensating movement.
    fn live_movements(&self, order: OrderId) -> Vec<StockMovement> {
        let movements = self.ledger.movements_for(order);
        let compensated: BTreeSet<MovementId> = movements
            .iter()
            .filter(|m| m.is_committed())
            .filter_map(|m| m.reverses())
            .collect();

        movements
            .into_iter()
            .filter(|m| m.is_committed() && !compensated.contains(&m.id_typed()))
            .collect()
    }

    fn net_issued(&self, order: OrderId, warehouse: Option<&WarehouseCode>) -> BTreeMap<ItemCode, Decimal> {
        let mut net = BTreeMap::new();
        for movement in self.ledger.movements_for(order) {
            if !movement.is_committed() || warehouse.is_some_and(|w| w != movement.warehouse()) {
                continue;
            }
            let sign = -movement.kind().sign();
            for line in movement.lines() {
                *net.entry(line.item.clone()).or_insert(Decimal::ZERO) += line.qty * sign;
            }
        }
        net
    }

    fn requirements_for(
        &self,
        order: OrderId,
        quantities: impl IntoIterator<Item = (ItemCode, Decimal)>,
        warnings: &mut Vec<Warning>,
    ) -> Vec<IngredientRequirement> {
        let mut requirements = Vec::new();
        for (item, qty) in quantities {
            match self.expander.expand(&self.catalog, &item, qty) {
                Ok(expansion) => {
                    for warning in &expansion.warnings {
                        record(order, warnings, expand_warning(warning));
                    }
                    requirements.extend(expansion.requirements);
                }
                Err(err) => record(order, warnings, expand_error(&item, err)),
            }
        }
        merge_requirements(requirements)
    }

    /// Issue what is available; retry once without lines the ledger rejects.
    fn post_issue(
        &self,
        order: OrderId,
        warehouse: &WarehouseCode,
        purpose: MovementPurpose,
        requirements: &[IngredientRequirement],
        warnings: &mut Vec<Warning>,
    ) -> Option<(MovementId, Vec<MovementLine>)> {
        let candidates: Vec<MovementLine> = requirements
            .iter()
            .filter(|req| self.is_stocked(&req.item))
            .map(|req| MovementLine::new(req.item.clone(), req.qty, req.uom.clone(), req.amount))
            .collect();

        let lines = self.available_lines(order, warehouse, candidates, warnings);
        if lines.is_empty() {
            return None;
        }

        let movement = |lines: Vec<MovementLine>| NewMovement {
            kind: MovementKind::Issue,
            purpose,
            warehouse: warehouse.clone(),
            lines,
            correlation: Some(order),
            reverses: None,
        };

        match self.ledger.create_movement(movement(lines.clone())) {
            Ok(id) => Some((id, lines)),
            Err(LedgerError::InsufficientStock { item, .. }) => {
                tracing::warn!(
                    order_id = %order,
                    item = %item,
                    "stock changed since the availability check; retrying without short lines"
                );
                let retry = self.available_lines(order, warehouse, lines, warnings);
                if retry.is_empty() {
                    return None;
                }
                self.create_with_warning(order, movement(retry.clone()), warnings)
                    .map(|id| (id, retry))
            }
            Err(err) => {
                record(order, warnings, Warning::MovementCreationFailed {
                    movement_kind: MovementKind::Issue,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn available_lines(
        &self,
        order: OrderId,
        warehouse: &WarehouseCode,
        lines: Vec<MovementLine>,
        warnings: &mut Vec<Warning>,
    ) -> Vec<MovementLine> {
        lines
            .into_iter()
            .filter(|line| {
                let availability = check(&self.ledger, &line.item, warehouse, line.qty);
                if !availability.sufficient {
                    record(order, warnings, Warning::InsufficientStock {
                        ingredient: line.item.clone(),
                        warehouse: warehouse.clone(),
                        required: availability.required,
                        available: availability.available,
                        shortage: availability.shortage,
                    });
                }
                availability.sufficient
            })
            .collect()
    }

    /// Non-stock ingredients are never moved. Unknown ones are attempted.
    fn is_stocked(&self, item: &ItemCode) -> bool {
        self.catalog.item(item).map(|i| i.is_stock_item).unwrap_or(true)
    }

    fn create_with_warning(
        &self,
        order: OrderId,
        movement: NewMovement,
        warnings: &mut Vec<Warning>,
    ) -> Option<MovementId> {
        let kind = movement.kind;
        match self.ledger.create_movement(movement) {
            Ok(id) => Some(id),
            Err(err) => {
                record(order, warnings, Warning::MovementCreationFailed {
                    movement_kind: kind,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn reverse(&self, order: OrderId, movement: &StockMovement, outcome: &mut RestorationOutcome) {
        let id = movement.id_typed();

        if movement.status() == MovementStatus::Committed {
            match self.ledger.cancel_movement(id) {
                Ok(()) => {
                    outcome.cancelled.push(id);
                    return;
                }
                // Amended after we read it; fall through to compensation.
                Err(LedgerError::Rejected(_))
                    if self
                        .ledger
                        .movement(id)
                        .is_some_and(|m| m.status() == MovementStatus::Amended) => {}
                Err(err) => {
                    record(order, &mut outcome.warnings, Warning::MovementReversalFailed {
                        movement: id,
                        reason: err.to_string(),
                    });
                    return;
                }
            }
        }

        let compensation = NewMovement {
            kind: movement.kind().opposite(),
            purpose: MovementPurpose::Reversal,
            warehouse: movement.warehouse().clone(),
            lines: movement.lines().to_vec(),
            correlation: Some(order),
            reverses: Some(id),
        };
        match self.ledger.create_movement(compensation) {
            Ok(compensating) => outcome.compensations.push(Compensation {
                reversed: id,
                movement: compensating,
            }),
            Err(err) => record(order, &mut outcome.warnings, Warning::MovementReversalFailed {
                movement: id,
                reason: err.to_string(),
            }),
        }
    }
}

fn record(order: OrderId, warnings: &mut Vec<Warning>, warning: Warning) {
    warning.log(order);
    warnings.push(warning);
}

fn expand_warning(warning: &ExpandWarning) -> Warning {
    match warning {
        ExpandWarning::ConversionFallback { ingredient, from, to } => Warning::ConversionFallback {
            ingredient: ingredient.clone(),
            from: from.clone(),
            to: to.clone(),
        },
        ExpandWarning::UnknownIngredient { ingredient } => Warning::UnknownIngredient {
            ingredient: ingredient.clone(),
        },
    }
}

fn expand_error(item: &ItemCode, err: ExpandError) -> Warning {
    match err {
        ExpandError::NoActiveRecipe(item) => Warning::NoActiveRecipe { item },
        ExpandError::InvalidRecipe { item, reason } => Warning::InvalidRecipe {
            item,
            reason: reason.to_string(),
        },
        // Order lines and diffs only carry positive quantities.
        err @ ExpandError::InvalidQuantity(_) => Warning::InvalidRecipe {
            item: item.clone(),
            reason: err.to_string(),
        },
    }
}

/// Restore lines limited to what the order actually took out.
fn cap_to_issued(
    requirements: &[IngredientRequirement],
    issued: &BTreeMap<ItemCode, Decimal>,
) -> Vec<MovementLine> {
    requirements
        .iter()
        .filter_map(|req| {
            let available = issued.get(&req.item).copied().unwrap_or(Decimal::ZERO);
            let qty = req.qty.min(available);
            if qty <= Decimal::ZERO {
                tracing::debug!(ingredient = %req.item, "nothing issued to restore");
                return None;
            }
            let amount = if qty == req.qty {
                req.amount
            } else {
                req.amount * qty / req.qty
            };
            Some(MovementLine::new(req.item.clone(), qty, req.uom.clone(), amount))
        })
        .collect()
}

fn food_cost(lines: &[MovementLine]) -> Decimal {
    round_money(lines.iter().map(|l| l.amount).sum())
}
