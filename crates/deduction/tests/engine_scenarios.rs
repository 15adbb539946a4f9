use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use larder_core::{Aggregate, ItemCode, MovementId, OrderId, ProfileCode, WarehouseCode};
use larder_deduction::{
    CompanySettings, DeductionConfig, DeductionEngine, OrderHooks, ProfileSettings, SkipReason,
    Warning,
};
use larder_inventory::{
    InMemoryStockLedger, LedgerError, MovementKind, MovementLine, MovementPurpose, MovementStatus,
    NewMovement, StockLedger, StockMovement, StockReader,
};
use larder_recipes::{InMemoryCatalog, Item, Recipe, RecipeLine};
use larder_sales::{
    AddLine, CreateOrder, OrderCommand, OrderLine, OrderStatus, PosOrder, ReplaceLines,
};

const KITCHEN: &str = "Kitchen Stores";

type Hooks = OrderHooks<Arc<InMemoryCatalog>, Arc<InMemoryStockLedger>>;

struct Kitchen {
    hooks: Hooks,
    ledger: Arc<InMemoryStockLedger>,
}

impl Kitchen {
    fn engine(&self) -> &DeductionEngine<Arc<InMemoryCatalog>, Arc<InMemoryStockLedger>> {
        self.hooks.engine()
    }

    fn on_hand(&self, item: &str) -> Decimal {
        self.ledger
            .on_hand(&ItemCode::new(item), &WarehouseCode::new(KITCHEN))
    }

    fn submit(&self, lines: &[(&str, Decimal)]) -> PosOrder {
        let mut order = draft("POS-MAIN", lines);
        self.hooks.on_submit(&mut order, Utc::now()).unwrap();
        order
    }
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_item(Item::menu_item("BURGER", "Burger").with_selling_price(dec!(250)))
        .unwrap()
        .with_item(Item::menu_item("WRAP", "Chicken Wrap").with_selling_price(dec!(180)))
        .unwrap()
        .with_item(Item::menu_item("WATER", "Bottled Water").with_selling_price(dec!(20)))
        .unwrap()
        .with_item(Item::ingredient("CHICKEN-BREAST", "Chicken Breast", "Gram"))
        .unwrap()
        .with_item(Item::ingredient("BUN", "Burger Bun", "Nos"))
        .unwrap()
        .with_item(Item::ingredient("OIL", "Cooking Oil", "ml"))
        .unwrap()
        .with_item(Item::ingredient("TORTILLA", "Tortilla", "Nos"))
        .unwrap()
        .with_recipe(
            Recipe::new("BOM-BURGER-001", "BURGER", dec!(1), "Nos")
                .with_line(RecipeLine::new("CHICKEN-BREAST", dec!(150), "Gram").with_rate(dec!(0.4)))
                .with_line(RecipeLine::new("BUN", dec!(1), "Nos").with_rate(dec!(12)))
                .with_line(RecipeLine::new("OIL", dec!(10), "ml").with_rate(dec!(0.2))),
        )
        .unwrap()
        .with_recipe(
            Recipe::new("BOM-WRAP-001", "WRAP", dec!(1), "Nos")
                .with_line(RecipeLine::new("CHICKEN-BREAST", dec!(100), "Gram").with_rate(dec!(0.4)))
                .with_line(RecipeLine::new("TORTILLA", dec!(1), "Nos").with_rate(dec!(8))),
        )
        .unwrap()
}

fn config() -> DeductionConfig {
    DeductionConfig::new()
        .with_company(CompanySettings::new("ACME", "Main Stores"))
        .with_profile(ProfileSettings::new("POS-MAIN").enabled().with_warehouse(KITCHEN))
        .with_profile(ProfileSettings::new("POS-OFF").with_warehouse(KITCHEN))
        .with_profile(ProfileSettings::new("POS-NOWHERE").enabled())
}

fn kitchen(stock: &[(&str, Decimal)]) -> Kitchen {
    let ledger = Arc::new(InMemoryStockLedger::new());
    for (item, qty) in stock {
        ledger.set_on_hand(*item, KITCHEN, *qty).unwrap();
    }
    let engine = DeductionEngine::new(config(), Arc::new(catalog()), ledger.clone());
    Kitchen {
        hooks: OrderHooks::new(engine),
        ledger,
    }
}

fn well_stocked() -> Kitchen {
    kitchen(&[
        ("CHICKEN-BREAST", dec!(5000)),
        ("BUN", dec!(50)),
        ("OIL", dec!(1000)),
        ("TORTILLA", dec!(40)),
    ])
}

fn draft(profile: &str, lines: &[(&str, Decimal)]) -> PosOrder {
    let order_id = OrderId::new();
    let mut order = PosOrder::empty(order_id);
    order
        .execute(&OrderCommand::CreateOrder(CreateOrder {
            order_id,
            profile: Some(ProfileCode::new(profile)),
            branch: None,
            company: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();
    for (item, qty) in lines {
        order
            .execute(&OrderCommand::AddLine(AddLine {
                order_id,
                line: OrderLine::new(*item, *qty, dec!(100)),
                occurred_at: Utc::now(),
            }))
            .unwrap();
    }
    order
}

fn lines(entries: &[(&str, Decimal)]) -> Vec<OrderLine> {
    entries
        .iter()
        .map(|(item, qty)| OrderLine::new(*item, *qty, dec!(100)))
        .collect()
}

fn qty(lines: &[MovementLine], item: &str) -> Option<Decimal> {
    lines.iter().find(|l| l.item.as_str() == item).map(|l| l.qty)
}

#[test]
fn burger_submit_posts_one_issue_for_the_order() {
    let kitchen = well_stocked();
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(3))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    let movement_id = outcome.movement.expect("issue posted");
    assert_eq!(outcome.lines.len(), 3);
    assert_eq!(qty(&outcome.lines, "CHICKEN-BREAST"), Some(dec!(450)));
    assert_eq!(qty(&outcome.lines, "BUN"), Some(dec!(3)));
    assert_eq!(qty(&outcome.lines, "OIL"), Some(dec!(30)));
    assert_eq!(outcome.food_cost, dec!(222.00));
    assert!(outcome.warnings.is_empty());

    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(4550));
    assert_eq!(kitchen.on_hand("BUN"), dec!(47));
    assert_eq!(kitchen.on_hand("OIL"), dec!(970));

    let movements = kitchen.ledger.movements_for(order.id_typed());
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind(), MovementKind::Issue);
    assert_eq!(movements[0].purpose(), MovementPurpose::Deduction);

    assert_eq!(order.status(), OrderStatus::Submitted);
    let note = &order.annotations()[0].note;
    assert!(note.contains(&movement_id.to_string()));
    assert!(note.contains("Food cost: 222.00"));
}

#[test]
fn short_ingredient_is_skipped_and_the_rest_deducted() {
    let kitchen = kitchen(&[
        ("CHICKEN-BREAST", dec!(200)),
        ("BUN", dec!(50)),
        ("OIL", dec!(1000)),
    ]);
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(3))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    assert!(outcome.movement.is_some());
    assert_eq!(outcome.lines.len(), 2);
    assert_eq!(qty(&outcome.lines, "CHICKEN-BREAST"), None);
    assert_eq!(qty(&outcome.lines, "BUN"), Some(dec!(3)));
    assert_eq!(qty(&outcome.lines, "OIL"), Some(dec!(30)));

    assert_eq!(
        outcome.warnings,
        vec![Warning::InsufficientStock {
            ingredient: ItemCode::new("CHICKEN-BREAST"),
            warehouse: WarehouseCode::new(KITCHEN),
            required: dec!(450),
            available: dec!(200),
            shortage: dec!(250),
        }]
    );
    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(200));
    assert!(order
        .annotations()
        .iter()
        .any(|a| a.note.starts_with("Inventory warning: insufficient stock for CHICKEN-BREAST")));
}

#[test]
fn reducing_a_line_posts_a_receipt_for_the_difference() {
    let kitchen = well_stocked();
    let mut order = kitchen.submit(&[("BURGER", dec!(2))]);

    let outcome = kitchen
        .hooks
        .on_update_after_submit(&mut order, lines(&[("BURGER", dec!(1))]), Utc::now())
        .unwrap();

    assert!(outcome.issue.is_none());
    let receipt = outcome.receipt.expect("receipt posted");
    assert_eq!(qty(&outcome.restored, "CHICKEN-BREAST"), Some(dec!(150)));
    assert_eq!(qty(&outcome.restored, "BUN"), Some(dec!(1)));
    assert_eq!(qty(&outcome.restored, "OIL"), Some(dec!(10)));

    let movement = kitchen.ledger.movement(receipt).unwrap();
    assert_eq!(movement.kind(), MovementKind::Receipt);
    assert_eq!(movement.purpose(), MovementPurpose::Adjustment);

    // Net effect equals selling one burger.
    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(4850));
    assert_eq!(kitchen.on_hand("BUN"), dec!(49));
    assert_eq!(kitchen.on_hand("OIL"), dec!(990));
}

#[test]
fn swapping_items_issues_and_receives_in_one_edit() {
    let kitchen = well_stocked();
    let mut order = kitchen.submit(&[("BURGER", dec!(1))]);

    let outcome = kitchen
        .hooks
        .on_update_after_submit(&mut order, lines(&[("WRAP", dec!(2))]), Utc::now())
        .unwrap();

    assert!(outcome.receipt.is_some());
    assert!(outcome.issue.is_some());
    assert_eq!(qty(&outcome.deducted, "CHICKEN-BREAST"), Some(dec!(200)));
    assert_eq!(qty(&outcome.deducted, "TORTILLA"), Some(dec!(2)));
    assert_eq!(outcome.food_cost, dec!(96.00));

    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(4800));
    assert_eq!(kitchen.on_hand("BUN"), dec!(50));
    assert_eq!(kitchen.on_hand("TORTILLA"), dec!(38));
}

#[test]
fn regrouping_lines_without_net_change_posts_nothing() {
    let kitchen = well_stocked();
    let mut order = kitchen.submit(&[("BURGER", dec!(2)), ("WRAP", dec!(1))]);
    let before = kitchen.ledger.snapshot();

    // Burger removed and re-added as two separate lines of one each.
    let outcome = kitchen
        .hooks
        .on_update_after_submit(
            &mut order,
            lines(&[("WRAP", dec!(1)), ("BURGER", dec!(1)), ("BURGER", dec!(1))]),
            Utc::now(),
        )
        .unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::NoChanges));
    assert_eq!(kitchen.ledger.snapshot(), before);
    assert_eq!(kitchen.ledger.movements_for(order.id_typed()).len(), 1);
}

#[test]
fn removing_every_line_then_re_adding_matches_a_single_submit() {
    let kitchen = kitchen(&[
        ("CHICKEN-BREAST", dec!(200)),
        ("BUN", dec!(50)),
        ("OIL", dec!(1000)),
    ]);
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(3))]);
    let mut emptied = order.clone();
    emptied
        .execute(&OrderCommand::ReplaceLines(ReplaceLines {
            order_id: emptied.id_typed(),
            lines: vec![],
            occurred_at: Utc::now(),
        }))
        .unwrap();

    kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();
    let after_submit = kitchen.ledger.snapshot();

    let removed = kitchen.engine().adjust(&order, &emptied);
    assert!(removed.receipt.is_some());
    assert_eq!(qty(&removed.restored, "CHICKEN-BREAST"), None);
    assert_eq!(kitchen.on_hand("BUN"), dec!(50));

    let re_added = kitchen.engine().adjust(&emptied, &order);
    assert!(re_added.issue.is_some());
    assert!(re_added.warnings.iter().any(|w| matches!(
        w,
        Warning::InsufficientStock { shortage, .. } if *shortage == dec!(250)
    )));

    assert_eq!(kitchen.ledger.snapshot(), after_submit);
}

#[test]
fn restoring_never_returns_stock_that_was_not_taken() {
    let kitchen = kitchen(&[
        ("CHICKEN-BREAST", dec!(200)),
        ("BUN", dec!(50)),
        ("OIL", dec!(1000)),
    ]);
    let mut order = kitchen.submit(&[("BURGER", dec!(3))]);
    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(200));

    let outcome = kitchen
        .hooks
        .on_update_after_submit(&mut order, lines(&[("BURGER", dec!(1))]), Utc::now())
        .unwrap();

    assert_eq!(qty(&outcome.restored, "CHICKEN-BREAST"), None);
    assert_eq!(qty(&outcome.restored, "BUN"), Some(dec!(2)));
    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(200));
    assert_eq!(kitchen.on_hand("BUN"), dec!(49));
}

#[test]
fn cancel_restores_everything_the_order_moved() {
    let kitchen = well_stocked();
    let before = kitchen.ledger.snapshot();
    let mut order = kitchen.submit(&[("BURGER", dec!(2))]);
    kitchen
        .hooks
        .on_update_after_submit(
            &mut order,
            lines(&[("BURGER", dec!(1)), ("WRAP", dec!(3))]),
            Utc::now(),
        )
        .unwrap();

    let outcome = kitchen.hooks.on_cancel(&mut order, Utc::now()).unwrap();

    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.cancelled.len(), 3);
    assert_eq!(kitchen.ledger.snapshot(), before);
    assert!(!kitchen.engine().deduction_status(order.id_typed()).is_deducted);
}

#[test]
fn delete_of_a_submitted_order_restores_stock() {
    let kitchen = well_stocked();
    let before = kitchen.ledger.snapshot();
    let mut order = kitchen.submit(&[("WRAP", dec!(4))]);

    let outcome = kitchen.hooks.on_delete(&mut order, Utc::now()).unwrap();

    assert_eq!(order.status(), OrderStatus::Deleted);
    assert_eq!(outcome.cancelled.len(), 1);
    assert_eq!(kitchen.ledger.snapshot(), before);
    assert!(order
        .annotations()
        .iter()
        .any(|a| a.note.contains("cancelled due to order deletion")));
}

#[test]
fn amended_movements_are_compensated_exactly_once() {
    let kitchen = well_stocked();
    let before = kitchen.ledger.snapshot();
    let order = kitchen.submit(&[("BURGER", dec!(2))]);
    let issue = kitchen.ledger.movements_for(order.id_typed())[0].id_typed();
    kitchen.ledger.amend_movement(issue, "rate corrected by store manager").unwrap();

    let first = kitchen.engine().restore(&order);
    assert!(first.cancelled.is_empty());
    assert_eq!(first.compensations.len(), 1);
    assert_eq!(first.compensations[0].reversed, issue);

    let compensating = kitchen.ledger.movement(first.compensations[0].movement).unwrap();
    assert_eq!(compensating.kind(), MovementKind::Receipt);
    assert_eq!(compensating.purpose(), MovementPurpose::Reversal);
    assert_eq!(compensating.reverses(), Some(issue));
    assert_eq!(kitchen.ledger.snapshot(), before);

    let second = kitchen.engine().restore(&order);
    assert_eq!(second.skipped, Some(SkipReason::NothingToPost));
    assert_eq!(kitchen.ledger.snapshot(), before);
    assert_eq!(
        kitchen.ledger.movement(issue).unwrap().status(),
        MovementStatus::Amended
    );
}

/// Ledger whose native cancel is broken for one movement.
struct BrokenCancel {
    inner: Arc<InMemoryStockLedger>,
    broken: MovementId,
}

impl StockReader for BrokenCancel {
    fn on_hand(&self, item: &ItemCode, warehouse: &WarehouseCode) -> Decimal {
        self.inner.on_hand(item, warehouse)
    }
}

impl StockLedger for BrokenCancel {
    fn create_movement(&self, movement: NewMovement) -> Result<MovementId, LedgerError> {
        self.inner.create_movement(movement)
    }

    fn cancel_movement(&self, id: MovementId) -> Result<(), LedgerError> {
        if id == self.broken {
            return Err(LedgerError::Unavailable("connection reset".to_string()));
        }
        self.inner.cancel_movement(id)
    }

    fn amend_movement(&self, id: MovementId, remark: &str) -> Result<(), LedgerError> {
        self.inner.amend_movement(id, remark)
    }

    fn movement(&self, id: MovementId) -> Option<StockMovement> {
        self.inner.movement(id)
    }

    fn movements_for(&self, order: OrderId) -> Vec<StockMovement> {
        self.inner.movements_for(order)
    }
}

#[test]
fn one_failed_reversal_does_not_stop_the_others() {
    let kitchen = well_stocked();
    let mut order = kitchen.submit(&[("BURGER", dec!(2))]);
    let issue = kitchen.ledger.movements_for(order.id_typed())[0].id_typed();
    let edit = kitchen
        .hooks
        .on_update_after_submit(&mut order, lines(&[("BURGER", dec!(1))]), Utc::now())
        .unwrap();
    let receipt = edit.receipt.unwrap();

    let engine = DeductionEngine::new(
        config(),
        Arc::new(catalog()),
        BrokenCancel {
            inner: kitchen.ledger.clone(),
            broken: issue,
        },
    );
    let outcome = engine.restore(&order);

    assert_eq!(outcome.cancelled, vec![receipt]);
    assert_eq!(
        outcome.warnings,
        vec![Warning::MovementReversalFailed {
            movement: issue,
            reason: "ledger unavailable: connection reset".to_string(),
        }]
    );
    assert_eq!(
        kitchen.ledger.movement(issue).unwrap().status(),
        MovementStatus::Committed
    );
    // The issue is still in force, so the order still holds two burgers' worth.
    assert_eq!(kitchen.on_hand("BUN"), dec!(48));
}

#[test]
fn duplicate_submit_does_not_deduct_twice() {
    let kitchen = well_stocked();
    let order = kitchen.submit(&[("BURGER", dec!(1))]);

    let again = kitchen.engine().deduct(&order);

    assert_eq!(again.skipped, Some(SkipReason::AlreadyDeducted));
    assert_eq!(kitchen.on_hand("BUN"), dec!(49));
}

#[test]
fn shared_ingredients_are_merged_into_one_line() {
    let kitchen = well_stocked();
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(1)), ("WRAP", dec!(2))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    let chicken: Vec<_> = outcome
        .lines
        .iter()
        .filter(|l| l.item.as_str() == "CHICKEN-BREAST")
        .collect();
    assert_eq!(chicken.len(), 1);
    assert_eq!(chicken[0].qty, dec!(350));
}

#[test]
fn items_without_recipes_are_reported_and_skipped() {
    let kitchen = well_stocked();
    let mut order = draft("POS-MAIN", &[("WATER", dec!(2)), ("BURGER", dec!(1))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    assert_eq!(outcome.lines.len(), 3);
    assert_eq!(
        outcome.warnings,
        vec![Warning::NoActiveRecipe {
            item: ItemCode::new("WATER")
        }]
    );
}

#[test]
fn disabled_profile_leaves_stock_alone() {
    let kitchen = well_stocked();
    let mut order = draft("POS-OFF", &[("BURGER", dec!(3))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::Disabled));
    assert_eq!(order.status(), OrderStatus::Submitted);
    assert_eq!(kitchen.on_hand("BUN"), dec!(50));
    assert!(order.annotations().is_empty());
}

#[test]
fn missing_warehouse_aborts_with_a_warning() {
    let kitchen = well_stocked();
    let mut order = draft("POS-NOWHERE", &[("BURGER", dec!(1))]);

    let outcome = kitchen.hooks.on_submit(&mut order, Utc::now()).unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::NoWarehouse));
    assert_eq!(outcome.warnings, vec![Warning::NoWarehouse]);
    assert!(kitchen.ledger.movements_for(order.id_typed()).is_empty());
    assert_eq!(order.status(), OrderStatus::Submitted);
}

#[test]
fn rejected_transitions_are_returned_and_stock_untouched() {
    let kitchen = well_stocked();
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(1))]);

    assert!(kitchen.hooks.on_cancel(&mut order, Utc::now()).is_err());
    assert_eq!(order.status(), OrderStatus::Draft);
    assert_eq!(kitchen.on_hand("BUN"), dec!(50));
}

#[test]
fn draft_edits_have_no_stock_effect() {
    let kitchen = well_stocked();
    let mut order = draft("POS-MAIN", &[("BURGER", dec!(1))]);

    let outcome = kitchen
        .hooks
        .on_update_after_submit(&mut order, lines(&[("BURGER", dec!(4))]), Utc::now())
        .unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::NotSubmitted));
    assert_eq!(kitchen.on_hand("BUN"), dec!(50));
}

#[test]
fn simulation_reports_shortages_without_writing() {
    let kitchen = kitchen(&[("CHICKEN-BREAST", dec!(100)), ("BUN", dec!(50)), ("OIL", dec!(1000))]);
    let order = draft("POS-MAIN", &[("BURGER", dec!(1)), ("WATER", dec!(1))]);

    let simulation = kitchen.engine().simulate(&order);

    assert!(simulation.enabled);
    assert!(!simulation.all_sufficient);
    assert_eq!(simulation.lines.len(), 2);
    assert_eq!(simulation.lines[0].recipe.as_deref(), Some("BOM-BURGER-001"));
    let chicken = simulation.lines[0]
        .ingredients
        .iter()
        .find(|i| i.requirement.item.as_str() == "CHICKEN-BREAST")
        .and_then(|i| i.availability.clone())
        .unwrap();
    assert_eq!(chicken.shortage, dec!(50));
    assert!(simulation.lines[1].ingredients.is_empty());
    assert!(kitchen.ledger.journal().is_empty());
}

#[test]
fn recipe_stock_validation_lists_every_ingredient() {
    let kitchen = kitchen(&[("CHICKEN-BREAST", dec!(1000)), ("TORTILLA", dec!(3))]);

    let report = kitchen
        .engine()
        .validate_recipe_stock(&ItemCode::new("WRAP"), dec!(5), &WarehouseCode::new(KITCHEN))
        .unwrap();

    assert_eq!(report.recipe, "BOM-WRAP-001");
    assert!(!report.all_sufficient);
    let tortilla = report
        .ingredients
        .iter()
        .find(|i| i.item.as_str() == "TORTILLA")
        .unwrap();
    assert_eq!(tortilla.required, dec!(5));
    assert_eq!(tortilla.shortage, dec!(2));
}

#[test]
fn deduction_status_follows_the_ledger() {
    let kitchen = well_stocked();
    let mut order = kitchen.submit(&[("BURGER", dec!(2))]);

    let status = kitchen.engine().deduction_status(order.id_typed());
    assert!(status.is_deducted);
    assert_eq!(status.active_issues.len(), 1);
    assert_eq!(status.net_issued[&ItemCode::new("BUN")], dec!(2));

    kitchen.hooks.on_cancel(&mut order, Utc::now()).unwrap();
    let status = kitchen.engine().deduction_status(order.id_typed());
    assert!(!status.is_deducted);
    assert_eq!(status.movements[0].status, MovementStatus::Cancelled);
    assert!(status.net_issued.is_empty());
}

#[test]
fn concurrent_orders_never_drive_stock_negative() {
    let kitchen = kitchen(&[
        ("CHICKEN-BREAST", dec!(1000)),
        ("TORTILLA", dec!(1000)),
    ]);
    let orders: Vec<PosOrder> = (0..10)
        .map(|_| draft("POS-MAIN", &[("WRAP", dec!(1.5))]))
        .collect();

    let kitchen = &kitchen;
    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = orders
            .iter()
            .map(|order| scope.spawn(move || kitchen.engine().deduct(order)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let posted = outcomes.iter().filter(|o| o.movement.is_some()).count();
    // 150 g per order: six fit into 1000 g. Later orders still take tortillas.
    let with_chicken = outcomes
        .iter()
        .filter(|o| qty(&o.lines, "CHICKEN-BREAST").is_some())
        .count();
    assert_eq!(posted, 10);
    assert_eq!(with_chicken, 6);
    assert_eq!(kitchen.on_hand("CHICKEN-BREAST"), dec!(100));
    assert_eq!(kitchen.on_hand("TORTILLA"), dec!(985));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Submit then cancel leaves every stock row where it started.
    #[test]
    fn deduct_then_restore_round_trips(
        burgers in 1i64..10,
        wraps in 0i64..10,
        edit_burgers in 1i64..10,
    ) {
        let kitchen = well_stocked();
        let before = kitchen.ledger.snapshot();

        let mut entries = vec![("BURGER", Decimal::from(burgers))];
        if wraps > 0 {
            entries.push(("WRAP", Decimal::from(wraps)));
        }
        let mut order = kitchen.submit(&entries);
        kitchen
            .hooks
            .on_update_after_submit(&mut order, lines(&[("BURGER", Decimal::from(edit_burgers))]), Utc::now())
            .unwrap();
        kitchen.hooks.on_cancel(&mut order, Utc::now()).unwrap();

        prop_assert_eq!(kitchen.ledger.snapshot(), before);
    }
}
