use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{
    Aggregate, AggregateRoot, BranchCode, CompanyCode, DomainError, ItemCode, OrderId, ProfileCode,
};
use larder_events::Event;

/// POS order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Submitted,
    Cancelled,
    Deleted,
}

/// Order line: menu item, quantity sold, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: ItemCode,
    pub qty: Decimal,
    #[serde(default)]
    pub rate: Decimal,
}

impl OrderLine {
    pub fn new(item: impl Into<ItemCode>, qty: Decimal, rate: Decimal) -> Self {
        Self {
            item: item.into(),
            qty,
            rate,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.item.is_blank() {
            return Err(DomainError::validation("line item cannot be empty"));
        }
        if self.qty <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity of {} must be positive",
                self.item
            )));
        }
        if self.rate < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "rate of {} cannot be negative",
                self.item
            )));
        }
        Ok(())
    }
}

/// Append-only audit comment on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: PosOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosOrder {
    id: OrderId,
    profile: Option<ProfileCode>,
    branch: Option<BranchCode>,
    company: Option<CompanyCode>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    annotations: Vec<Annotation>,
    version: u64,
    created: bool,
}

impl PosOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            profile: None,
            branch: None,
            company: None,
            status: OrderStatus::Draft,
            lines: Vec::new(),
            annotations: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn profile(&self) -> Option<&ProfileCode> {
        self.profile.as_ref()
    }

    pub fn branch(&self) -> Option<&BranchCode> {
        self.branch.as_ref()
    }

    pub fn company(&self) -> Option<&CompanyCode> {
        self.company.as_ref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Draft | OrderStatus::Submitted)
    }

    /// Quantity sold per item, lines for the same item summed.
    pub fn quantities_by_item(&self) -> BTreeMap<ItemCode, Decimal> {
        let mut totals = BTreeMap::new();
        for line in &self.lines {
            *totals.entry(line.item.clone()).or_insert(Decimal::ZERO) += line.qty;
        }
        totals
    }

    /// Order value at line rates.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.qty * l.rate).sum()
    }
}

impl AggregateRoot for PosOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub profile: Option<ProfileCode>,
    pub branch: Option<BranchCode>,
    pub company: Option<CompanyCode>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub order_id: OrderId,
    pub line: OrderLine,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceLines (edit, including after submit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceLines {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Annotate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotate {
    pub order_id: OrderId,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    CreateOrder(CreateOrder),
    AddLine(AddLine),
    SubmitOrder(SubmitOrder),
    ReplaceLines(ReplaceLines),
    CancelOrder(CancelOrder),
    DeleteOrder(DeleteOrder),
    Annotate(Annotate),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub profile: Option<ProfileCode>,
    pub branch: Option<BranchCode>,
    pub company: Option<CompanyCode>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub order_id: OrderId,
    pub line: OrderLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesReplaced {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeleted {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderAnnotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnotated {
    pub order_id: OrderId,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    LineAdded(LineAdded),
    OrderSubmitted(OrderSubmitted),
    LinesReplaced(LinesReplaced),
    OrderCancelled(OrderCancelled),
    OrderDeleted(OrderDeleted),
    OrderAnnotated(OrderAnnotated),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "sales.order.created",
            OrderEvent::LineAdded(_) => "sales.order.line_added",
            OrderEvent::OrderSubmitted(_) => "sales.order.submitted",
            OrderEvent::LinesReplaced(_) => "sales.order.lines_replaced",
            OrderEvent::OrderCancelled(_) => "sales.order.cancelled",
            OrderEvent::OrderDeleted(_) => "sales.order.deleted",
            OrderEvent::OrderAnnotated(_) => "sales.order.annotated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::LineAdded(e) => e.occurred_at,
            OrderEvent::OrderSubmitted(e) => e.occurred_at,
            OrderEvent::LinesReplaced(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
            OrderEvent::OrderDeleted(e) => e.occurred_at,
            OrderEvent::OrderAnnotated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PosOrder {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.profile = e.profile.clone();
                self.branch = e.branch.clone();
                self.company = e.company.clone();
                self.status = OrderStatus::Draft;
                self.lines.clear();
                self.annotations.clear();
                self.created = true;
            }
            OrderEvent::LineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            OrderEvent::OrderSubmitted(_) => {
                self.status = OrderStatus::Submitted;
            }
            OrderEvent::LinesReplaced(e) => {
                self.lines = e.lines.clone();
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
            OrderEvent::OrderDeleted(_) => {
                self.status = OrderStatus::Deleted;
            }
            OrderEvent::OrderAnnotated(e) => {
                self.annotations.push(Annotation {
                    note: e.note.clone(),
                    occurred_at: e.occurred_at,
                });
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            OrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            OrderCommand::SubmitOrder(cmd) => self.handle_submit(cmd),
            OrderCommand::ReplaceLines(cmd) => self.handle_replace_lines(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
            OrderCommand::DeleteOrder(cmd) => self.handle_delete(cmd),
            OrderCommand::Annotate(cmd) => self.handle_annotate(cmd),
        }
    }
}

impl PosOrder {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("order"));
        }
        self.ensure_order_id(order_id)
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            profile: cmd.profile.clone(),
            branch: cmd.branch.clone(),
            company: cmd.company.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if self.status != OrderStatus::Draft {
            return Err(DomainError::transition("order", self.status, "add lines to"));
        }
        cmd.line.validate()?;

        Ok(vec![OrderEvent::LineAdded(LineAdded {
            order_id: cmd.order_id,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &SubmitOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if self.status != OrderStatus::Draft {
            return Err(DomainError::transition("order", self.status, "submit"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot submit order without lines"));
        }

        Ok(vec![OrderEvent::OrderSubmitted(OrderSubmitted {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_lines(&self, cmd: &ReplaceLines) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::transition("order", self.status, "edit"));
        }
        if self.status == OrderStatus::Submitted && cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "a submitted order must keep at least one line",
            ));
        }
        for line in &cmd.lines {
            line.validate()?;
        }

        Ok(vec![OrderEvent::LinesReplaced(LinesReplaced {
            order_id: cmd.order_id,
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        match self.status {
            OrderStatus::Submitted => {}
            OrderStatus::Cancelled => {
                return Err(DomainError::conflict("order is already cancelled"));
            }
            status => {
                return Err(DomainError::transition("order", status, "cancel"));
            }
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        match self.status {
            OrderStatus::Draft | OrderStatus::Submitted => {}
            OrderStatus::Deleted => {
                return Err(DomainError::conflict("order is already deleted"));
            }
            OrderStatus::Cancelled => {
                return Err(DomainError::transition("order", self.status, "delete"));
            }
        }

        Ok(vec![OrderEvent::OrderDeleted(OrderDeleted {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_annotate(&self, cmd: &Annotate) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if cmd.note.trim().is_empty() {
            return Err(DomainError::validation("annotation cannot be empty"));
        }

        Ok(vec![OrderEvent::OrderAnnotated(OrderAnnotated {
            order_id: cmd.order_id,
            note: cmd.note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_order() -> PosOrder {
        let order_id = OrderId::new();
        let mut order = PosOrder::empty(order_id);
        order
            .execute(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                profile: Some(ProfileCode::new("POS-MAIN")),
                branch: Some(BranchCode::new("DOWNTOWN")),
                company: Some(CompanyCode::new("ACME")),
                occurred_at: test_time(),
            }))
            .unwrap();
        order
    }

    fn add_line(order: &mut PosOrder, item: &str, qty: Decimal) {
        let order_id = order.id_typed();
        order
            .execute(&OrderCommand::AddLine(AddLine {
                order_id,
                line: OrderLine::new(item, qty, dec!(250)),
                occurred_at: test_time(),
            }))
            .unwrap();
    }

    fn submitted_order() -> PosOrder {
        let mut order = created_order();
        add_line(&mut order, "BURGER", dec!(2));
        let order_id = order.id_typed();
        order
            .execute(&OrderCommand::SubmitOrder(SubmitOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        order
    }

    #[test]
    fn create_order_emits_order_created_event() {
        let order_id = OrderId::new();
        let order = PosOrder::empty(order_id);

        let events = order
            .handle(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                profile: Some(ProfileCode::new("POS-MAIN")),
                branch: None,
                company: Some(CompanyCode::new("ACME")),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            OrderEvent::OrderCreated(e) => {
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.profile, Some(ProfileCode::new("POS-MAIN")));
                assert_eq!(e.branch, None);
            }
            _ => panic!("Expected OrderCreated event"),
        }
    }

    #[test]
    fn submit_requires_lines() {
        let order = created_order();
        let err = order
            .handle(&OrderCommand::SubmitOrder(SubmitOrder {
                order_id: order.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn submitted_orders_are_edited_by_replacing_lines() {
        let mut order = submitted_order();
        let order_id = order.id_typed();

        let err = order
            .handle(&OrderCommand::AddLine(AddLine {
                order_id,
                line: OrderLine::new("FRIES", dec!(1), dec!(90)),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { action: "add lines to", .. }));

        order
            .execute(&OrderCommand::ReplaceLines(ReplaceLines {
                order_id,
                lines: vec![OrderLine::new("BURGER", dec!(1), dec!(250))],
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Submitted);
        assert_eq!(order.lines()[0].qty, dec!(1));
    }

    #[test]
    fn submitted_order_cannot_be_emptied() {
        let order = submitted_order();
        let err = order
            .handle(&OrderCommand::ReplaceLines(ReplaceLines {
                order_id: order.id_typed(),
                lines: vec![],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn only_submitted_orders_can_be_cancelled() {
        let draft = created_order();
        let err = draft
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id: draft.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { action: "cancel", .. }));

        let mut order = submitted_order();
        let cancel = OrderCommand::CancelOrder(CancelOrder {
            order_id: order.id_typed(),
            occurred_at: test_time(),
        });
        order.execute(&cancel).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        assert!(matches!(order.handle(&cancel), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn cancelled_orders_cannot_be_edited_or_deleted() {
        let mut order = submitted_order();
        let order_id = order.id_typed();
        order
            .execute(&OrderCommand::CancelOrder(CancelOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap();

        assert!(order
            .handle(&OrderCommand::ReplaceLines(ReplaceLines {
                order_id,
                lines: vec![OrderLine::new("BURGER", dec!(3), dec!(250))],
                occurred_at: test_time(),
            }))
            .is_err());
        assert!(order
            .handle(&OrderCommand::DeleteOrder(DeleteOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .is_err());
    }

    #[test]
    fn draft_and_submitted_orders_can_be_deleted() {
        for mut order in [created_order(), submitted_order()] {
            let order_id = order.id_typed();
            order
                .execute(&OrderCommand::DeleteOrder(DeleteOrder {
                    order_id,
                    occurred_at: test_time(),
                }))
                .unwrap();
            assert_eq!(order.status(), OrderStatus::Deleted);
        }
    }

    #[test]
    fn annotations_are_accepted_in_every_state() {
        let mut order = submitted_order();
        let order_id = order.id_typed();
        order
            .execute(&OrderCommand::CancelOrder(CancelOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        order
            .execute(&OrderCommand::Annotate(Annotate {
                order_id,
                note: "inventory restored".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(order.annotations().len(), 1);
        assert_eq!(order.annotations()[0].note, "inventory restored");
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let order = created_order();
        let err = order
            .handle(&OrderCommand::AddLine(AddLine {
                order_id: order.id_typed(),
                line: OrderLine::new("BURGER", dec!(0), dec!(250)),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn commands_for_another_order_are_rejected() {
        let order = created_order();
        let err = order
            .handle(&OrderCommand::SubmitOrder(SubmitOrder {
                order_id: OrderId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn version_increments_on_apply() {
        let order = submitted_order();
        // created, line added, submitted
        assert_eq!(order.version(), 3);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let order = submitted_order();
        let before = order.clone();

        let cmd = OrderCommand::ReplaceLines(ReplaceLines {
            order_id: order.id_typed(),
            lines: vec![OrderLine::new("BURGER", dec!(5), dec!(250))],
            occurred_at: test_time(),
        });
        let events1 = order.handle(&cmd).unwrap();
        let events2 = order.handle(&cmd).unwrap();

        assert_eq!(order, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn apply_is_deterministic() {
        let order = submitted_order();
        let order_id = order.id_typed();
        let at = test_time();
        let events = vec![
            OrderEvent::OrderCreated(OrderCreated {
                order_id,
                profile: None,
                branch: None,
                company: Some(CompanyCode::new("ACME")),
                occurred_at: at,
            }),
            OrderEvent::LineAdded(LineAdded {
                order_id,
                line: OrderLine::new("BURGER", dec!(2), dec!(250)),
                occurred_at: at,
            }),
            OrderEvent::OrderSubmitted(OrderSubmitted {
                order_id,
                occurred_at: at,
            }),
        ];

        let mut order1 = PosOrder::empty(order_id);
        let mut order2 = PosOrder::empty(order_id);
        for event in &events {
            order1.apply(event);
            order2.apply(event);
        }

        assert_eq!(order1, order2);
        assert_eq!(order1.status(), OrderStatus::Submitted);
    }

    #[test]
    fn lines_for_the_same_item_are_summed() {
        let mut order = created_order();
        add_line(&mut order, "BURGER", dec!(2));
        add_line(&mut order, "FRIES", dec!(1));
        add_line(&mut order, "BURGER", dec!(1.5));

        let totals = order.quantities_by_item();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&ItemCode::new("BURGER")], dec!(3.5));
        assert_eq!(order.total(), dec!(1125));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn per_item_totals_preserve_quantity(
            lines in prop::collection::vec((0usize..4, 1i64..100i64), 1..12),
        ) {
            let items = ["BURGER", "FRIES", "TEA", "COLA"];
            let mut order = created_order();
            for (idx, qty) in &lines {
                add_line(&mut order, items[*idx], Decimal::from(*qty));
            }

            let totals = order.quantities_by_item();
            let total: Decimal = totals.values().copied().sum();
            let expected: i64 = lines.iter().map(|(_, q)| *q).sum();
            prop_assert_eq!(total, Decimal::from(expected));
            prop_assert!(totals.len() <= items.len());
        }
    }
}
