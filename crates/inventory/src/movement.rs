use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{
    Aggregate, AggregateRoot, DomainError, ItemCode, MovementId, OrderId, Uom, WarehouseCode,
};
use larder_events::Event;

use crate::stock::StockKey;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Decreases on-hand stock in the movement's warehouse.
    Issue,
    /// Increases on-hand stock in the movement's warehouse.
    Receipt,
}

impl MovementKind {
    pub fn opposite(self) -> Self {
        match self {
            MovementKind::Issue => MovementKind::Receipt,
            MovementKind::Receipt => MovementKind::Issue,
        }
    }

    /// Sign applied to line quantities when the movement is committed.
    pub fn sign(self) -> Decimal {
        match self {
            MovementKind::Issue => Decimal::NEGATIVE_ONE,
            MovementKind::Receipt => Decimal::ONE,
        }
    }
}

/// Why the movement was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPurpose {
    /// Initial deduction when an order is submitted.
    Deduction,
    /// Delta posted when a submitted order's lines are edited.
    Adjustment,
    /// Compensation for a movement that could not be cancelled natively.
    Reversal,
}

/// Movement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    /// Posted and untouched since.
    Committed,
    /// Posted, then altered (remarks, manual corrections); still counts towards stock.
    Amended,
    /// Reversed by the ledger's native cancel.
    Cancelled,
}

/// One ingredient line of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    pub item: ItemCode,
    /// Quantity in the item's stock unit (always positive).
    pub qty: Decimal,
    pub uom: Uom,
    /// Total valuation of the line (food cost).
    pub amount: Decimal,
}

impl MovementLine {
    pub fn new(item: ItemCode, qty: Decimal, uom: Uom, amount: Decimal) -> Self {
        Self { item, qty, uom, amount }
    }

    /// Valuation per stock unit.
    pub fn rate(&self) -> Decimal {
        if self.qty.is_zero() {
            Decimal::ZERO
        } else {
            self.amount / self.qty
        }
    }
}

/// Aggregate root: StockMovement (a stock entry in the ledger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    id: MovementId,
    kind: MovementKind,
    purpose: MovementPurpose,
    warehouse: WarehouseCode,
    correlation: Option<OrderId>,
    reverses: Option<MovementId>,
    lines: Vec<MovementLine>,
    status: MovementStatus,
    remarks: Vec<String>,
    posted_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl StockMovement {
    /// Create an empty, not-yet-committed instance for rehydration.
    pub fn empty(id: MovementId) -> Self {
        Self {
            id,
            kind: MovementKind::Issue,
            purpose: MovementPurpose::Deduction,
            warehouse: WarehouseCode::new(""),
            correlation: None,
            reverses: None,
            lines: Vec::new(),
            status: MovementStatus::Committed,
            remarks: Vec::new(),
            posted_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> MovementId {
        self.id
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn purpose(&self) -> MovementPurpose {
        self.purpose
    }

    pub fn warehouse(&self) -> &WarehouseCode {
        &self.warehouse
    }

    pub fn correlation(&self) -> Option<OrderId> {
        self.correlation
    }

    /// The movement this one compensates, for `Reversal` movements.
    pub fn reverses(&self) -> Option<MovementId> {
        self.reverses
    }

    pub fn lines(&self) -> &[MovementLine] {
        &self.lines
    }

    pub fn status(&self) -> MovementStatus {
        self.status
    }

    pub fn remarks(&self) -> &[String] {
        &self.remarks
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn is_committed(&self) -> bool {
        self.created && self.status != MovementStatus::Cancelled
    }

    /// Sum of line amounts.
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount).sum()
    }

    /// Signed stock deltas this movement applies while it is in force.
    pub fn stock_deltas(&self) -> Vec<(StockKey, Decimal)> {
        let sign = self.kind.sign();
        self.lines
            .iter()
            .map(|l| {
                (
                    StockKey::new(l.item.clone(), self.warehouse.clone()),
                    l.qty * sign,
                )
            })
            .collect()
    }
}

impl AggregateRoot for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CommitMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMovement {
    pub movement_id: MovementId,
    pub kind: MovementKind,
    pub purpose: MovementPurpose,
    pub warehouse: WarehouseCode,
    pub correlation: Option<OrderId>,
    #[serde(default)]
    pub reverses: Option<MovementId>,
    pub lines: Vec<MovementLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendMovement {
    pub movement_id: MovementId,
    pub remark: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMovement {
    pub movement_id: MovementId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementCommand {
    CommitMovement(CommitMovement),
    AmendMovement(AmendMovement),
    CancelMovement(CancelMovement),
}

/// Event: MovementCommitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCommitted {
    pub movement_id: MovementId,
    pub kind: MovementKind,
    pub purpose: MovementPurpose,
    pub warehouse: WarehouseCode,
    pub correlation: Option<OrderId>,
    #[serde(default)]
    pub reverses: Option<MovementId>,
    pub lines: Vec<MovementLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MovementAmended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementAmended {
    pub movement_id: MovementId,
    pub remark: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MovementCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCancelled {
    pub movement_id: MovementId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementEvent {
    MovementCommitted(MovementCommitted),
    MovementAmended(MovementAmended),
    MovementCancelled(MovementCancelled),
}

impl MovementEvent {
    pub fn movement_id(&self) -> MovementId {
        match self {
            MovementEvent::MovementCommitted(e) => e.movement_id,
            MovementEvent::MovementAmended(e) => e.movement_id,
            MovementEvent::MovementCancelled(e) => e.movement_id,
        }
    }
}

impl Event for MovementEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MovementEvent::MovementCommitted(_) => "inventory.movement.committed",
            MovementEvent::MovementAmended(_) => "inventory.movement.amended",
            MovementEvent::MovementCancelled(_) => "inventory.movement.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MovementEvent::MovementCommitted(e) => e.occurred_at,
            MovementEvent::MovementAmended(e) => e.occurred_at,
            MovementEvent::MovementCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockMovement {
    type Command = MovementCommand;
    type Event = MovementEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            MovementEvent::MovementCommitted(e) => {
                self.id = e.movement_id;
                self.kind = e.kind;
                self.purpose = e.purpose;
                self.warehouse = e.warehouse.clone();
                self.correlation = e.correlation;
                self.reverses = e.reverses;
                self.lines = e.lines.clone();
                self.status = MovementStatus::Committed;
                self.posted_at = Some(e.occurred_at);
                self.created = true;
            }
            MovementEvent::MovementAmended(e) => {
                self.remarks.push(e.remark.clone());
                self.status = MovementStatus::Amended;
            }
            MovementEvent::MovementCancelled(_) => {
                self.status = MovementStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            MovementCommand::CommitMovement(cmd) => self.handle_commit(cmd),
            MovementCommand::AmendMovement(cmd) => self.handle_amend(cmd),
            MovementCommand::CancelMovement(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl StockMovement {
    fn ensure_movement_id(&self, movement_id: MovementId) -> Result<(), DomainError> {
        if self.id != movement_id {
            return Err(DomainError::invariant("movement_id mismatch"));
        }
        Ok(())
    }

    fn handle_commit(&self, cmd: &CommitMovement) -> Result<Vec<MovementEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("movement already committed"));
        }
        if cmd.warehouse.is_blank() {
            return Err(DomainError::validation("warehouse cannot be empty"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("movement must have lines"));
        }
        if cmd.reverses.is_some() != (cmd.purpose == MovementPurpose::Reversal) {
            return Err(DomainError::validation(
                "reversal movements must reference exactly the movement they compensate",
            ));
        }

        for (idx, line) in cmd.lines.iter().enumerate() {
            if line.qty <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "quantity must be positive (item {})",
                    line.item
                )));
            }
            if line.amount < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "amount cannot be negative (item {})",
                    line.item
                )));
            }
            if cmd.lines[..idx].iter().any(|l| l.item == line.item) {
                return Err(DomainError::invariant(format!(
                    "item {} appears twice in one movement",
                    line.item
                )));
            }
        }

        Ok(vec![MovementEvent::MovementCommitted(MovementCommitted {
            movement_id: cmd.movement_id,
            kind: cmd.kind,
            purpose: cmd.purpose,
            warehouse: cmd.warehouse.clone(),
            correlation: cmd.correlation,
            reverses: cmd.reverses,
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend(&self, cmd: &AmendMovement) -> Result<Vec<MovementEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("movement"));
        }
        self.ensure_movement_id(cmd.movement_id)?;

        if self.status == MovementStatus::Cancelled {
            return Err(DomainError::transition("movement", self.status, "amend"));
        }
        if cmd.remark.trim().is_empty() {
            return Err(DomainError::validation("remark cannot be empty"));
        }

        Ok(vec![MovementEvent::MovementAmended(MovementAmended {
            movement_id: cmd.movement_id,
            remark: cmd.remark.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelMovement) -> Result<Vec<MovementEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("movement"));
        }
        self.ensure_movement_id(cmd.movement_id)?;

        match self.status {
            MovementStatus::Committed => {}
            MovementStatus::Amended => {
                // Post a compensating movement instead.
                return Err(DomainError::transition("movement", self.status, "cancel"));
            }
            MovementStatus::Cancelled => {
                return Err(DomainError::conflict("movement already cancelled"));
            }
        }

        Ok(vec![MovementEvent::MovementCancelled(MovementCancelled {
            movement_id: cmd.movement_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
