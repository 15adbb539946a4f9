//! Stock ledger seam and an in-memory implementation.
//!
//! The ledger owns on-hand balances. Every balance change happens through a
//! movement (or an explicit opening balance), and writes to the same
//! `(item, warehouse)` row are serialised through a per-row mutex. Issues are
//! re-validated under that mutex, so two concurrent deductions cannot both
//! pass a stale availability check and drive stock negative.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use larder_core::{
    Aggregate, DomainError, ExpectedVersion, ItemCode, MovementId, OrderId, WarehouseCode,
};
use larder_events::EventEnvelope;

use crate::movement::{
    AmendMovement, CancelMovement, CommitMovement, MovementCommand, MovementEvent, MovementKind,
    MovementLine, MovementPurpose, StockMovement,
};
use crate::stock::{StockKey, StockReader};

const MOVEMENT_STREAM: &str = "inventory.movement";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient stock for {item} in {warehouse} (required {required}, available {available})")]
    InsufficientStock {
        item: ItemCode,
        warehouse: WarehouseCode,
        required: Decimal,
        available: Decimal,
    },

    #[error("movement {0} not found")]
    MovementNotFound(MovementId),

    #[error("movement rejected: {0}")]
    Rejected(#[from] DomainError),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// A movement to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub purpose: MovementPurpose,
    pub warehouse: WarehouseCode,
    pub lines: Vec<MovementLine>,
    pub correlation: Option<OrderId>,
    /// Set on `Reversal` movements: the movement being compensated.
    #[serde(default)]
    pub reverses: Option<MovementId>,
}

/// The external stock ledger, as seen by the deduction engine.
pub trait StockLedger: StockReader {
    /// Commit a movement atomically: either every line is applied or none is.
    fn create_movement(&self, movement: NewMovement) -> Result<MovementId, LedgerError>;

    /// Native cancel: reverses the stock effect of a committed, unaltered movement.
    fn cancel_movement(&self, id: MovementId) -> Result<(), LedgerError>;

    /// Record a post-commit alteration. Amended movements can no longer be
    /// cancelled natively.
    fn amend_movement(&self, id: MovementId, remark: &str) -> Result<(), LedgerError>;

    fn movement(&self, id: MovementId) -> Option<StockMovement>;

    /// Every movement correlated to `order`, in posting order.
    fn movements_for(&self, order: OrderId) -> Vec<StockMovement>;
}

impl<L> StockLedger for Arc<L>
where
    L: StockLedger + ?Sized,
{
    fn create_movement(&self, movement: NewMovement) -> Result<MovementId, LedgerError> {
        (**self).create_movement(movement)
    }

    fn cancel_movement(&self, id: MovementId) -> Result<(), LedgerError> {
        (**self).cancel_movement(id)
    }

    fn amend_movement(&self, id: MovementId, remark: &str) -> Result<(), LedgerError> {
        (**self).amend_movement(id, remark)
    }

    fn movement(&self, id: MovementId) -> Option<StockMovement> {
        (**self).movement(id)
    }

    fn movements_for(&self, order: OrderId) -> Vec<StockMovement> {
        (**self).movements_for(order)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StockRow {
    qty: Decimal,
    version: u64,
}

/// In-memory ledger for tests, simulations and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    stock: RwLock<HashMap<StockKey, StockRow>>,
    row_locks: RwLock<HashMap<StockKey, Arc<Mutex<()>>>>,
    movements: RwLock<HashMap<MovementId, StockMovement>>,
    by_order: RwLock<HashMap<OrderId, Vec<MovementId>>>,
    journal: RwLock<Vec<EventEnvelope<MovementEvent>>>,
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Unavailable("lock poisoned".to_string())
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an opening balance, bypassing movements.
    pub fn set_on_hand(
        &self,
        item: impl Into<ItemCode>,
        warehouse: impl Into<WarehouseCode>,
        qty: Decimal,
    ) -> Result<(), LedgerError> {
        let key = StockKey::new(item.into(), warehouse.into());
        let handles = self.row_handles(std::slice::from_ref(&key))?;
        let _guards = lock_all(&handles)?;

        let mut stock = self.stock.write().map_err(poisoned)?;
        let row = stock.entry(key).or_default();
        row.qty = qty;
        row.version += 1;
        Ok(())
    }

    /// Version of a stock row (0 when the row does not exist).
    pub fn stock_version(&self, item: &ItemCode, warehouse: &WarehouseCode) -> u64 {
        let key = StockKey::new(item.clone(), warehouse.clone());
        self.stock
            .read()
            .ok()
            .and_then(|s| s.get(&key).map(|r| r.version))
            .unwrap_or(0)
    }

    /// Apply a raw delta to one row with an optimistic version check.
    ///
    /// Returns the new on-hand quantity.
    pub fn apply_delta(
        &self,
        key: &StockKey,
        delta: Decimal,
        expected: ExpectedVersion,
    ) -> Result<Decimal, LedgerError> {
        let handles = self.row_handles(std::slice::from_ref(key))?;
        let _guards = lock_all(&handles)?;

        let version = self
            .stock
            .read()
            .map_err(poisoned)?
            .get(key)
            .map(|r| r.version)
            .unwrap_or(0);
        expected.check(version)?;

        self.apply_deltas_locked(&[(key.clone(), delta)])?;
        Ok(self.on_hand(&key.item, &key.warehouse))
    }

    /// Append-only journal of movement events.
    pub fn journal(&self) -> Vec<EventEnvelope<MovementEvent>> {
        self.journal.read().map(|j| j.clone()).unwrap_or_default()
    }

    /// Snapshot of every stock row, sorted by key.
    pub fn snapshot(&self) -> Vec<(StockKey, Decimal)> {
        let mut rows: Vec<_> = self
            .stock
            .read()
            .map(|s| s.iter().map(|(k, r)| (k.clone(), r.qty)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Mutex handles for `keys`, deduplicated and in a global (sorted) order.
    fn row_handles(&self, keys: &[StockKey]) -> Result<Vec<Arc<Mutex<()>>>, LedgerError> {
        let mut sorted: Vec<&StockKey> = keys.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut locks = self.row_locks.write().map_err(poisoned)?;
        Ok(sorted
            .into_iter()
            .map(|k| locks.entry(k.clone()).or_default().clone())
            .collect())
    }

    /// Validate and apply deltas. Callers must hold the row mutexes.
    fn apply_deltas_locked(&self, deltas: &[(StockKey, Decimal)]) -> Result<(), LedgerError> {
        let mut stock = self.stock.write().map_err(poisoned)?;

        for (key, delta) in deltas {
            if *delta >= Decimal::ZERO {
                continue;
            }
            let available = stock.get(key).map(|r| r.qty).unwrap_or(Decimal::ZERO);
            if available + *delta < Decimal::ZERO {
                return Err(LedgerError::InsufficientStock {
                    item: key.item.clone(),
                    warehouse: key.warehouse.clone(),
                    required: -*delta,
                    available,
                });
            }
        }

        for (key, delta) in deltas {
            let row = stock.entry(key.clone()).or_default();
            row.qty += *delta;
            row.version += 1;
        }
        Ok(())
    }

    fn append(&self, correlation: Option<OrderId>, events: Vec<MovementEvent>) -> Result<(), LedgerError> {
        let mut journal = self.journal.write().map_err(poisoned)?;
        for event in events {
            let seq = journal.len() as u64 + 1;
            let stream = *event.movement_id().as_uuid();
            journal.push(EventEnvelope::new(stream, MOVEMENT_STREAM, seq, correlation, event));
        }
        Ok(())
    }
}

fn lock_all(handles: &[Arc<Mutex<()>>]) -> Result<Vec<MutexGuard<'_, ()>>, LedgerError> {
    handles.iter().map(|m| m.lock().map_err(poisoned)).collect()
}

impl StockReader for InMemoryStockLedger {
    fn on_hand(&self, item: &ItemCode, warehouse: &WarehouseCode) -> Decimal {
        let key = StockKey::new(item.clone(), warehouse.clone());
        self.stock
            .read()
            .ok()
            .and_then(|s| s.get(&key).map(|r| r.qty))
            .unwrap_or(Decimal::ZERO)
    }
}

impl StockLedger for InMemoryStockLedger {
    fn create_movement(&self, new: NewMovement) -> Result<MovementId, LedgerError> {
        let id = MovementId::new();
        let mut movement = StockMovement::empty(id);
        let events = movement.handle(&MovementCommand::CommitMovement(CommitMovement {
            movement_id: id,
            kind: new.kind,
            purpose: new.purpose,
            warehouse: new.warehouse.clone(),
            correlation: new.correlation,
            reverses: new.reverses,
            lines: new.lines,
            occurred_at: Utc::now(),
        }))?;
        for event in &events {
            movement.apply(event);
        }

        let deltas = movement.stock_deltas();
        let keys: Vec<StockKey> = deltas.iter().map(|(k, _)| k.clone()).collect();
        let handles = self.row_handles(&keys)?;
        let _guards = lock_all(&handles)?;

        self.apply_deltas_locked(&deltas)?;

        self.movements.write().map_err(poisoned)?.insert(id, movement);
        if let Some(order) = new.correlation {
            self.by_order
                .write()
                .map_err(poisoned)?
                .entry(order)
                .or_default()
                .push(id);
        }
        self.append(new.correlation, events)?;

        tracing::info!(
            movement_id = %id,
            kind = ?new.kind,
            purpose = ?new.purpose,
            warehouse = %new.warehouse,
            lines = keys.len(),
            "stock movement committed"
        );
        Ok(id)
    }

    fn cancel_movement(&self, id: MovementId) -> Result<(), LedgerError> {
        let keys: Vec<StockKey> = self
            .movement(id)
            .ok_or(LedgerError::MovementNotFound(id))?
            .stock_deltas()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        let handles = self.row_handles(&keys)?;
        let _guards = lock_all(&handles)?;

        // Re-read under the row locks; a concurrent cancel may have won.
        let mut movement = self.movement(id).ok_or(LedgerError::MovementNotFound(id))?;
        let events = movement.handle(&MovementCommand::CancelMovement(CancelMovement {
            movement_id: id,
            occurred_at: Utc::now(),
        }))?;

        let reversal: Vec<(StockKey, Decimal)> = movement
            .stock_deltas()
            .into_iter()
            .map(|(k, d)| (k, -d))
            .collect();
        self.apply_deltas_locked(&reversal)?;

        for event in &events {
            movement.apply(event);
        }
        let correlation = movement.correlation();
        self.movements.write().map_err(poisoned)?.insert(id, movement);
        self.append(correlation, events)?;

        tracing::info!(movement_id = %id, "stock movement cancelled");
        Ok(())
    }

    fn amend_movement(&self, id: MovementId, remark: &str) -> Result<(), LedgerError> {
        // Same row locks as cancel, so the two never interleave on one movement.
        let keys: Vec<StockKey> = self
            .movement(id)
            .ok_or(LedgerError::MovementNotFound(id))?
            .stock_deltas()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        let handles = self.row_handles(&keys)?;
        let _guards = lock_all(&handles)?;

        let mut movements = self.movements.write().map_err(poisoned)?;
        let movement = movements.get_mut(&id).ok_or(LedgerError::MovementNotFound(id))?;

        let events = movement.handle(&MovementCommand::AmendMovement(AmendMovement {
            movement_id: id,
            remark: remark.to_string(),
            occurred_at: Utc::now(),
        }))?;
        for event in &events {
            movement.apply(event);
        }
        let correlation = movement.correlation();
        drop(movements);

        self.append(correlation, events)?;
        tracing::info!(movement_id = %id, "stock movement amended");
        Ok(())
    }

    fn movement(&self, id: MovementId) -> Option<StockMovement> {
        self.movements.read().ok()?.get(&id).cloned()
    }

    fn movements_for(&self, order: OrderId) -> Vec<StockMovement> {
        let ids = match self.by_order.read() {
            Ok(index) => index.get(&order).cloned().unwrap_or_default(),
            Err(_) => return vec![],
        };
        let movements = match self.movements.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        ids.iter().filter_map(|id| movements.get(id).cloned()).collect()
    }
}
