//! Net quantity changes between two versions of an order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::ItemCode;

/// Per-item quantity deltas, split into what must be deducted and what
/// must be restored. Items are in code order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiff {
    /// Added items (full quantity) and increases (the delta).
    pub deduct: Vec<(ItemCode, Decimal)>,
    /// Removed items (full quantity) and decreases (the delta).
    pub restore: Vec<(ItemCode, Decimal)>,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        self.deduct.is_empty() && self.restore.is_empty()
    }
}

/// Diff two per-item quantity maps (see `PosOrder::quantities_by_item`).
///
/// Only the net change per item counts: an item removed and re-added with
/// the same quantity yields nothing.
pub fn diff_lines(
    original: &BTreeMap<ItemCode, Decimal>,
    updated: &BTreeMap<ItemCode, Decimal>,
) -> LineDiff {
    let mut diff = LineDiff::default();

    let mut items: Vec<&ItemCode> = original.keys().chain(updated.keys()).collect();
    items.sort();
    items.dedup();

    for item in items {
        let before = original.get(item).copied().unwrap_or(Decimal::ZERO);
        let after = updated.get(item).copied().unwrap_or(Decimal::ZERO);
        let delta = after - before;

        if delta > Decimal::ZERO {
            diff.deduct.push((item.clone(), delta));
        } else if delta < Decimal::ZERO {
            diff.restore.push((item.clone(), -delta));
        }
    }
    diff
}
