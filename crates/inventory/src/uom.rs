//! Unit-of-measure conversion.
//!
//! Resolution order for `convert(qty, from, to)`:
//! 1. identical units: factor 1;
//! 2. the static table, first matching `(from, to)` entry wins (entries are
//!    directional, the inverse must be listed separately);
//! 3. the item's own override table (factor for the *target* unit);
//! 4. otherwise [`ConversionNotFound`].
//!
//! There is no transitive lookup: `Liter -> Gram` fails even though both
//! units appear in the table.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use larder_core::Uom;

/// One directional entry of the static table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionEntry {
    pub from: Uom,
    pub to: Uom,
    pub factor: Decimal,
}

impl ConversionEntry {
    pub fn new(from: &str, to: &str, factor: Decimal) -> Self {
        Self {
            from: Uom::new(from),
            to: Uom::new(to),
            factor,
        }
    }
}

/// Per-item conversion factors relative to the item's stock unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UomOverrides(BTreeMap<Uom, Decimal>);

impl UomOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uom: impl Into<Uom>, factor: Decimal) -> Self {
        self.0.insert(uom.into(), factor);
        self
    }

    pub fn factor(&self, uom: &Uom) -> Option<Decimal> {
        self.0.get(uom).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a conversion factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSource {
    Identity,
    Static,
    ItemOverride,
}

/// Successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub original_qty: Decimal,
    pub original_uom: Uom,
    pub converted_qty: Decimal,
    pub converted_uom: Uom,
    pub factor: Decimal,
    pub source: ConversionSource,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no conversion found from {from} to {to}")]
pub struct ConversionNotFound {
    pub from: Uom,
    pub to: Uom,
    /// Statically known pairs, for diagnostics.
    pub known_pairs: Vec<(Uom, Uom)>,
}

/// Static conversion table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UomTable {
    entries: Vec<ConversionEntry>,
}

impl Default for UomTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl UomTable {
    /// The common kitchen conversions (volume, weight, length, counts).
    pub fn standard() -> Self {
        let thousand = Decimal::new(1000, 0);
        let milli = Decimal::new(1, 3);
        let hundred = Decimal::new(100, 0);
        let centi = Decimal::new(1, 2);

        Self::from_entries(vec![
            // Volume
            ConversionEntry::new("Liter", "ml", thousand),
            ConversionEntry::new("Liter", "Milliliter", thousand),
            ConversionEntry::new("ml", "Liter", milli),
            ConversionEntry::new("Milliliter", "Liter", milli),
            // Weight
            ConversionEntry::new("Kg", "grams", thousand),
            ConversionEntry::new("Kg", "Gram", thousand),
            ConversionEntry::new("Kilogram", "Gram", thousand),
            ConversionEntry::new("grams", "Kg", milli),
            ConversionEntry::new("Gram", "Kg", milli),
            ConversionEntry::new("Gram", "Kilogram", milli),
            // Length
            ConversionEntry::new("Meter", "cm", hundred),
            ConversionEntry::new("Meter", "Centimeter", hundred),
            ConversionEntry::new("cm", "Meter", centi),
            ConversionEntry::new("Centimeter", "Meter", centi),
            // Counts
            ConversionEntry::new("Nos", "Nos", Decimal::ONE),
            ConversionEntry::new("Each", "Each", Decimal::ONE),
            ConversionEntry::new("Piece", "Piece", Decimal::ONE),
        ])
    }

    pub fn from_entries(entries: Vec<ConversionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ConversionEntry] {
        &self.entries
    }

    pub fn known_pairs(&self) -> Vec<(Uom, Uom)> {
        self.entries
            .iter()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect()
    }

    fn lookup(&self, from: &Uom, to: &Uom) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|e| &e.from == from && &e.to == to)
            .map(|e| e.factor)
    }

    /// Convert `qty` from `from` to `to`, consulting `overrides` last.
    pub fn convert(
        &self,
        qty: Decimal,
        from: &Uom,
        to: &Uom,
        overrides: Option<&UomOverrides>,
    ) -> Result<Conversion, ConversionNotFound> {
        let found = if from == to {
            Some((Decimal::ONE, ConversionSource::Identity))
        } else if let Some(factor) = self.lookup(from, to) {
            Some((factor, ConversionSource::Static))
        } else {
            overrides
                .and_then(|o| o.factor(to))
                .map(|factor| (factor, ConversionSource::ItemOverride))
        };

        match found {
            Some((factor, source)) => Ok(Conversion {
                original_qty: qty,
                original_uom: from.clone(),
                converted_qty: qty * factor,
                converted_uom: to.clone(),
                factor,
                source,
            }),
            None => Err(ConversionNotFound {
                from: from.clone(),
                to: to.clone(),
                known_pairs: self.known_pairs(),
            }),
        }
    }

    /// Factor for one unit of `from` expressed in `to` (static table only).
    pub fn conversion_factor(&self, from: &Uom, to: &Uom) -> Option<Decimal> {
        self.convert(Decimal::ONE, from, to, None)
            .ok()
            .map(|c| c.factor)
    }
}
