//! Strongly-typed identifiers used across the domain.
//!
//! Two flavours:
//! - UUID-backed ids for records the system creates itself (orders, movements);
//! - human-readable codes for master data owned elsewhere (items, warehouses,
//!   units, POS profiles, branches, companies).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a point-of-sale order (the correlation key for movements).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

/// Identifier of a stock movement (stock entry) in the ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(OrderId, "OrderId");
impl_uuid_newtype!(MovementId, "MovementId");

/// Item code (menu item or raw ingredient), e.g. `CHICKEN-BREAST`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

/// Warehouse code, e.g. `Kitchen Store - RC`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseCode(String);

/// Unit of measure, compared by exact name (`Gram` and `grams` are different units).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uom(String);

/// POS profile code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileCode(String);

/// Branch code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchCode(String);

/// Company code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyCode(String);

macro_rules! impl_code_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a code without validation (master data is trusted).
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// A code consisting only of whitespace counts as "not configured".
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: blank code", $name)));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_code_newtype!(ItemCode, "ItemCode");
impl_code_newtype!(WarehouseCode, "WarehouseCode");
impl_code_newtype!(Uom, "Uom");
impl_code_newtype!(ProfileCode, "ProfileCode");
impl_code_newtype!(BranchCode, "BranchCode");
impl_code_newtype!(CompanyCode, "CompanyCode");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_codes_are_rejected_on_parse() {
        let err = ItemCode::from_str("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.contains("ItemCode")));
        assert_eq!(ItemCode::from_str("BUN").unwrap(), ItemCode::new("BUN"));
    }

    #[test]
    fn codes_serialize_transparently() {
        let json = serde_json::to_string(&WarehouseCode::new("Stores - RC")).unwrap();
        assert_eq!(json, "\"Stores - RC\"");

        let back: WarehouseCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "Stores - RC");
    }

    #[test]
    fn uuid_ids_parse_and_display() {
        let id = MovementId::new();
        let parsed: MovementId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }
}
