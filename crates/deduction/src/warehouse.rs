//! Source warehouse resolution for an order.
//!
//! Priority: the POS profile's warehouse, then the branch default, then the
//! company default.
//!
//! The branch and company are taken from the order first. The codes configured
//! on the profile are only a fallback for orders that carry none, so an order
//! booked against another branch draws from that branch's default even when
//! its profile names a different one.

use serde::{Deserialize, Serialize};

use larder_core::{BranchCode, CompanyCode, ProfileCode, WarehouseCode};

use crate::config::DeductionConfig;

/// Lookups behind warehouse resolution.
pub trait WarehouseDirectory {
    fn profile_warehouse(&self, profile: &ProfileCode) -> Option<WarehouseCode>;
    fn branch_warehouse(&self, branch: &BranchCode) -> Option<WarehouseCode>;
    fn company_warehouse(&self, company: &CompanyCode) -> Option<WarehouseCode>;

    fn profile_branch(&self, _profile: &ProfileCode) -> Option<BranchCode> {
        None
    }

    fn profile_company(&self, _profile: &ProfileCode) -> Option<CompanyCode> {
        None
    }
}

impl WarehouseDirectory for DeductionConfig {
    fn profile_warehouse(&self, profile: &ProfileCode) -> Option<WarehouseCode> {
        self.profile(profile).and_then(|p| p.warehouse.clone())
    }

    fn branch_warehouse(&self, branch: &BranchCode) -> Option<WarehouseCode> {
        self.branch(branch).and_then(|b| b.default_warehouse.clone())
    }

    fn company_warehouse(&self, company: &CompanyCode) -> Option<WarehouseCode> {
        self.company(company).and_then(|c| c.default_warehouse.clone())
    }

    fn profile_branch(&self, profile: &ProfileCode) -> Option<BranchCode> {
        self.profile(profile).and_then(|p| p.branch.clone())
    }

    fn profile_company(&self, profile: &ProfileCode) -> Option<CompanyCode> {
        self.profile(profile).and_then(|p| p.company.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseSource {
    Profile,
    Branch,
    Company,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWarehouse {
    pub warehouse: WarehouseCode,
    pub source: WarehouseSource,
}

/// First non-empty warehouse along profile, branch, company.
pub fn resolve<D>(
    directory: &D,
    profile: Option<&ProfileCode>,
    branch: Option<&BranchCode>,
    company: Option<&CompanyCode>,
) -> Option<ResolvedWarehouse>
where
    D: WarehouseDirectory + ?Sized,
{
    let found = |warehouse: Option<WarehouseCode>, source: WarehouseSource| {
        warehouse
            .filter(|w| !w.is_blank())
            .map(|warehouse| ResolvedWarehouse { warehouse, source })
    };

    if let Some(hit) = found(profile.and_then(|p| directory.profile_warehouse(p)), WarehouseSource::Profile) {
        return Some(hit);
    }

    let branch = branch
        .cloned()
        .or_else(|| profile.and_then(|p| directory.profile_branch(p)));
    if let Some(hit) = found(branch.and_then(|b| directory.branch_warehouse(&b)), WarehouseSource::Branch) {
        return Some(hit);
    }

    let company = company
        .cloned()
        .or_else(|| profile.and_then(|p| directory.profile_company(p)));
    found(company.and_then(|c| directory.company_warehouse(&c)), WarehouseSource::Company)
}
