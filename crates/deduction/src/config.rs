//! Deduction settings: POS profiles, branches and companies.
//!
//! Loaded from JSON (the CLI scenario embeds it) and validated once on load.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use larder_core::{BranchCode, CompanyCode, ProfileCode, WarehouseCode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{kind} code cannot be empty")]
    BlankCode { kind: &'static str },

    #[error("duplicate {kind} code {code}")]
    Duplicate { kind: &'static str, code: String },

    #[error("profile {profile} references unknown {kind} {code}")]
    UnknownReference {
        profile: ProfileCode,
        kind: &'static str,
        code: String,
    },
}

/// POS profile settings relevant to deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub code: ProfileCode,
    /// Inventory deduction feature flag; off unless set.
    #[serde(default)]
    pub inventory_deduction: bool,
    #[serde(default)]
    pub warehouse: Option<WarehouseCode>,
    #[serde(default)]
    pub company: Option<CompanyCode>,
    #[serde(default)]
    pub branch: Option<BranchCode>,
}

impl ProfileSettings {
    pub fn new(code: impl Into<ProfileCode>) -> Self {
        Self {
            code: code.into(),
            inventory_deduction: false,
            warehouse: None,
            company: None,
            branch: None,
        }
    }

    pub fn enabled(mut self) -> Self {
        self.inventory_deduction = true;
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<WarehouseCode>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<CompanyCode>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<BranchCode>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSettings {
    pub code: BranchCode,
    #[serde(default)]
    pub default_warehouse: Option<WarehouseCode>,
}

impl BranchSettings {
    pub fn new(code: impl Into<BranchCode>, warehouse: impl Into<WarehouseCode>) -> Self {
        Self {
            code: code.into(),
            default_warehouse: Some(warehouse.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub code: CompanyCode,
    #[serde(default)]
    pub default_warehouse: Option<WarehouseCode>,
}

impl CompanySettings {
    pub fn new(code: impl Into<CompanyCode>, warehouse: impl Into<WarehouseCode>) -> Self {
        Self {
            code: code.into(),
            default_warehouse: Some(warehouse.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionConfig {
    #[serde(default)]
    pub profiles: Vec<ProfileSettings>,
    #[serde(default)]
    pub branches: Vec<BranchSettings>,
    #[serde(default)]
    pub companies: Vec<CompanySettings>,
}

impl DeductionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn with_profile(mut self, profile: ProfileSettings) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_branch(mut self, branch: BranchSettings) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn with_company(mut self, company: CompanySettings) -> Self {
        self.companies.push(company);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unique("profile", self.profiles.iter().map(|p| p.code.as_str()))?;
        unique("branch", self.branches.iter().map(|b| b.code.as_str()))?;
        unique("company", self.companies.iter().map(|c| c.code.as_str()))?;

        for profile in &self.profiles {
            if let Some(branch) = &profile.branch {
                if self.branch(branch).is_none() {
                    return Err(ConfigError::UnknownReference {
                        profile: profile.code.clone(),
                        kind: "branch",
                        code: branch.to_string(),
                    });
                }
            }
            if let Some(company) = &profile.company {
                if self.company(company).is_none() {
                    return Err(ConfigError::UnknownReference {
                        profile: profile.code.clone(),
                        kind: "company",
                        code: company.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn profile(&self, code: &ProfileCode) -> Option<&ProfileSettings> {
        self.profiles.iter().find(|p| &p.code == code)
    }

    pub fn branch(&self, code: &BranchCode) -> Option<&BranchSettings> {
        self.branches.iter().find(|b| &b.code == code)
    }

    pub fn company(&self, code: &CompanyCode) -> Option<&CompanySettings> {
        self.companies.iter().find(|c| &c.code == code)
    }

    /// Orders without a profile, or with an unknown one, are never deducted.
    pub fn deduction_enabled(&self, profile: Option<&ProfileCode>) -> bool {
        profile
            .and_then(|code| self.profile(code))
            .map(|p| p.inventory_deduction)
            .unwrap_or(false)
    }
}

fn unique<'a>(kind: &'static str, codes: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for code in codes {
        if code.trim().is_empty() {
            return Err(ConfigError::BlankCode { kind });
        }
        if !seen.insert(code) {
            return Err(ConfigError::Duplicate {
                kind,
                code: code.to_string(),
            });
        }
    }
    Ok(())
}
