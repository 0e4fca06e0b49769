//! Run parameters and scenario loading
//!
//! A scenario is a TOML document with a `[run]` table and a
//! `[domains.<domain>.<city>]` tree of initial field values:
//!
//! ```toml
//! [run]
//! base_year = 2025
//! years = 10
//! seed = 42
//!
//! [domains.growth.Dhaka]
//! population = 18000000
//! growth_rate = 0.035
//! land_use = { residential = 40, informal = 15, green = 5, water = 40 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{DomainKind, Year};
use crate::urban::state::DomainState;

pub const DEFAULT_BASE_YEAR: Year = 2025;
pub const DEFAULT_YEARS: u32 = 10;
pub const DEFAULT_SEED: u64 = 12345;

/// Parameters of a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// First simulated year
    pub base_year: Year,
    /// Number of years to simulate
    pub years: u32,
    /// Seed for every random stream of the run
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_year: DEFAULT_BASE_YEAR,
            years: DEFAULT_YEARS,
            seed: DEFAULT_SEED,
        }
    }
}

impl RunConfig {
    pub fn new(base_year: Year, years: u32, seed: u64) -> Self {
        Self { base_year, years, seed }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.base_year == 0 {
            return Err(SimError::ConfigValidation("base_year must be positive".into()));
        }
        if self.base_year.checked_add(self.years).is_none() {
            return Err(SimError::ConfigValidation(format!(
                "base_year ({}) + years ({}) overflows",
                self.base_year, self.years
            )));
        }
        Ok(())
    }

    /// Last year a full run of this config records
    pub fn final_year(&self) -> Option<Year> {
        if self.years == 0 {
            None
        } else {
            Some(self.base_year + self.years - 1)
        }
    }
}

/// Initial per-domain, per-city state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialConfig {
    pub domains: BTreeMap<DomainKind, DomainState>,
}

impl InitialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DomainKind, state: DomainState) {
        self.domains.insert(kind, state);
    }

    pub fn with_domain(mut self, kind: DomainKind, state: DomainState) -> Self {
        self.insert(kind, state);
        self
    }

    /// State for one domain, if the configuration provides it
    pub fn domain(&self, kind: DomainKind) -> Option<&DomainState> {
        self.domains.get(&kind)
    }
}

/// Complete scenario: run parameters plus initial state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub domains: InitialConfig,
}

impl ScenarioFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: ScenarioFile = toml::from_str(content)?;
        scenario.run.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
