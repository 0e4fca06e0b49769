use thiserror::Error;

use crate::core::types::{DomainKind, Year};
use crate::urban::simulation::RunStatus;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    #[error("Cyclic dependency among domains: {involved:?}")]
    CyclicDependency { involved: Vec<DomainKind> },

    #[error("Invalid state in {domain} for year {year}: {reason}")]
    InvalidState {
        domain: DomainKind,
        year: Year,
        reason: String,
    },

    #[error("Year {0} already recorded")]
    DuplicateYear(Year),

    #[error("Cannot {operation} while simulation is {status:?}")]
    InvalidLifecycle {
        operation: &'static str,
        status: RunStatus,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
