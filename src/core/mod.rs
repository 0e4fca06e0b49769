pub mod config;
pub mod error;
pub mod types;

pub use config::{InitialConfig, RunConfig, ScenarioFile};
pub use error::{Result, SimError};
pub use types::{CityId, DomainKind, Year};
