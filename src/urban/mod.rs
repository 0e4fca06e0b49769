//! Urban dynamics simulation core
//!
//! Cities advance year by year through twelve interdependent indicator
//! domains. Each year every domain steps against a frozen snapshot of the
//! previous year, in an order fixed by the dependency graph, and the
//! resulting system state is appended to the history.

pub mod batch;
pub mod domain;
pub mod domains;
pub mod history;
pub mod output;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod state;

pub use domain::{CityContext, Coupling, DependencyEdge, DomainModel, DomainSpec, MissingCityPolicy};
pub use history::History;
pub use output::SimulationOutput;
pub use scheduler::Scheduler;
pub use simulation::{RunStatus, Simulation};
pub use snapshot::{DependencyView, SystemSnapshot};
pub use state::{DomainState, FieldKind, FieldSpec, FieldValue};
