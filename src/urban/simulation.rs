//! Main simulation loop
//!
//! `Simulation` owns the city registry, one `DomainModel` per catalog entry,
//! the scheduler and the history. Each year is computed against a frozen
//! snapshot of the previous year and committed only once every domain has
//! stepped successfully.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::core::config::{InitialConfig, RunConfig, ScenarioFile};
use crate::core::error::{Result, SimError};
use crate::core::types::{CityId, DomainKind, Year};
use crate::urban::domain::{year_rng, DomainModel, DomainSpec, MissingCityPolicy};
use crate::urban::domains;
use crate::urban::history::History;
use crate::urban::scheduler::Scheduler;
use crate::urban::snapshot::{DependencyView, FieldCatalog, SystemSnapshot};
use crate::urban::state::DomainState;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Uninitialized,
    Ready,
    Running,
    Completed,
    Failed,
}

#[derive(Debug)]
pub struct Simulation {
    config: RunConfig,
    catalog: Vec<DomainSpec>,
    status: RunStatus,
    registry: BTreeSet<CityId>,
    models: BTreeMap<DomainKind, DomainModel>,
    scheduler: Option<Scheduler>,
    fields: FieldCatalog,
    initial: Option<Arc<SystemSnapshot>>,
    latest: Option<Arc<SystemSnapshot>>,
    history: History,
    current_year: Year,
}

impl Simulation {
    /// Simulation over the built-in twelve-domain catalog
    pub fn new(config: RunConfig) -> Self {
        Self::with_catalog(config, domains::catalog())
    }

    /// Simulation over a custom rule catalog. The first entry supplies the
    /// city registry and declaration order breaks scheduling ties.
    pub fn with_catalog(config: RunConfig, catalog: Vec<DomainSpec>) -> Self {
        let current_year = config.base_year;
        Self {
            config,
            catalog,
            status: RunStatus::Uninitialized,
            registry: BTreeSet::new(),
            models: BTreeMap::new(),
            scheduler: None,
            fields: FieldCatalog::new(),
            initial: None,
            latest: None,
            history: History::new(),
            current_year,
        }
    }

    /// Build and initialize a simulation from a loaded scenario
    pub fn from_scenario(scenario: &ScenarioFile) -> Result<Self> {
        let mut sim = Self::new(scenario.run.clone());
        sim.initialize(&scenario.domains)?;
        Ok(sim)
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Next year to be computed
    pub fn current_year(&self) -> Year {
        self.current_year
    }

    pub fn registry(&self) -> &BTreeSet<CityId> {
        &self.registry
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn model(&self, kind: DomainKind) -> Option<&DomainModel> {
        self.models.get(&kind)
    }

    /// State as validated at initialization, before any year ran
    pub fn initial_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.initial.clone()
    }

    fn lifecycle_error(&self, operation: &'static str) -> SimError {
        SimError::InvalidLifecycle {
            operation,
            status: self.status,
        }
    }

    /// Validate the initial state and build models and scheduler
    pub fn initialize(&mut self, initial: &InitialConfig) -> Result<()> {
        if self.status != RunStatus::Uninitialized {
            return Err(self.lifecycle_error("initialize"));
        }

        match self.build(initial) {
            Ok(()) => {
                self.status = RunStatus::Ready;
                tracing::info!(
                    "Initialized {} domains over {} cities",
                    self.models.len(),
                    self.registry.len()
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Initialization failed: {}", e);
                self.status = RunStatus::Failed;
                Err(e)
            }
        }
    }

    fn build(&mut self, initial: &InitialConfig) -> Result<()> {
        self.config.validate()?;

        let first = self
            .catalog
            .first()
            .ok_or_else(|| SimError::ConfigValidation("catalog declares no domains".into()))?
            .kind;

        for spec in &self.catalog {
            if let Some(edge) = spec.dependencies.iter().find(|e| e.consumer != spec.kind) {
                return Err(SimError::ConfigValidation(format!(
                    "{} declares an edge owned by {}",
                    spec.kind, edge.consumer
                )));
            }
        }

        let kinds: Vec<DomainKind> = self.catalog.iter().map(|s| s.kind).collect();
        let edges: Vec<_> = self
            .catalog
            .iter()
            .flat_map(|s| s.dependencies.iter().copied())
            .collect();
        let scheduler = Scheduler::new(&kinds, &edges)?;

        if let Some(kind) = initial.domains.keys().find(|k| !kinds.contains(*k)) {
            return Err(SimError::ConfigValidation(format!(
                "initial state given for {}, which is not in the catalog",
                kind
            )));
        }

        let mut models = BTreeMap::new();
        for spec in &self.catalog {
            let state = initial.domain(spec.kind).cloned().unwrap_or_default();
            models.insert(spec.kind, DomainModel::new(spec.clone(), state)?);
        }

        let registry: BTreeSet<CityId> = models
            .get(&first)
            .map(|m| m.state().cities().cloned().collect())
            .unwrap_or_default();
        if registry.is_empty() {
            return Err(SimError::ConfigValidation(format!(
                "{} defines no cities",
                first
            )));
        }

        for model in models.values() {
            if let Some(city) = model.state().cities().find(|c| !registry.contains(*c)) {
                return Err(SimError::ConfigValidation(format!(
                    "{} models unknown city {}",
                    model.kind(),
                    city
                )));
            }
        }

        // Hard dependencies, and soft ones with no default to fall back on,
        // must cover every consumer city
        for edge in scheduler.edges() {
            let (Some(consumer), Some(producer)) = (models.get(&edge.consumer), models.get(&edge.producer)) else {
                continue;
            };
            let required = producer
                .spec()
                .fields
                .iter()
                .find(|f| !f.is_breakdown() && f.default.is_none());
            if edge.policy == MissingCityPolicy::UseDefault && required.is_none() {
                continue;
            }
            if let Some(city) = consumer.state().cities().find(|c| !producer.state().contains(c)) {
                let reason = match required {
                    Some(field) if edge.policy == MissingCityPolicy::UseDefault => {
                        format!(", and {}.{} has no default", edge.producer, field.name)
                    }
                    _ => String::new(),
                };
                return Err(SimError::ConfigValidation(format!(
                    "{} requires {} for {}, which it does not model{}",
                    edge.consumer, edge.producer, city, reason
                )));
            }
        }

        self.fields = self.catalog.iter().map(|s| (s.kind, s.fields)).collect();
        let snapshot = Arc::new(snapshot_of(&models));
        self.initial = Some(Arc::clone(&snapshot));
        self.latest = Some(snapshot);
        self.registry = registry;
        self.models = models;
        self.scheduler = Some(scheduler);
        self.current_year = self.config.base_year;
        Ok(())
    }

    /// Run the number of years set in the run config
    pub fn run_configured(&mut self) -> Result<()> {
        self.run(self.config.years)
    }

    /// Advance `years` years, committing history year by year
    pub fn run(&mut self, years: u32) -> Result<()> {
        if !matches!(self.status, RunStatus::Ready | RunStatus::Running) {
            return Err(self.lifecycle_error("run"));
        }
        if self.current_year.checked_add(years).is_none() {
            return Err(SimError::ConfigValidation(format!(
                "running {} years from {} overflows",
                years, self.current_year
            )));
        }

        let start = std::time::Instant::now();
        tracing::info!("Running {} years from {}", years, self.current_year);
        self.status = RunStatus::Running;

        for _ in 0..years {
            if let Err(e) = self.advance_year() {
                tracing::warn!("Year {} failed: {}", self.current_year, e);
                self.status = RunStatus::Failed;
                return Err(e);
            }
        }

        self.status = RunStatus::Completed;
        tracing::info!(
            "Completed through {:?} in {}ms",
            self.history.final_year(),
            start.elapsed().as_millis()
        );
        Ok(())
    }

    fn advance_year(&mut self) -> Result<()> {
        let year = self.current_year;
        let scheduler = self.scheduler.as_ref().ok_or(SimError::InvalidLifecycle {
            operation: "step",
            status: self.status,
        })?;
        let previous = self.latest.clone().unwrap_or_default();

        tracing::debug!("Year {}", year);

        // 1. Step every domain against the frozen snapshot
        let mut staged: BTreeMap<DomainKind, DomainState> = BTreeMap::new();
        for &kind in scheduler.evaluation_order() {
            let model = self.models.get(&kind).ok_or_else(|| SimError::InvalidState {
                domain: kind,
                year,
                reason: "no model for scheduled domain".into(),
            })?;
            let view = DependencyView::new(
                kind,
                year,
                scheduler.edges_of(kind),
                &previous,
                &staged,
                &self.fields,
            );
            let mut rng = year_rng(self.config.seed, kind, year);
            let next = model.step(year, &view, &mut rng)?;
            tracing::debug!("  {} stepped {} cities", kind, next.len());
            staged.insert(kind, next);
        }

        // 2. Record, then commit
        let snapshot = Arc::new(SystemSnapshot::from_states(staged.clone()));
        self.history.record(year, Arc::clone(&snapshot))?;
        for (kind, state) in staged {
            if let Some(model) = self.models.get_mut(&kind) {
                model.commit(state);
            }
        }
        self.latest = Some(snapshot);
        self.current_year += 1;
        Ok(())
    }

    /// Recompute one domain's state for a recorded year from the snapshot
    /// of the year before it. The result equals the recorded state.
    pub fn replay(&self, kind: DomainKind, year: Year) -> Result<DomainState> {
        let scheduler = self
            .scheduler
            .as_ref()
            .ok_or_else(|| self.lifecycle_error("replay"))?;
        let not_recorded = |reason: &str| SimError::InvalidState {
            domain: kind,
            year,
            reason: reason.to_string(),
        };

        let recorded = self
            .history
            .query(year)
            .ok_or_else(|| not_recorded("year not recorded"))?;
        let previous = if year == self.config.base_year {
            self.initial.clone()
        } else {
            year.checked_sub(1).and_then(|y| self.history.query(y))
        };
        let previous = previous.ok_or_else(|| not_recorded("previous year not recorded"))?;

        let spec = self
            .catalog
            .iter()
            .find(|s| s.kind == kind)
            .cloned()
            .ok_or_else(|| not_recorded("domain not in catalog"))?;
        let state = previous.domain(kind).cloned().unwrap_or_default();
        let model = DomainModel::from_recorded(spec, state);

        // same-year producers read what that year actually recorded
        let same_year: BTreeMap<DomainKind, DomainState> = scheduler
            .same_year_stage(kind)
            .into_iter()
            .filter_map(|p| recorded.domain(p).map(|s| (p, s.clone())))
            .collect();

        let view = DependencyView::new(
            kind,
            year,
            scheduler.edges_of(kind),
            &previous,
            &same_year,
            &self.fields,
        );
        let mut rng = year_rng(self.config.seed, kind, year);
        model.step(year, &view, &mut rng)
    }
}

fn snapshot_of(models: &BTreeMap<DomainKind, DomainModel>) -> SystemSnapshot {
    SystemSnapshot::from_states(
        models
            .iter()
            .map(|(kind, model)| (*kind, model.state().clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urban::domain::CityContext;
    use crate::urban::state::{CityRecord, FieldSpec};

    const GROWTH: &[FieldSpec] = &[
        FieldSpec::required("population", 0.0, 1e9),
        FieldSpec::parameter("growth_rate", 0.0, 0.1, 0.02),
    ];
    const COPY: &[FieldSpec] = &[FieldSpec::scalar("seen", 0.0, 1e9, 0.0)];

    fn grow(ctx: &mut CityContext<'_, '_>) -> Result<()> {
        let pop = ctx.value("population")?;
        let rate = ctx.value("growth_rate")?;
        let noise = ctx.uniform(0.9, 1.1);
        ctx.set("population", pop * (1.0 + rate * noise))
    }

    fn copy_population(ctx: &mut CityContext<'_, '_>) -> Result<()> {
        let pop = ctx.input(DomainKind::Growth, "population")?;
        ctx.set("seen", pop)
    }

    fn fail_in_2026(ctx: &mut CityContext<'_, '_>) -> Result<()> {
        if ctx.year() == 2026 {
            ctx.input(DomainKind::Economy, "gdp_per_capita")?;
        }
        Ok(())
    }

    fn catalog() -> Vec<DomainSpec> {
        vec![
            DomainSpec::new(DomainKind::Growth, GROWTH, grow),
            DomainSpec::new(DomainKind::Housing, COPY, copy_population).requires(DomainKind::Growth),
        ]
    }

    fn initial() -> InitialConfig {
        InitialConfig::new()
            .with_domain(
                DomainKind::Growth,
                DomainState::new()
                    .with_scalar("Alpha", "population", 1000.0)
                    .with_scalar("Alpha", "growth_rate", 0.05)
                    .with_scalar("Beta", "population", 500.0),
            )
            .with_domain(
                DomainKind::Housing,
                DomainState::new().with_scalar("Alpha", "seen", 0.0),
            )
    }

    fn ready() -> Simulation {
        let mut sim = Simulation::with_catalog(RunConfig::new(2025, 3, 9), catalog());
        sim.initialize(&initial()).unwrap();
        sim
    }

    #[test]
    fn test_initialize_builds_registry() {
        let sim = ready();
        assert_eq!(sim.status(), RunStatus::Ready);
        assert_eq!(sim.registry().len(), 2);
        assert_eq!(sim.current_year(), 2025);
        assert!(sim.history().is_empty());
        // Beta's growth rate was defaulted
        let beta = CityId::from("Beta");
        assert_eq!(
            sim.model(DomainKind::Growth).unwrap().state().scalar(&beta, "growth_rate"),
            Some(0.02)
        );
    }

    #[test]
    fn test_run_before_initialize_rejected() {
        let mut sim = Simulation::with_catalog(RunConfig::default(), catalog());
        assert!(matches!(
            sim.run(1),
            Err(SimError::InvalidLifecycle { status: RunStatus::Uninitialized, .. })
        ));
    }

    #[test]
    fn test_double_initialize_rejected() {
        let mut sim = ready();
        assert!(matches!(sim.initialize(&initial()), Err(SimError::InvalidLifecycle { .. })));
        assert_eq!(sim.status(), RunStatus::Ready);
    }

    #[test]
    fn test_run_records_one_entry_per_year() {
        let mut sim = ready();
        sim.run_configured().unwrap();
        assert_eq!(sim.status(), RunStatus::Completed);
        assert_eq!(sim.history().years().collect::<Vec<_>>(), vec![2025, 2026, 2027]);
        assert_eq!(sim.current_year(), 2028);
        assert!(matches!(sim.run(1), Err(SimError::InvalidLifecycle { .. })));
    }

    #[test]
    fn test_copy_sees_previous_year_population() {
        let mut sim = ready();
        sim.run(2).unwrap();
        let alpha = CityId::from("Alpha");
        let history = sim.history();
        let seen_2026 = history.query(2026).unwrap().scalar(DomainKind::Housing, &alpha, "seen");
        let pop_2025 = history.query(2025).unwrap().scalar(DomainKind::Growth, &alpha, "population");
        assert_eq!(seen_2026, pop_2025);

        let seen_2025 = history.query(2025).unwrap().scalar(DomainKind::Housing, &alpha, "seen");
        assert_eq!(seen_2025, Some(1000.0));
    }

    #[test]
    fn test_unknown_city_fails_initialization() {
        let config = initial().with_domain(
            DomainKind::Housing,
            DomainState::new().with_scalar("Gamma", "seen", 0.0),
        );
        let mut sim = Simulation::with_catalog(RunConfig::default(), catalog());
        assert!(matches!(sim.initialize(&config), Err(SimError::ConfigValidation(_))));
        assert_eq!(sim.status(), RunStatus::Failed);
        assert!(matches!(sim.run(1), Err(SimError::InvalidLifecycle { .. })));
    }

    #[test]
    fn test_domain_outside_catalog_rejected() {
        let config = initial().with_domain(DomainKind::Economy, DomainState::new());
        let mut sim = Simulation::with_catalog(RunConfig::default(), catalog());
        assert!(sim.initialize(&config).is_err());
    }

    #[test]
    fn test_failed_year_is_not_committed() {
        let mut specs = catalog();
        specs.push(DomainSpec::new(DomainKind::Governance, &[], fail_in_2026));
        let mut governance = DomainState::new();
        governance.insert_city(CityId::from("Alpha"), CityRecord::new());
        let mut sim = Simulation::with_catalog(RunConfig::new(2025, 3, 9), specs);
        sim.initialize(&initial().with_domain(DomainKind::Governance, governance)).unwrap();

        let err = sim.run(3).unwrap_err();
        assert!(matches!(err, SimError::InvalidState { domain: DomainKind::Governance, year: 2026, .. }));
        assert_eq!(sim.status(), RunStatus::Failed);
        assert_eq!(sim.history().final_year(), Some(2025));
        assert!(sim.history().query(2026).is_none());

        // models still hold the 2025 state
        let alpha = CityId::from("Alpha");
        assert_eq!(
            sim.model(DomainKind::Growth).unwrap().state().scalar(&alpha, "population"),
            sim.history().query(2025).unwrap().scalar(DomainKind::Growth, &alpha, "population")
        );
    }

    #[test]
    fn test_replay_reproduces_recorded_year() {
        let mut sim = ready();
        sim.run(3).unwrap();
        for year in 2025..=2027 {
            for kind in [DomainKind::Growth, DomainKind::Housing] {
                let replayed = sim.replay(kind, year).unwrap();
                let recorded = sim.history().query(year).unwrap();
                assert_eq!(Some(&replayed), recorded.domain(kind), "{} {}", kind, year);
            }
        }
        assert!(sim.replay(DomainKind::Growth, 2030).is_err());
    }
}
