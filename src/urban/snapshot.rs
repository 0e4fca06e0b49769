//! Frozen cross-domain state and the restricted view handed to each step

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{CityId, DomainKind, Year};
use crate::urban::domain::{Coupling, DependencyEdge, MissingCityPolicy};
use crate::urban::state::{DomainState, FieldKind, FieldSpec};

/// Immutable state of every domain at one point in time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemSnapshot {
    domains: BTreeMap<DomainKind, DomainState>,
}

impl SystemSnapshot {
    pub fn from_states(domains: BTreeMap<DomainKind, DomainState>) -> Self {
        Self { domains }
    }

    pub fn domain(&self, kind: DomainKind) -> Option<&DomainState> {
        self.domains.get(&kind)
    }

    pub fn domains(&self) -> impl Iterator<Item = (DomainKind, &DomainState)> {
        self.domains.iter().map(|(k, v)| (*k, v))
    }

    pub fn scalar(&self, kind: DomainKind, city: &CityId, field: &str) -> Option<f64> {
        self.domains.get(&kind)?.scalar(city, field)
    }

    pub fn breakdown(
        &self,
        kind: DomainKind,
        city: &CityId,
        field: &str,
    ) -> Option<&BTreeMap<String, f64>> {
        self.domains.get(&kind)?.breakdown(city, field)
    }
}

/// Field declarations of every domain in a run, for default and kind lookups
pub type FieldCatalog = AHashMap<DomainKind, &'static [FieldSpec]>;

/// Read-only access to exactly the producers a consumer declared.
///
/// `PreviousYear` edges read the frozen start-of-year snapshot; `SameYear`
/// edges read the producer's already staged output for the year in progress.
pub struct DependencyView<'a> {
    consumer: DomainKind,
    year: Year,
    edges: &'a [DependencyEdge],
    previous: &'a SystemSnapshot,
    staged: &'a BTreeMap<DomainKind, DomainState>,
    fields: &'a FieldCatalog,
}

impl<'a> DependencyView<'a> {
    pub fn new(
        consumer: DomainKind,
        year: Year,
        edges: &'a [DependencyEdge],
        previous: &'a SystemSnapshot,
        staged: &'a BTreeMap<DomainKind, DomainState>,
        fields: &'a FieldCatalog,
    ) -> Self {
        Self { consumer, year, edges, previous, staged, fields }
    }

    pub fn consumer(&self) -> DomainKind {
        self.consumer
    }

    pub fn year(&self) -> Year {
        self.year
    }

    fn invalid(&self, reason: String) -> SimError {
        SimError::InvalidState {
            domain: self.consumer,
            year: self.year,
            reason,
        }
    }

    fn edge(&self, producer: DomainKind) -> Result<&DependencyEdge> {
        self.edges
            .iter()
            .find(|e| e.consumer == self.consumer && e.producer == producer)
            .ok_or_else(|| self.invalid(format!("{} is not a declared dependency", producer)))
    }

    fn field_spec(&self, producer: DomainKind, field: &str) -> Result<&'static FieldSpec> {
        self.fields
            .get(&producer)
            .copied()
            .and_then(|specs| specs.iter().find(|f| f.name == field))
            .ok_or_else(|| self.invalid(format!("{} declares no field '{}'", producer, field)))
    }

    /// Whole producer state, honouring the edge's coupling
    pub fn state(&self, producer: DomainKind) -> Result<&'a DomainState> {
        let edge = self.edge(producer)?;
        let source = match edge.coupling {
            Coupling::PreviousYear => self.previous.domain(producer),
            Coupling::SameYear => self.staged.get(&producer),
        };
        source.ok_or_else(|| {
            self.invalid(format!("no {:?} state available for {}", edge.coupling, producer))
        })
    }

    /// Scalar value of a producer field for one city
    pub fn scalar(&self, producer: DomainKind, city: &CityId, field: &str) -> Result<f64> {
        let edge = *self.edge(producer)?;
        let spec = self.field_spec(producer, field)?;
        if spec.kind == FieldKind::Breakdown {
            return Err(self.invalid(format!("{}.{} is a breakdown, not a scalar", producer, field)));
        }
        let state = self.state(producer)?;
        match state.city(city) {
            Some(record) => record
                .get(field)
                .and_then(|v| v.as_scalar())
                .ok_or_else(|| self.invalid(format!("{}.{} missing for {}", producer, field, city))),
            None => match (edge.policy, spec.default) {
                (MissingCityPolicy::UseDefault, Some(default)) => Ok(default),
                _ => Err(self.invalid(format!("{} has no entry for city {}", producer, city))),
            },
        }
    }

    /// Breakdown of a producer field for one city; `None` when not modeled there
    pub fn breakdown(
        &self,
        producer: DomainKind,
        city: &CityId,
        field: &str,
    ) -> Result<Option<&'a BTreeMap<String, f64>>> {
        let edge = *self.edge(producer)?;
        let spec = self.field_spec(producer, field)?;
        if spec.kind != FieldKind::Breakdown {
            return Err(self.invalid(format!("{}.{} is not a breakdown", producer, field)));
        }
        let state = self.state(producer)?;
        match state.city(city) {
            Some(record) => Ok(record.get(field).and_then(|v| v.as_breakdown())),
            None => match edge.policy {
                MissingCityPolicy::UseDefault => Ok(None),
                MissingCityPolicy::Fail => {
                    Err(self.invalid(format!("{} has no entry for city {}", producer, city)))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROWTH_FIELDS: &[FieldSpec] = &[
        FieldSpec::required("population", 0.0, 1e9),
        FieldSpec::breakdown("land_use"),
    ];
    const ECONOMY_FIELDS: &[FieldSpec] = &[FieldSpec::scalar("gdp_per_capita", 100.0, 1e6, 5000.0)];

    fn fixture() -> (SystemSnapshot, FieldCatalog) {
        let mut domains = BTreeMap::new();
        domains.insert(
            DomainKind::Growth,
            DomainState::new()
                .with_scalar("Alpha", "population", 1000.0)
                .with_breakdown("Alpha", "land_use", &[("green", 100.0)]),
        );
        domains.insert(
            DomainKind::Economy,
            DomainState::new().with_scalar("Alpha", "gdp_per_capita", 6000.0),
        );
        let mut fields = FieldCatalog::new();
        fields.insert(DomainKind::Growth, GROWTH_FIELDS);
        fields.insert(DomainKind::Economy, ECONOMY_FIELDS);
        (SystemSnapshot::from_states(domains), fields)
    }

    fn housing_edges() -> Vec<DependencyEdge> {
        vec![
            DependencyEdge::new(DomainKind::Housing, DomainKind::Growth, MissingCityPolicy::Fail),
            DependencyEdge::new(DomainKind::Housing, DomainKind::Economy, MissingCityPolicy::UseDefault),
        ]
    }

    #[test]
    fn test_reads_declared_producer() {
        let (snapshot, fields) = fixture();
        let edges = housing_edges();
        let staged = BTreeMap::new();
        let view = DependencyView::new(DomainKind::Housing, 2025, &edges, &snapshot, &staged, &fields);
        let alpha = CityId::from("Alpha");
        assert_eq!(view.scalar(DomainKind::Growth, &alpha, "population").unwrap(), 1000.0);
        assert!(view.breakdown(DomainKind::Growth, &alpha, "land_use").unwrap().is_some());
    }

    #[test]
    fn test_undeclared_producer_is_inaccessible() {
        let (snapshot, fields) = fixture();
        let edges = housing_edges();
        let staged = BTreeMap::new();
        let view = DependencyView::new(DomainKind::Transport, 2025, &edges, &snapshot, &staged, &fields);
        let err = view
            .scalar(DomainKind::Growth, &CityId::from("Alpha"), "population")
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidState { domain: DomainKind::Transport, .. }));
    }

    #[test]
    fn test_missing_city_follows_edge_policy() {
        let (snapshot, fields) = fixture();
        let edges = housing_edges();
        let staged = BTreeMap::new();
        let view = DependencyView::new(DomainKind::Housing, 2025, &edges, &snapshot, &staged, &fields);
        let beta = CityId::from("Beta");

        assert_eq!(view.scalar(DomainKind::Economy, &beta, "gdp_per_capita").unwrap(), 5000.0);
        assert!(matches!(
            view.scalar(DomainKind::Growth, &beta, "population"),
            Err(SimError::InvalidState { .. })
        ));
        assert!(view.breakdown(DomainKind::Growth, &beta, "land_use").is_err());
    }

    #[test]
    fn test_undeclared_field_is_invalid() {
        let (snapshot, fields) = fixture();
        let edges = housing_edges();
        let staged = BTreeMap::new();
        let view = DependencyView::new(DomainKind::Housing, 2025, &edges, &snapshot, &staged, &fields);
        assert!(view
            .scalar(DomainKind::Economy, &CityId::from("Alpha"), "inflation")
            .is_err());
        assert!(view
            .scalar(DomainKind::Growth, &CityId::from("Alpha"), "land_use")
            .is_err());
    }

    #[test]
    fn test_same_year_edge_reads_staged_output() {
        let (snapshot, fields) = fixture();
        let edges = vec![DependencyEdge::new(
            DomainKind::Housing,
            DomainKind::Growth,
            MissingCityPolicy::Fail,
        )
        .same_year()];
        let mut staged = BTreeMap::new();
        staged.insert(
            DomainKind::Growth,
            DomainState::new().with_scalar("Alpha", "population", 2000.0),
        );
        let view = DependencyView::new(DomainKind::Housing, 2025, &edges, &snapshot, &staged, &fields);
        let pop = view
            .scalar(DomainKind::Growth, &CityId::from("Alpha"), "population")
            .unwrap();
        assert_eq!(pop, 2000.0);
    }
}
