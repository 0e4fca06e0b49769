//! Built-in rule catalog, one module per domain

mod economy;
mod environment;
mod governance;
mod growth;
mod housing;
mod infrastructure;
mod resilience;
mod rural_linkage;
mod service_delivery;
mod smart_city;
mod social;
mod transport;

use crate::core::types::DomainKind;
use crate::urban::domain::DomainSpec;

/// All twelve domains in declaration order
pub fn catalog() -> Vec<DomainSpec> {
    DomainKind::ALL.iter().map(|kind| spec(*kind)).collect()
}

/// Field declarations, dependencies and update rule of one domain.
///
/// Every edge reads the previous year. Only edges reading growth are hard
/// dependencies; the rest fall back to documented defaults. Governance has
/// no inputs, which keeps the graph acyclic.
pub fn spec(kind: DomainKind) -> DomainSpec {
    use DomainKind::*;

    match kind {
        Growth => DomainSpec::new(kind, growth::FIELDS, growth::update),
        Housing => DomainSpec::new(kind, housing::FIELDS, housing::update)
            .requires(Growth)
            .reads(Economy),
        Infrastructure => DomainSpec::new(kind, infrastructure::FIELDS, infrastructure::update)
            .requires(Growth)
            .reads(Governance),
        Transport => DomainSpec::new(kind, transport::FIELDS, transport::update).requires(Growth),
        Economy => DomainSpec::new(kind, economy::FIELDS, economy::update).reads(Infrastructure),
        Governance => DomainSpec::new(kind, governance::FIELDS, governance::update),
        Environment => DomainSpec::new(kind, environment::FIELDS, environment::update)
            .requires(Growth)
            .reads(Transport)
            .reads(Infrastructure),
        Social => DomainSpec::new(kind, social::FIELDS, social::update)
            .reads(Economy)
            .reads(Governance)
            .reads(ServiceDelivery),
        RuralLinkage => DomainSpec::new(kind, rural_linkage::FIELDS, rural_linkage::update)
            .reads(Economy)
            .reads(Transport)
            .reads(Housing),
        ServiceDelivery => DomainSpec::new(kind, service_delivery::FIELDS, service_delivery::update)
            .requires(Growth)
            .reads(Governance),
        SmartCity => DomainSpec::new(kind, smart_city::FIELDS, smart_city::update)
            .reads(Infrastructure)
            .reads(Social),
        Resilience => DomainSpec::new(kind, resilience::FIELDS, resilience::update)
            .reads(Governance)
            .reads(Environment),
    }
}

/// Single-domain stepping for rule tests
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use crate::core::types::DomainKind;
    use crate::urban::domain::{year_rng, DomainModel};
    use crate::urban::snapshot::{DependencyView, FieldCatalog, SystemSnapshot};
    use crate::urban::state::DomainState;

    /// Step `kind` once for 2025 against the given producer states.
    /// Producers not listed are present but model no cities.
    pub fn step(
        kind: DomainKind,
        own: DomainState,
        producers: &[(DomainKind, DomainState)],
        seed: u64,
    ) -> DomainState {
        let spec = super::spec(kind);
        let model = DomainModel::new(spec.clone(), own).unwrap();

        let mut domains: BTreeMap<DomainKind, DomainState> = producers.iter().cloned().collect();
        for edge in &spec.dependencies {
            domains.entry(edge.producer).or_default();
        }
        domains.insert(kind, model.state().clone());
        let snapshot = SystemSnapshot::from_states(domains);

        let fields: FieldCatalog = super::catalog().iter().map(|s| (s.kind, s.fields)).collect();
        let staged = BTreeMap::new();
        let view = DependencyView::new(kind, 2025, &spec.dependencies, &snapshot, &staged, &fields);
        let mut rng = year_rng(seed, kind, 2025);
        model.step(2025, &view, &mut rng).unwrap()
    }
}
