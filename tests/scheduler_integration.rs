//! Integration tests for dependency ordering and cycle rejection

use std::collections::BTreeSet;

use urban_dynamics::core::config::{InitialConfig, RunConfig};
use urban_dynamics::core::error::SimError;
use urban_dynamics::core::types::DomainKind;
use urban_dynamics::urban::state::DomainState;
use urban_dynamics::urban::{domains, DomainSpec, RunStatus, Simulation};

fn one_city() -> InitialConfig {
    InitialConfig::new().with_domain(
        DomainKind::Growth,
        DomainState::new().with_scalar("Alpha", "population", 1_000_000.0),
    )
}

fn replace(specs: &mut [DomainSpec], spec: DomainSpec) {
    if let Some(slot) = specs.iter_mut().find(|s| s.kind == spec.kind) {
        *slot = spec;
    }
}

#[test]
fn test_default_catalog_order() {
    use DomainKind::*;

    let mut sim = Simulation::new(RunConfig::default());
    sim.initialize(&one_city()).unwrap();
    let scheduler = sim.scheduler().expect("scheduler built at initialize");

    assert_eq!(
        scheduler.evaluation_order(),
        &[
            Growth,
            Transport,
            Governance,
            Infrastructure,
            Economy,
            Housing,
            Environment,
            RuralLinkage,
            ServiceDelivery,
            Social,
            SmartCity,
            Resilience,
        ]
    );

    // every producer precedes its consumers
    let order = scheduler.evaluation_order();
    let position = |kind: DomainKind| order.iter().position(|k| *k == kind).unwrap();
    for edge in scheduler.edges() {
        assert!(
            position(edge.producer) < position(edge.consumer),
            "{} should precede {}",
            edge.producer,
            edge.consumer
        );
    }
}

#[test]
fn test_dependency_queries() {
    let mut sim = Simulation::new(RunConfig::default());
    sim.initialize(&one_city()).unwrap();
    let scheduler = sim.scheduler().unwrap();

    assert_eq!(
        scheduler.dependencies_of(DomainKind::Social),
        BTreeSet::from([DomainKind::Economy, DomainKind::Governance, DomainKind::ServiceDelivery])
    );
    assert!(scheduler.dependencies_of(DomainKind::Governance).is_empty());
    assert_eq!(scheduler.edges_of(DomainKind::Housing).len(), 2);
    assert!(scheduler.same_year_stage(DomainKind::Housing).is_empty());
}

#[test]
fn test_two_domain_cycle_fails_before_any_step() {
    // governance reading social closes governance -> social -> governance
    let mut specs = domains::catalog();
    replace(&mut specs, domains::spec(DomainKind::Governance).reads(DomainKind::Social));

    let mut sim = Simulation::with_catalog(RunConfig::new(2025, 3, 1), specs);
    match sim.initialize(&one_city()) {
        Err(SimError::CyclicDependency { involved }) => {
            assert!(involved.contains(&DomainKind::Governance));
            assert!(involved.contains(&DomainKind::Social));
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }

    assert_eq!(sim.status(), RunStatus::Failed);
    assert!(sim.history().is_empty());
    assert!(sim.scheduler().is_none());
    assert!(matches!(sim.run(1), Err(SimError::InvalidLifecycle { .. })));
    assert!(sim.history().is_empty());
}

#[test]
fn test_self_edge_is_a_cycle() {
    let mut specs = domains::catalog();
    replace(&mut specs, domains::spec(DomainKind::Economy).reads(DomainKind::Economy));

    let mut sim = Simulation::with_catalog(RunConfig::default(), specs);
    assert!(matches!(
        sim.initialize(&one_city()),
        Err(SimError::CyclicDependency { .. })
    ));
    assert_eq!(sim.status(), RunStatus::Failed);
}

#[test]
fn test_edge_to_domain_outside_catalog_rejected() {
    let specs = vec![
        domains::spec(DomainKind::Growth),
        domains::spec(DomainKind::Housing),
    ];
    // housing reads economy, which this catalog does not declare
    let mut sim = Simulation::with_catalog(RunConfig::default(), specs);
    assert!(matches!(
        sim.initialize(&one_city()),
        Err(SimError::ConfigValidation(_))
    ));
}
