//! Within-year evaluation order
//!
//! Domains and their dependency edges form a DAG. The scheduler validates it
//! once at construction and fixes a total order with Kahn's algorithm,
//! always taking the ready domain declared earliest so the order is
//! reproducible.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;

use crate::core::error::{Result, SimError};
use crate::core::types::DomainKind;
use crate::urban::domain::{Coupling, DependencyEdge};

#[derive(Debug, Clone)]
pub struct Scheduler {
    order: Vec<DomainKind>,
    edges: BTreeMap<DomainKind, Vec<DependencyEdge>>,
}

impl Scheduler {
    /// `domains` is the declaration order used for tie-breaking
    pub fn new(domains: &[DomainKind], edges: &[DependencyEdge]) -> Result<Self> {
        let position: AHashMap<DomainKind, usize> =
            domains.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        if position.len() != domains.len() {
            return Err(SimError::ConfigValidation(
                "a domain is declared more than once".into(),
            ));
        }

        let mut by_consumer: BTreeMap<DomainKind, Vec<DependencyEdge>> =
            domains.iter().map(|d| (*d, Vec::new())).collect();
        let mut in_degree = vec![0usize; domains.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); domains.len()];
        let mut seen: BTreeSet<(DomainKind, DomainKind)> = BTreeSet::new();

        for edge in edges {
            let consumer = *position.get(&edge.consumer).ok_or_else(|| {
                SimError::ConfigValidation(format!("edge consumer {} is not a declared domain", edge.consumer))
            })?;
            let producer = *position.get(&edge.producer).ok_or_else(|| {
                SimError::ConfigValidation(format!("edge producer {} is not a declared domain", edge.producer))
            })?;
            if !seen.insert((edge.consumer, edge.producer)) {
                return Err(SimError::ConfigValidation(format!(
                    "{} declares {} as a dependency more than once",
                    edge.consumer, edge.producer
                )));
            }
            in_degree[consumer] += 1;
            dependents[producer].push(consumer);
            by_consumer.entry(edge.consumer).or_default().push(*edge);
        }

        let mut ready: BTreeSet<usize> = (0..domains.len()).filter(|i| in_degree[*i] == 0).collect();
        let mut order = Vec::with_capacity(domains.len());

        while let Some(next) = ready.pop_first() {
            order.push(domains[next]);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != domains.len() {
            let involved: Vec<DomainKind> = (0..domains.len())
                .filter(|i| in_degree[*i] > 0)
                .map(|i| domains[i])
                .collect();
            tracing::warn!("dependency cycle among {:?}", involved);
            return Err(SimError::CyclicDependency { involved });
        }

        Ok(Self {
            order,
            edges: by_consumer,
        })
    }

    pub fn evaluation_order(&self) -> &[DomainKind] {
        &self.order
    }

    /// Producers `domain` reads, regardless of coupling
    pub fn dependencies_of(&self, domain: DomainKind) -> BTreeSet<DomainKind> {
        self.edges_of(domain).iter().map(|e| e.producer).collect()
    }

    pub fn edges_of(&self, domain: DomainKind) -> &[DependencyEdge] {
        self.edges.get(&domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Producers read with same-year coupling; all precede `domain` in the order
    pub fn same_year_stage(&self, domain: DomainKind) -> BTreeSet<DomainKind> {
        self.edges_of(domain)
            .iter()
            .filter(|e| e.coupling == Coupling::SameYear)
            .map(|e| e.producer)
            .collect()
    }

    /// All edges, grouped by consumer in declaration order
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.values().flatten()
    }
}
