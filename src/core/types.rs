//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Simulation year (the only time axis)
pub type Year = u32;

/// Stable identifier for a city
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub String);

impl CityId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CityId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for CityId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Indicator groups modeled for every city.
///
/// Declaration order matters: the scheduler breaks topological ties by it,
/// and the city registry is taken from the first declared domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Growth,
    Housing,
    Infrastructure,
    Transport,
    Economy,
    Governance,
    Environment,
    Social,
    RuralLinkage,
    ServiceDelivery,
    SmartCity,
    Resilience,
}

impl DomainKind {
    pub const ALL: [DomainKind; 12] = [
        DomainKind::Growth,
        DomainKind::Housing,
        DomainKind::Infrastructure,
        DomainKind::Transport,
        DomainKind::Economy,
        DomainKind::Governance,
        DomainKind::Environment,
        DomainKind::Social,
        DomainKind::RuralLinkage,
        DomainKind::ServiceDelivery,
        DomainKind::SmartCity,
        DomainKind::Resilience,
    ];

    /// Position in declaration order
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DomainKind::Growth => "growth",
            DomainKind::Housing => "housing",
            DomainKind::Infrastructure => "infrastructure",
            DomainKind::Transport => "transport",
            DomainKind::Economy => "economy",
            DomainKind::Governance => "governance",
            DomainKind::Environment => "environment",
            DomainKind::Social => "social",
            DomainKind::RuralLinkage => "rural_linkage",
            DomainKind::ServiceDelivery => "service_delivery",
            DomainKind::SmartCity => "smart_city",
            DomainKind::Resilience => "resilience",
        }
    }
}

impl std::fmt::Display for DomainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_index_matches_declaration_order() {
        for (i, kind) in DomainKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_domain_serde_name_matches_display() {
        for kind in DomainKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_city_id_ordering_and_display() {
        let a = CityId::from("Alpha");
        let b = CityId::new("Beta");
        assert!(a < b);
        assert_eq!(a.to_string(), "Alpha");
        assert_eq!(b.as_str(), "Beta");
    }

    #[test]
    fn test_city_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<CityId, u32> = HashMap::new();
        map.insert(CityId::from("Dhaka"), 1);
        assert_eq!(map.get(&CityId::from("Dhaka")), Some(&1));
    }
}
