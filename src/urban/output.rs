//! Simulation output and serialization

use serde::Serialize;

use crate::core::config::RunConfig;
use crate::core::types::{CityId, DomainKind, Year};
use crate::urban::history::History;
use crate::urban::simulation::{RunStatus, Simulation};

/// Complete simulation output
#[derive(Clone, Debug, Serialize)]
pub struct SimulationOutput {
    pub run: RunConfig,
    pub status: RunStatus,
    pub statistics: SimulationStats,
    pub cities: Vec<CityGrowth>,
    pub history: History,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationStats {
    pub years_simulated: u32,
    pub first_year: Option<Year>,
    pub final_year: Option<Year>,
    pub cities: u32,
    pub domains: u32,
}

/// Population change of one city between the initial state and the final year
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CityGrowth {
    pub city: CityId,
    pub initial_population: f64,
    pub final_population: f64,
    pub growth_percent: f64,
}

impl SimulationOutput {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let history = sim.history().clone();
        let initial = sim.initial_snapshot();
        let last = history.final_year().and_then(|y| history.query(y));

        let cities = match (initial, last) {
            (Some(initial), Some(last)) => sim
                .registry()
                .iter()
                .filter_map(|city| {
                    let before = initial.scalar(DomainKind::Growth, city, "population")?;
                    let after = last.scalar(DomainKind::Growth, city, "population")?;
                    let growth_percent = if before > 0.0 {
                        (after / before - 1.0) * 100.0
                    } else {
                        0.0
                    };
                    Some(CityGrowth {
                        city: city.clone(),
                        initial_population: before,
                        final_population: after,
                        growth_percent,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        let statistics = SimulationStats {
            years_simulated: history.len() as u32,
            first_year: history.first_year(),
            final_year: history.final_year(),
            cities: sim.registry().len() as u32,
            domains: sim.scheduler().map(|s| s.evaluation_order().len()).unwrap_or(0) as u32,
        };

        Self {
            run: sim.config().clone(),
            status: sim.status(),
            statistics,
            cities,
            history,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Simulated {} years ({}) over {} cities and {} domains, status {:?}",
            self.statistics.years_simulated,
            match (self.statistics.first_year, self.statistics.final_year) {
                (Some(first), Some(last)) => format!("{}-{}", first, last),
                _ => "none".to_string(),
            },
            self.statistics.cities,
            self.statistics.domains,
            self.status,
        );
        for city in &self.cities {
            out.push_str(&format!(
                "\n  {}: population {:.0} -> {:.0} ({:+.1}%)",
                city.city, city.initial_population, city.final_population, city.growth_percent
            ));
        }
        out
    }
}
