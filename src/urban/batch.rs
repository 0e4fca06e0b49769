//! Independent runs in parallel
//!
//! Every run owns its own registry, models and history, so runs share
//! nothing and can go on separate rayon workers. Results keep input order.

use rayon::prelude::*;

use crate::core::config::ScenarioFile;
use crate::core::error::Result;
use crate::urban::simulation::Simulation;

/// Initialize and run one scenario to completion
pub fn run_scenario(scenario: &ScenarioFile) -> Result<Simulation> {
    let mut sim = Simulation::from_scenario(scenario)?;
    sim.run_configured()?;
    Ok(sim)
}

/// Run `template` once per seed
pub fn sweep(template: &ScenarioFile, seeds: &[u64]) -> Vec<Result<Simulation>> {
    tracing::info!("Sweeping {} seeds", seeds.len());
    seeds
        .par_iter()
        .map(|&seed| {
            let mut scenario = template.clone();
            scenario.run.seed = seed;
            run_scenario(&scenario)
        })
        .collect()
}

/// Run each scenario independently
pub fn sweep_scenarios(scenarios: &[ScenarioFile]) -> Vec<Result<Simulation>> {
    scenarios.par_iter().map(run_scenario).collect()
}
