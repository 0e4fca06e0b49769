//! Urban dynamics simulation binary

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use urban_dynamics::core::config::ScenarioFile;
use urban_dynamics::core::error::Result;
use urban_dynamics::urban::batch;
use urban_dynamics::urban::SimulationOutput;

#[derive(Parser, Debug)]
#[command(name = "urban_sim")]
#[command(about = "Run the annual urban dynamics simulation for a scenario")]
struct Args {
    /// Scenario TOML with a [run] table and initial domain states
    #[arg(long, default_value = "data/bangladesh.toml")]
    config: PathBuf,

    /// Number of years to simulate (overrides the scenario)
    #[arg(long)]
    years: Option<u32>,

    /// Random seed (overrides the scenario)
    #[arg(long)]
    seed: Option<u64>,

    /// First simulated year (overrides the scenario)
    #[arg(long)]
    base_year: Option<u32>,

    /// Where to write the JSON output
    #[arg(long, default_value = "simulation_output.json")]
    output: PathBuf,

    /// Also run this many consecutive seeds in parallel and print their summaries
    #[arg(long)]
    sweep: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("urban_dynamics=info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut scenario = ScenarioFile::load(&args.config)?;
    if let Some(years) = args.years {
        scenario.run.years = years;
    }
    if let Some(seed) = args.seed {
        scenario.run.seed = seed;
    }
    if let Some(base_year) = args.base_year {
        scenario.run.base_year = base_year;
    }
    scenario.run.validate()?;

    println!("Urban Dynamics Simulation");
    println!("=========================");
    println!("Scenario: {}", args.config.display());
    println!(
        "Years: {} from {}, seed {}",
        scenario.run.years, scenario.run.base_year, scenario.run.seed
    );
    println!();

    let start = Instant::now();
    let sim = batch::run_scenario(&scenario)?;
    let output = SimulationOutput::from_simulation(&sim);

    println!("{}", output.summary());
    println!("Actual time: {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    std::fs::write(&args.output, output.to_json())?;
    println!("\nFull output written to {}", args.output.display());

    if let Some(count) = args.sweep {
        let seeds: Vec<u64> = (0..count).map(|i| scenario.run.seed.wrapping_add(i)).collect();
        println!("\n--- Seed Sweep ---");
        for (seed, result) in seeds.iter().zip(batch::sweep(&scenario, &seeds)) {
            match result {
                Ok(sim) => {
                    let output = SimulationOutput::from_simulation(&sim);
                    let total: f64 = output.cities.iter().map(|c| c.final_population).sum();
                    println!("seed {}: total population {:.0}", seed, total);
                }
                Err(e) => println!("seed {}: failed: {}", seed, e),
            }
        }
    }

    Ok(())
}
