//! Infrastructure - utility coverage and reliability

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("water_coverage", 0.0, 1.0, 0.5),
    FieldSpec::scalar("sanitation_coverage", 0.0, 1.0, 0.5),
    FieldSpec::scalar("power_reliability", 0.0, 1.0, 0.8),
    FieldSpec::scalar("waste_collection", 0.0, 1.0, 0.5),
    FieldSpec::scalar("internet_penetration", 0.0, 1.0, 0.5),
];

const REVENUE_BASELINE: f64 = 0.3;
/// Cities above this size see slower coverage gains
const STRAIN_POPULATION: f64 = 1_000_000.0;

/// Publicly funded utilities: (field, annual improvement range, strain factor)
const UTILITIES: &[(&str, (f64, f64), f64)] = &[
    ("water_coverage", (0.005, 0.02), 0.95),
    ("sanitation_coverage", (0.004, 0.018), 0.90),
    ("power_reliability", (0.002, 0.01), 0.97),
    ("waste_collection", (0.005, 0.02), 0.90),
];

/// Internet rollout is private and ignores municipal revenue
const INTERNET_IMPROVEMENT: (f64, f64) = (0.02, 0.05);

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let strained = ctx.input(DomainKind::Growth, "population")? > STRAIN_POPULATION;
    let investment = ctx.influence(DomainKind::Governance, "municipal_own_revenue", REVENUE_BASELINE)?;

    for &(field, (lo, hi), strain) in UTILITIES {
        let coverage = ctx.value(field)?;
        let mut improvement = ctx.uniform(lo, hi) * investment * (1.0 - coverage);
        if strained {
            improvement *= strain;
        }
        ctx.set(field, coverage + improvement)?;
    }

    let internet = ctx.value("internet_penetration")?;
    let gain = ctx.uniform(INTERNET_IMPROVEMENT.0, INTERNET_IMPROVEMENT.1) * (1.0 - internet);
    ctx.set("internet_penetration", internet + gain)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::types::{CityId, DomainKind};
    use crate::urban::domains::testing::step;
    use crate::urban::state::DomainState;

    #[test]
    fn test_coverage_improves_toward_full() {
        let own = DomainState::new()
            .with_scalar("Alpha", "water_coverage", 0.6)
            .with_scalar("Alpha", "power_reliability", 0.999);
        let growth = DomainState::new().with_scalar("Alpha", "population", 2_000_000.0);
        let next = step(DomainKind::Infrastructure, own, &[(DomainKind::Growth, growth)], 11);

        let alpha = CityId::from("Alpha");
        let water = next.scalar(&alpha, "water_coverage").unwrap();
        assert!(water > 0.6 && water < 0.61);
        let power = next.scalar(&alpha, "power_reliability").unwrap();
        assert!(power > 0.999 && power <= 1.0);
    }
}
