//! Growth - population and land-use pressure

use crate::core::error::Result;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("population", 0.0, 1e9),
    FieldSpec::parameter("growth_rate", 0.0, 0.1, 0.02),
    FieldSpec::breakdown("land_use"),
];

/// Year-to-year multiplier on the base growth rate
const RATE_VARIATION: (f64, f64) = (0.9, 1.1);
/// Land-use change per unit of relative population increase
const LAND_DEMAND_FACTOR: f64 = 0.2;
/// Share of converted green land that becomes informal settlement
const INFORMAL_SHARE: f64 = 0.7;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let population = ctx.value("population")?;
    let rate = ctx.value("growth_rate")?;
    let variation = ctx.uniform(RATE_VARIATION.0, RATE_VARIATION.1);

    let next = (population + population * rate * variation).floor().max(0.0);
    ctx.set("population", next)?;

    let Some(mut land_use) = ctx.breakdown("land_use") else {
        return Ok(());
    };
    if population <= 0.0 || next <= population {
        return Ok(());
    }

    // Green land goes first
    let increase = (next - population) / population;
    let green = land_use.get("green").copied().unwrap_or(0.0);
    let converted = (green * increase * LAND_DEMAND_FACTOR).min(green);
    if converted > 0.0 {
        land_use.insert("green".to_string(), green - converted);
        *land_use.entry("informal".to_string()).or_insert(0.0) += converted * INFORMAL_SHARE;
        *land_use.entry("residential".to_string()).or_insert(0.0) += converted * (1.0 - INFORMAL_SHARE);
        ctx.set_breakdown("land_use", land_use)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::types::{CityId, DomainKind};
    use crate::urban::domains::testing::step;
    use crate::urban::state::DomainState;

    #[test]
    fn test_population_grows_within_variation() {
        let own = DomainState::new()
            .with_scalar("Alpha", "population", 1_000_000.0)
            .with_scalar("Alpha", "growth_rate", 0.03);
        let next = step(DomainKind::Growth, own, &[], 1);
        let pop = next.scalar(&CityId::from("Alpha"), "population").unwrap();
        assert!(pop >= 1_000_000.0 * (1.0 + 0.03 * 0.9) - 1.0);
        assert!(pop <= 1_000_000.0 * (1.0 + 0.03 * 1.1));
        assert_eq!(pop, pop.floor());
    }

    #[test]
    fn test_growth_converts_green_land() {
        let own = DomainState::new()
            .with_scalar("Alpha", "population", 1_000_000.0)
            .with_scalar("Alpha", "growth_rate", 0.05)
            .with_breakdown(
                "Alpha",
                "land_use",
                &[("residential", 40.0), ("informal", 15.0), ("green", 45.0)],
            );
        let next = step(DomainKind::Growth, own, &[], 3);
        let land_use = next.breakdown(&CityId::from("Alpha"), "land_use").unwrap();
        assert!(land_use["green"] < 45.0);
        assert!(land_use["informal"] > 15.0);
        assert!((land_use.values().sum::<f64>() - 100.0).abs() < 1e-9);
    }
}
