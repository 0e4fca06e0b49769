//! Transport - commute times, modal split, network growth

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::breakdown("modal_split"),
    // minutes
    FieldSpec::scalar("avg_commute_time", 15.0, 240.0, 60.0),
    // km per km²
    FieldSpec::scalar("road_density", 1.0, 100.0, 10.0),
    FieldSpec::scalar("public_transit_coverage", 0.0, 1.0, 0.4),
];

/// Population treated as "dense" when scaling congestion
const DENSITY_BASELINE: f64 = 18_000_000.0;
const ROAD_BASELINE: f64 = 15.0;
const TRANSIT_BASELINE: f64 = 0.4;
const COMMUTE_BASELINE: f64 = 60.0;

/// Where riders leaving walking and rickshaws go
const SHIFT_TARGETS: &[(&str, f64)] = &[("bus", 0.6), ("car_taxi", 0.3), ("other", 0.1)];

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let density = ctx.influence(DomainKind::Growth, "population", DENSITY_BASELINE)?;
    let road = ctx.value("road_density")?;
    let transit = ctx.value("public_transit_coverage")?;

    let commute = ctx.value("avg_commute_time")?;
    let change = ctx.uniform(0.005, 0.02) + density * 0.03
        - (road / ROAD_BASELINE - 1.0) * 0.01
        - (transit - TRANSIT_BASELINE) * 0.02;
    let commute = commute * (1.0 + change);
    ctx.set("avg_commute_time", commute)?;

    if let Some(mut split) = ctx.breakdown("modal_split") {
        let walk = split.get("walk").copied().unwrap_or(0.0);
        let rickshaw = split.get("rickshaw").copied().unwrap_or(0.0);
        let slow = walk + rickshaw;

        let transit_pull = (transit - TRANSIT_BASELINE) * 0.1;
        let congestion = (commute / COMMUTE_BASELINE - 1.0) * 0.05;
        let fraction = ctx.uniform(0.01, 0.05);
        let shift = ((walk * (congestion + transit_pull * 0.5)
            + rickshaw * (congestion * 0.5 + transit_pull * 0.8))
            * fraction)
            .max(0.0)
            .min(slow);

        if shift > 0.0 {
            split.insert("walk".to_string(), walk - walk / slow * shift);
            split.insert("rickshaw".to_string(), rickshaw - rickshaw / slow * shift);
            for (mode, share) in SHIFT_TARGETS {
                *split.entry(mode.to_string()).or_insert(0.0) += shift * share;
            }
            ctx.set_breakdown("modal_split", split)?;
        }
    }

    let road_growth = ctx.uniform(0.001, 0.005);
    ctx.set("road_density", road * (1.0 + road_growth))?;
    let transit_growth = ctx.uniform(0.005, 0.025);
    ctx.set("public_transit_coverage", transit * (1.0 + transit_growth))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::types::{CityId, DomainKind};
    use crate::urban::domains::testing::step;
    use crate::urban::state::DomainState;

    #[test]
    fn test_congestion_shifts_riders_to_motorized_modes() {
        let own = DomainState::new()
            .with_scalar("Alpha", "avg_commute_time", 120.0)
            .with_breakdown(
                "Alpha",
                "modal_split",
                &[("walk", 30.0), ("rickshaw", 25.0), ("bus", 20.0), ("car_taxi", 15.0), ("other", 10.0)],
            );
        let growth = DomainState::new().with_scalar("Alpha", "population", 18_000_000.0);
        let next = step(DomainKind::Transport, own, &[(DomainKind::Growth, growth)], 2);

        let alpha = CityId::from("Alpha");
        let split = next.breakdown(&alpha, "modal_split").unwrap();
        assert!(split["walk"] < 30.0);
        assert!(split["bus"] > 20.0);
        assert!((split.values().sum::<f64>() - 100.0).abs() < 1e-9);
        assert!(next.scalar(&alpha, "avg_commute_time").unwrap() > 120.0);
    }
}
