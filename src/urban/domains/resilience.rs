//! Resilience - early warning, building codes, disaster recovery

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("early_warning_coverage", 0.0, 1.0, 0.7),
    FieldSpec::scalar("building_code_compliance", 0.0, 0.95, 0.5),
    // days; lower is better
    FieldSpec::scalar("disaster_recovery_speed", 1.0, 60.0, 10.0),
];

const REVENUE_BASELINE: f64 = 0.3;
const FLOOD_BASELINE: f64 = 0.2;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let investment = ctx.influence(DomainKind::Governance, "municipal_own_revenue", REVENUE_BASELINE)?;
    let exposure = ctx.influence(DomainKind::Environment, "flood_prone_area", FLOOD_BASELINE)?;

    // Flood-prone cities invest harder in warning systems
    let warning = ctx.value("early_warning_coverage")?;
    let gain = ctx.uniform(0.01, 0.03) * investment * (1.0 + exposure * 0.5);
    ctx.set("early_warning_coverage", warning * (1.0 + gain))?;

    let compliance = ctx.input(DomainKind::Governance, "planning_compliance")?;
    let codes = ctx.value("building_code_compliance")?;
    let gain = ctx.uniform(0.005, 0.015) * compliance;
    ctx.set("building_code_compliance", codes * (1.0 + gain))?;

    let capacity = ctx.input(DomainKind::Governance, "citizen_satisfaction")?;
    let recovery = ctx.value("disaster_recovery_speed")?;
    let improvement = ctx.uniform(0.01, 0.04) * capacity;
    ctx.set("disaster_recovery_speed", recovery * (1.0 - improvement))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::types::{CityId, DomainKind};
    use crate::urban::domains::testing::step;
    use crate::urban::state::DomainState;

    #[test]
    fn test_missing_producers_fall_back_to_defaults() {
        let own = DomainState::new().with_scalar("Alpha", "disaster_recovery_speed", 10.0);
        let next = step(DomainKind::Resilience, own, &[], 12);

        let alpha = CityId::from("Alpha");
        // satisfaction defaults to 0.5: recovery improves 0.5-2%
        let recovery = next.scalar(&alpha, "disaster_recovery_speed").unwrap();
        assert!(recovery > 9.79 && recovery < 9.96, "recovery {}", recovery);
        assert!(next.scalar(&alpha, "early_warning_coverage").unwrap() > 0.7);
    }
}
