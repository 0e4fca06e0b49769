//! Rural linkage - migration inflow and commuting
//!
//! Migration is a one-sided net inflow rate into the city; the rural side
//! is not modeled. Remittance dependency is a static per-city parameter.

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::parameter("remittance_dependency", 0.0, 1.0, 0.0),
    FieldSpec::scalar("rural_migration_rate", 0.001, 0.05, 0.01),
    FieldSpec::scalar("commuter_percentage", 0.05, 0.4, 0.1),
];

const UNEMPLOYMENT_BASELINE: f64 = 0.06;
const AFFORDABILITY_BASELINE: f64 = 12.0;
const COMMUTE_BASELINE: f64 = 50.0;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let unemployment = ctx.influence(DomainKind::Economy, "unemployment_rate", UNEMPLOYMENT_BASELINE)?;
    let affordability = ctx.influence(DomainKind::Housing, "affordability_ratio", AFFORDABILITY_BASELINE)?;
    let commute = ctx.influence(DomainKind::Transport, "avg_commute_time", COMMUTE_BASELINE)?;

    // Jobs pull migrants in, unaffordable housing pushes them away
    let migration = ctx.value("rural_migration_rate")?;
    let change = (unemployment - 1.0) * -0.1 + (affordability - 1.0) * -0.05 + ctx.uniform(-0.002, 0.002);
    ctx.set("rural_migration_rate", migration * (1.0 + change))?;

    // Long commutes discourage commuting, expensive housing encourages it
    let commuters = ctx.value("commuter_percentage")?;
    let change = (commute - 1.0) * -0.02 + (affordability - 1.0) * 0.03 + ctx.uniform(-0.005, 0.005);
    ctx.set("commuter_percentage", commuters * (1.0 + change))?;

    Ok(())
}
