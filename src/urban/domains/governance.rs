//! Governance - exogenous policy domain driven only by its own state

use crate::core::error::Result;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("municipal_own_revenue", 0.1, 0.8, 0.3),
    FieldSpec::scalar("citizen_satisfaction", 0.1, 0.9, 0.5),
    FieldSpec::scalar("planning_compliance", 0.2, 0.9, 0.45),
];

const SATISFACTION_DRIFT: (f64, f64) = (-0.015, 0.015);
const REVENUE_GROWTH: (f64, f64) = (0.001, 0.01);

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let satisfaction = ctx.value("citizen_satisfaction")?;
    let drift = ctx.uniform(SATISFACTION_DRIFT.0, SATISFACTION_DRIFT.1);
    ctx.set("citizen_satisfaction", satisfaction + drift)?;

    let revenue = ctx.value("municipal_own_revenue")?;
    let growth = ctx.uniform(REVENUE_GROWTH.0, REVENUE_GROWTH.1);
    ctx.set("municipal_own_revenue", revenue * (1.0 + growth))?;

    // Satisfied residents comply more
    let satisfaction = ctx.current("citizen_satisfaction")?;
    let compliance = ctx.value("planning_compliance")?;
    let noise = ctx.uniform(-0.01, 0.01);
    ctx.set(
        "planning_compliance",
        compliance * (1.0 + noise + (satisfaction - 0.5) * 0.01),
    )?;

    Ok(())
}
