//! Service delivery - schools, hospital beds, public space

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    // per 10k residents
    FieldSpec::scalar("school_density", 0.1, 100.0, 4.0),
    FieldSpec::scalar("hospital_beds_per_1000", 0.5, 20.0, 1.5),
    // m² per resident
    FieldSpec::scalar("public_space_per_capita", 0.2, 50.0, 1.0),
];

const REVENUE_BASELINE: f64 = 0.3;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let revenue = ctx.influence(DomainKind::Governance, "municipal_own_revenue", REVENUE_BASELINE)?;
    // per-capita provision is diluted by population growth
    let growth = ctx.input(DomainKind::Growth, "growth_rate")?;

    let schools = ctx.value("school_density")?;
    let investment = ctx.uniform(0.002, 0.008) * revenue;
    ctx.set("school_density", schools * (1.0 + investment))?;

    let beds = ctx.value("hospital_beds_per_1000")?;
    let investment = ctx.uniform(0.003, 0.01) * revenue;
    ctx.set("hospital_beds_per_1000", beds * (1.0 + investment - growth * 0.5))?;

    let space = ctx.value("public_space_per_capita")?;
    let development = ctx.uniform(0.001, 0.005) * revenue;
    ctx.set("public_space_per_capita", space * (1.0 + development - growth))?;

    Ok(())
}
