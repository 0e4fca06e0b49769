//! Social - literacy, health access, cohesion and crime

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("literacy_rate", 0.0, 0.98, 0.7),
    FieldSpec::scalar("access_to_healthcare", 0.0, 0.99, 0.8),
    FieldSpec::scalar("social_cohesion_index", 0.2, 0.9, 0.6),
    // per 100k residents
    FieldSpec::scalar("crime_rate", 50.0, 2_000.0, 250.0),
];

const SCHOOL_BASELINE: f64 = 4.0;
const BEDS_BASELINE: f64 = 1.5;
const UNEMPLOYMENT_BASELINE: f64 = 0.07;
const CRIME_CEILING: f64 = 500.0;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let schools = ctx.influence(DomainKind::ServiceDelivery, "school_density", SCHOOL_BASELINE)?;
    let literacy = ctx.value("literacy_rate")?;
    let gain = ctx.uniform(0.003, 0.008) * schools;
    ctx.set("literacy_rate", literacy * (1.0 + gain))?;

    let beds = ctx.influence(DomainKind::ServiceDelivery, "hospital_beds_per_1000", BEDS_BASELINE)?;
    let access = ctx.value("access_to_healthcare")?;
    let gain = ctx.uniform(0.004, 0.012) * beds;
    ctx.set("access_to_healthcare", access * (1.0 + gain))?;

    let satisfaction = ctx.input(DomainKind::Governance, "citizen_satisfaction")?;
    let crime = ctx.value("crime_rate")?;
    let safety = 1.0 - crime / CRIME_CEILING;
    let cohesion = ctx.value("social_cohesion_index")?
        + (satisfaction - 0.5) * 0.03
        + (safety - 0.5) * 0.02
        + ctx.uniform(-0.01, 0.01);
    ctx.set("social_cohesion_index", cohesion)?;

    // Crime responds to this year's cohesion
    let cohesion = ctx.current("social_cohesion_index")?.clamp(0.2, 0.9);
    let unemployment = ctx.influence(DomainKind::Economy, "unemployment_rate", UNEMPLOYMENT_BASELINE)?;
    let disorder = (1.0 - cohesion) / 0.5;
    let multiplier = 1.0
        + (unemployment - 1.0) * 0.05
        + (disorder - 1.0) * 0.03
        + ctx.uniform(-0.02, 0.02);
    ctx.set("crime_rate", crime * multiplier)?;

    Ok(())
}
