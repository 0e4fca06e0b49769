//! Environment - air quality, green space, recycling, flood exposure

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::{FieldSpec, BREAKDOWN_TOTAL};

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("air_quality_index", 30.0, 500.0, 150.0),
    FieldSpec::scalar("green_space_ratio", 0.0, 1.0, 0.05),
    FieldSpec::parameter("flood_prone_area", 0.0, 1.0, 0.2),
    FieldSpec::scalar("waste_recycling_rate", 0.0, 0.6, 0.1),
];

const POPULATION_BASELINE: f64 = 10_000_000.0;
const COMMUTE_BASELINE: f64 = 60.0;
/// Green space ratio above which vegetation starts cleaning the air
const GREEN_BASELINE: f64 = 0.1;
const COLLECTION_BASELINE: f64 = 0.6;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let density = ctx.influence(DomainKind::Growth, "population", POPULATION_BASELINE)?;
    let traffic = ctx.influence(DomainKind::Transport, "avg_commute_time", COMMUTE_BASELINE)?;
    let green = ctx.value("green_space_ratio")?;
    let mitigation = 1.0 - green / GREEN_BASELINE;

    let aqi_change = density * ctx.uniform(2.0, 5.0) + traffic * ctx.uniform(1.0, 4.0)
        - mitigation * ctx.uniform(0.0, 2.0);
    let aqi = ctx.value("air_quality_index")?;
    ctx.set("air_quality_index", aqi + aqi_change)?;

    // Land use, when modeled, is authoritative for green space
    let land_green = ctx
        .input_breakdown(DomainKind::Growth, "land_use")?
        .and_then(|parts| parts.get("green").copied());
    match land_green {
        Some(percent) => ctx.set("green_space_ratio", percent / BREAKDOWN_TOTAL)?,
        None => {
            let loss = ctx.uniform(0.001, 0.005);
            ctx.set("green_space_ratio", green * (1.0 - loss))?;
        }
    }

    let collection = ctx.influence(DomainKind::Infrastructure, "waste_collection", COLLECTION_BASELINE)?;
    let recycling = ctx.value("waste_recycling_rate")?;
    let gain = ctx.uniform(0.005, 0.02) * collection;
    ctx.set("waste_recycling_rate", recycling * (1.0 + gain))?;

    Ok(())
}
