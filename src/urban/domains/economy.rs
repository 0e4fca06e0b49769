//! Economy - output, jobs and sectoral structure

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    // USD
    FieldSpec::scalar("gdp_per_capita", 100.0, 200_000.0, 4_000.0),
    FieldSpec::scalar("unemployment_rate", 0.02, 0.15, 0.07),
    FieldSpec::breakdown("sectoral_employment"),
    FieldSpec::scalar("informal_economy_share", 0.1, 0.5, 0.3),
];

const BASE_GROWTH: (f64, f64) = (0.04, 0.07);
const POWER_BASELINE: f64 = 0.9;
const INTERNET_BASELINE: f64 = 0.6;
const GDP_BASELINE: f64 = 5_000.0;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let power = ctx.influence(DomainKind::Infrastructure, "power_reliability", POWER_BASELINE)?;
    let internet = ctx.influence(DomainKind::Infrastructure, "internet_penetration", INTERNET_BASELINE)?;
    let infra_multiplier = (power + internet) / 2.0;

    let growth = ctx.uniform(BASE_GROWTH.0, BASE_GROWTH.1) * infra_multiplier;
    let gdp = ctx.value("gdp_per_capita")? * (1.0 + growth);
    ctx.set("gdp_per_capita", gdp)?;

    // Unemployment falls when growth beats 5%
    let unemployment = ctx.value("unemployment_rate")?;
    let noise = ctx.uniform(-0.005, 0.005);
    ctx.set("unemployment_rate", unemployment * (1.0 - (growth - 0.05) * 0.1 + noise))?;

    if let Some(mut sectors) = ctx.breakdown("sectoral_employment") {
        let shift = gdp / GDP_BASELINE * 0.1 * ctx.uniform(0.01, 0.05);
        let industry = sectors.get("industry").copied().unwrap_or(0.0);
        let informal = sectors.get("informal").copied().unwrap_or(0.0);
        let from_industry = industry * shift * 0.6;
        let from_informal = informal * shift * 0.4;

        *sectors.entry("services".to_string()).or_insert(0.0) += from_industry + from_informal;
        sectors.insert("industry".to_string(), industry - from_industry);
        sectors.insert("informal".to_string(), informal - from_informal);
        ctx.set_breakdown("sectoral_employment", sectors)?;
    }

    let share = ctx.value("informal_economy_share")?;
    let noise = ctx.uniform(-0.005, 0.005);
    ctx.set("informal_economy_share", share * (1.0 - (growth - 0.04) * 0.05 + noise))?;

    Ok(())
}
