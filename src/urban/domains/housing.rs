//! Housing - stock, prices, rents and affordability

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("formal_stock", 0.0, 1e8, 0.0),
    FieldSpec::scalar("informal_stock", 0.0, 1e8, 0.0),
    // lakh BDT
    FieldSpec::scalar("avg_house_price", 1.0, 10_000.0, 50.0),
    // BDT per month
    FieldSpec::scalar("avg_rent", 1_000.0, 1e6, 15_000.0),
    // price-to-income
    FieldSpec::scalar("affordability_ratio", 5.0, 100.0, 15.0),
];

const HOUSEHOLD_SIZE: f64 = 4.5;
/// Share of the deficit met by new construction each year
const FORMAL_BUILD: (f64, f64) = (0.02, 0.05);
const INFORMAL_BUILD: (f64, f64) = (0.10, 0.20);
/// Demand pressure assumed when there is no stock to compare against
const EMPTY_STOCK_PRESSURE: f64 = 0.1;
const GDP_BASELINE: f64 = 5_000.0;

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let population = ctx.input(DomainKind::Growth, "population")?;
    let gdp_factor = ctx.influence(DomainKind::Economy, "gdp_per_capita", GDP_BASELINE)?;

    let formal = ctx.value("formal_stock")?;
    let informal = ctx.value("informal_stock")?;
    let supply = formal + informal;
    let deficit = population / HOUSEHOLD_SIZE - supply;

    if deficit > 0.0 {
        let formal_rate = ctx.uniform(FORMAL_BUILD.0, FORMAL_BUILD.1);
        let informal_rate = ctx.uniform(INFORMAL_BUILD.0, INFORMAL_BUILD.1);
        ctx.set("formal_stock", formal + (deficit * formal_rate).floor())?;
        ctx.set("informal_stock", informal + (deficit * informal_rate).floor())?;
    }

    let pressure = if supply > 0.0 {
        (deficit / supply).max(0.0)
    } else {
        EMPTY_STOCK_PRESSURE
    };

    let price_rate = ctx.uniform(0.01, 0.03) + pressure * 0.1 + (gdp_factor - 1.0) * 0.05;
    let rent_rate = ctx.uniform(0.01, 0.04) + pressure * 0.15 + (gdp_factor - 1.0) * 0.03;

    let price = ctx.value("avg_house_price")?;
    let rent = ctx.value("avg_rent")?;
    let affordability = ctx.value("affordability_ratio")?;
    ctx.set("avg_house_price", price * (1.0 + price_rate))?;
    ctx.set("avg_rent", rent * (1.0 + rent_rate))?;
    ctx.set("affordability_ratio", affordability * (1.0 + price_rate * 0.5))?;

    Ok(())
}
