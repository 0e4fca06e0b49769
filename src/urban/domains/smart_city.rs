//! Smart city - digital literacy, e-service adoption, sensor rollout

use crate::core::error::Result;
use crate::core::types::DomainKind;
use crate::urban::domain::CityContext;
use crate::urban::state::FieldSpec;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar("digital_literacy", 0.0, 0.95, 0.6),
    FieldSpec::scalar("smart_service_adoption", 0.0, 0.9, 0.25),
    // sensors per km²
    FieldSpec::scalar("iot_sensor_density", 0.0, 10_000.0, 5.0),
];

const IOT_GROWTH: (f64, f64) = (0.08, 0.20);

pub(super) fn update(ctx: &mut CityContext<'_, '_>) -> Result<()> {
    let internet = ctx.input(DomainKind::Infrastructure, "internet_penetration")?;
    let literacy = ctx.input(DomainKind::Social, "literacy_rate")?;

    let digital = ctx.value("digital_literacy")?;
    let gain = ctx.uniform(0.008, 0.025) * internet * literacy;
    ctx.set("digital_literacy", digital * (1.0 + gain))?;

    // adoption tracks this year's digital literacy
    let digital = ctx.current("digital_literacy")?;
    let adoption = ctx.value("smart_service_adoption")?;
    let gain = ctx.uniform(0.015, 0.04) * digital;
    ctx.set("smart_service_adoption", adoption * (1.0 + gain))?;

    let sensors = ctx.value("iot_sensor_density")?;
    let growth = ctx.uniform(IOT_GROWTH.0, IOT_GROWTH.1);
    ctx.set("iot_sensor_density", sensors * (1.0 + growth))?;

    Ok(())
}
