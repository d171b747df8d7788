//! Shared fixtures: an 86 × 86 mm cylinder at 1000 rpm with ε = 10.

use std::rc::Rc;

use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{
        DynamicViscosity, Frequency, Length, MassDensity, Pressure, ThermodynamicTemperature,
        Velocity, Volume,
    },
    frequency::hertz,
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use super::{
    flame::{FlameGeometry, FlameTableConfig},
    kinematics::{EngineKinematics, KinematicParameters},
    zone::{GasState, ZoneState},
};

const GAS_CONSTANT_AIR: f64 = 287.0;

pub(crate) fn params() -> KinematicParameters {
    KinematicParameters::new(
        Frequency::new::<hertz>(16.67),
        Length::new::<meter>(0.086),
        Length::new::<meter>(0.086),
        1.0 / 3.5,
        10.0,
    )
    .expect("fixture parameters are valid")
}

pub(crate) fn kinematics() -> EngineKinematics {
    EngineKinematics::new(params())
}

pub(crate) fn geometry() -> Rc<FlameGeometry> {
    Rc::new(
        FlameGeometry::new(params(), FlameTableConfig::default())
            .expect("default table config is valid"),
    )
}

/// Air-like ideal gas at `temperature_k` and `pressure_pa`.
pub(crate) fn gas(temperature_k: f64, pressure_pa: f64) -> GasState {
    GasState {
        temperature: ThermodynamicTemperature::new::<kelvin>(temperature_k),
        pressure: Pressure::new::<pascal>(pressure_pa),
        density: MassDensity::new::<kilogram_per_cubic_meter>(
            pressure_pa / (GAS_CONSTANT_AIR * temperature_k),
        ),
        viscosity: DynamicViscosity::new::<pascal_second>(3.0e-5),
        sound_speed: Velocity::new::<meter_per_second>(
            (1.35 * GAS_CONSTANT_AIR * temperature_k).sqrt(),
        ),
    }
}

pub(crate) fn zone(volume_m3: f64, temperature_k: f64, pressure_pa: f64) -> ZoneState {
    ZoneState::from_gas(
        &gas(temperature_k, pressure_pa),
        Volume::new::<cubic_meter>(volume_m3),
    )
}
