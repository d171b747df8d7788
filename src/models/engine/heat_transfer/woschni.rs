use std::rc::Rc;

use uom::si::{
    f64::{HeatTransfer, Pressure, ThermodynamicTemperature, Time},
    heat_transfer::watt_per_square_meter_kelvin,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::{
    models::engine::{
        ConfigurationError, EngineError, MotoredError,
        kinematics::EngineKinematics,
        zone::{ZoneState, positive},
    },
    support::constraint::{Constraint, StrictlyPositive},
};

use super::{ChamberType, MotoredCylinder};

const C1: f64 = 1.3e-2;
const SWIRL_RATIO: f64 = 10.0;
const C3_GAS_EXCHANGE: f64 = 6.18 + 0.417 * SWIRL_RATIO;
const C3_CLOSED: f64 = 2.28 + 0.308 * SWIRL_RATIO;

/// Inputs Woschni needs beyond the zone state.
#[derive(Debug, Clone)]
pub struct WoschniReference {
    pub motored: Rc<MotoredCylinder>,
    pub intake_pressure: Pressure,
    pub intake_temperature: ThermodynamicTemperature,
}

/// Woschni's correlation with a combustion-induced velocity term.
#[derive(Debug, Clone)]
pub struct Woschni {
    c4: f64,
    reference: WoschniReference,
}

impl Woschni {
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for a vortex chamber, which has no
    /// Woschni constants, or if the intake state is not strictly positive.
    pub fn new(chamber: ChamberType, reference: WoschniReference) -> Result<Self, ConfigurationError> {
        let c4 = match chamber {
            ChamberType::DirectInjection => 0.00324,
            ChamberType::PreChamber => 0.00622,
            ChamberType::VortexChamber => {
                return Err(ConfigurationError::UnsupportedChamber {
                    correlation: "woschni",
                    chamber: chamber.name(),
                });
            }
        };
        StrictlyPositive::check(&reference.intake_pressure)
            .map_err(ConfigurationError::parameter("intake_pressure"))?;
        StrictlyPositive::check(&reference.intake_temperature.get::<kelvin>())
            .map_err(ConfigurationError::parameter("intake_temperature"))?;

        Ok(Self { c4, reference })
    }

    #[must_use]
    pub fn motored(&self) -> &Rc<MotoredCylinder> {
        &self.reference.motored
    }

    pub(super) fn coefficient(
        &self,
        kinematics: &EngineKinematics,
        t: Time,
        zone: &ZoneState,
    ) -> Result<HeatTransfer, EngineError> {
        let params = kinematics.params();
        let p = positive("pressure", zone.pressure.get::<pascal>())?;
        let temperature = positive("temperature", zone.temperature.get::<kelvin>())?;

        let motored = &self.reference.motored;
        let timing = motored.valve_timing();
        let angle = kinematics.crank_angle(t);
        let c3 = if timing.is_gas_exchange(angle) {
            C3_GAS_EXCHANGE
        } else {
            C3_CLOSED
        };

        let p0 = motored
            .pressure_curve()?
            .pressure_at(angle)
            .map_err(MotoredError::from)?
            .get::<pascal>();
        let v_ivc = kinematics
            .state_at_angle(timing.intake_close())
            .volume
            .get::<cubic_meter>();
        let swept = params.displacement_volume().get::<cubic_meter>();
        let cm = params.mean_piston_speed().get::<meter_per_second>();

        // Signed: below the motored pressure the velocity term shrinks.
        let combustion = self.c4 * (p - p0) / self.reference.intake_pressure.get::<pascal>()
            * swept
            / v_ivc
            * self.reference.intake_temperature.get::<kelvin>();
        let velocity = positive("woschni_velocity", c3 * cm + combustion)?;

        let alpha = C1
            * params.bore_m().powf(-0.214)
            * p.powf(0.786)
            * temperature.powf(-0.525)
            * velocity.powf(0.786);

        Ok(HeatTransfer::new::<watt_per_square_meter_kelvin>(alpha))
    }
}
