//! Read-only views of integrator-owned zone state.
//!
//! A zone is one well-mixed gas volume (the whole cylinder in a single-zone
//! model, or the burned or unburned charge in a two-zone model). Its state
//! belongs to the integrator; models borrow it through [`ZoneAccess`] for the
//! duration of one callback.

use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{
        DynamicViscosity, KinematicViscosity, Mass, MassDensity, Pressure,
        ThermodynamicTemperature, Velocity, Volume,
    },
    kinematic_viscosity::square_meter_per_second,
    mass::kilogram,
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use super::{EngineError, PhysicalStateError};

/// Intensive gas properties, independent of zone size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasState {
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,
    pub density: MassDensity,
    pub viscosity: DynamicViscosity,
    pub sound_speed: Velocity,
}

/// Snapshot of one zone as reported by the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneState {
    pub volume: Volume,
    pub mass: Mass,
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,
    pub density: MassDensity,
    pub viscosity: DynamicViscosity,
    pub sound_speed: Velocity,
}

impl ZoneState {
    /// Fills `volume` with gas at `gas`, deriving mass from density.
    #[must_use]
    pub fn from_gas(gas: &GasState, volume: Volume) -> Self {
        Self {
            volume,
            mass: Mass::new::<kilogram>(
                gas.density.get::<kilogram_per_cubic_meter>() * volume.get::<cubic_meter>(),
            ),
            temperature: gas.temperature,
            pressure: gas.pressure,
            density: gas.density,
            viscosity: gas.viscosity,
            sound_speed: gas.sound_speed,
        }
    }

    /// Intensive part of the state.
    #[must_use]
    pub fn gas(&self) -> GasState {
        GasState {
            temperature: self.temperature,
            pressure: self.pressure,
            density: self.density,
            viscosity: self.viscosity,
            sound_speed: self.sound_speed,
        }
    }

    /// Kinematic viscosity, `viscosity / density`.
    ///
    /// # Errors
    ///
    /// Returns a [`PhysicalStateError`] unless density is strictly positive
    /// and viscosity is non-negative.
    pub fn kinematic_viscosity(&self) -> Result<KinematicViscosity, PhysicalStateError> {
        let density = positive("density", self.density.get::<kilogram_per_cubic_meter>())?;
        let viscosity = non_negative("viscosity", self.viscosity.get::<pascal_second>())?;
        Ok(KinematicViscosity::new::<square_meter_per_second>(
            viscosity / density,
        ))
    }

    /// Checks that the state is physically meaningful.
    ///
    /// Temperature and pressure must be strictly positive. Volume, mass,
    /// density, viscosity and sound speed must be non-negative. NaN fails
    /// every check.
    ///
    /// # Errors
    ///
    /// Returns the first violated quantity as a [`PhysicalStateError`].
    pub fn validate(&self) -> Result<(), PhysicalStateError> {
        positive("temperature", self.temperature.get::<kelvin>())?;
        positive("pressure", self.pressure.get::<pascal>())?;
        non_negative("volume", self.volume.get::<cubic_meter>())?;
        non_negative("mass", self.mass.get::<kilogram>())?;
        non_negative("density", self.density.get::<kilogram_per_cubic_meter>())?;
        non_negative("viscosity", self.viscosity.get::<pascal_second>())?;
        non_negative("sound speed", self.sound_speed.get::<meter_per_second>())?;
        Ok(())
    }
}

/// Returns `value` if it is strictly positive.
pub(crate) fn positive(quantity: &'static str, value: f64) -> Result<f64, PhysicalStateError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicalStateError::NonPhysical { quantity, value })
    }
}

/// Returns `value` if it is zero or positive.
pub(crate) fn non_negative(
    quantity: &'static str,
    value: f64,
) -> Result<f64, PhysicalStateError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicalStateError::NonPhysical { quantity, value })
    }
}

/// Index of a zone inside a built network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneHandle(pub usize);

/// What a zone represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneRole {
    /// The whole charge of a single-zone model.
    Cylinder,
    /// Combustion products behind the flame front.
    Burned,
    /// Fresh charge ahead of the flame front.
    Unburned,
}

/// Read access to the integrator's current zone states.
pub trait ZoneAccess {
    /// Returns the current state of `zone`, if it exists.
    fn zone(&self, zone: ZoneHandle) -> Option<&ZoneState>;

    /// Like [`ZoneAccess::zone`], but an unknown handle is an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownZone`] if `zone` is not present.
    fn require(&self, zone: ZoneHandle) -> Result<&ZoneState, EngineError> {
        self.zone(zone).ok_or(EngineError::UnknownZone(zone))
    }
}

impl ZoneAccess for [ZoneState] {
    fn zone(&self, zone: ZoneHandle) -> Option<&ZoneState> {
        self.get(zone.0)
    }
}

impl ZoneAccess for Vec<ZoneState> {
    fn zone(&self, zone: ZoneHandle) -> Option<&ZoneState> {
        self.get(zone.0)
    }
}

impl<const N: usize> ZoneAccess for [ZoneState; N] {
    fn zone(&self, zone: ZoneHandle) -> Option<&ZoneState> {
        self.get(zone.0)
    }
}
