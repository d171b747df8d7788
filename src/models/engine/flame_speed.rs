//! Laminar flame speed providers.
//!
//! The entrainment closure consumes an unstretched laminar flame speed but
//! does not fit one. Any `Fn(Time, &ZoneState) -> Velocity` is a provider,
//! so a correlation is usually a closure over its fitted coefficients.
//!
//! Correlations are curve fits over a finite data range. [`BoundsChecked`]
//! warns when the unburned state leaves that range instead of failing,
//! and clamps negative extrapolations to zero.

use std::fmt;

use tracing::warn;
use uom::si::{
    f64::{Pressure, ThermodynamicTemperature, Time, Velocity},
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
};

use super::zone::ZoneState;

/// Supplies the unstretched laminar flame speed of the unburned mixture.
pub trait LaminarFlameSpeed {
    fn laminar_flame_speed(&self, t: Time, unburned: &ZoneState) -> Velocity;
}

impl<F> LaminarFlameSpeed for F
where
    F: Fn(Time, &ZoneState) -> Velocity,
{
    fn laminar_flame_speed(&self, t: Time, unburned: &ZoneState) -> Velocity {
        self(t, unburned)
    }
}

/// Inclusive range over which a correlation was fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidityRange<Q> {
    pub min: Q,
    pub max: Q,
}

impl<Q: PartialOrd> ValidityRange<Q> {
    pub fn contains(&self, value: &Q) -> bool {
        self.min <= *value && *value <= self.max
    }
}

/// Fitted temperature and pressure ranges of a flame-speed correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationBounds {
    pub temperature: ValidityRange<ThermodynamicTemperature>,
    pub pressure: ValidityRange<Pressure>,
}

impl Default for CorrelationBounds {
    fn default() -> Self {
        Self {
            temperature: ValidityRange {
                min: ThermodynamicTemperature::new::<kelvin>(400.0),
                max: ThermodynamicTemperature::new::<kelvin>(2600.0),
            },
            pressure: ValidityRange {
                min: Pressure::new::<pascal>(1.0e5),
                max: Pressure::new::<pascal>(5.0e6),
            },
        }
    }
}

/// One unburned-state quantity outside the fitted range, in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsViolation {
    pub quantity: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is outside [{}, {}]",
            self.quantity, self.value, self.min, self.max
        )
    }
}

impl CorrelationBounds {
    /// Lists every quantity of `unburned` outside the fitted range.
    #[must_use]
    pub fn violations(&self, unburned: &ZoneState) -> Vec<BoundsViolation> {
        let mut found = Vec::new();

        if !self.temperature.contains(&unburned.temperature) {
            found.push(BoundsViolation {
                quantity: "unburned temperature",
                value: unburned.temperature.get::<kelvin>(),
                min: self.temperature.min.get::<kelvin>(),
                max: self.temperature.max.get::<kelvin>(),
            });
        }
        if !self.pressure.contains(&unburned.pressure) {
            found.push(BoundsViolation {
                quantity: "pressure",
                value: unburned.pressure.get::<pascal>(),
                min: self.pressure.min.get::<pascal>(),
                max: self.pressure.max.get::<pascal>(),
            });
        }

        found
    }
}

/// Wraps a provider with range warnings and a non-negative output.
///
/// # Example
///
/// ```
/// use twine_engine_models::models::engine::{
///     flame_speed::{BoundsChecked, CorrelationBounds, LaminarFlameSpeed},
///     zone::ZoneState,
/// };
/// use uom::si::{f64::{Time, Velocity}, time::second, velocity::meter_per_second};
///
/// let overshoot = |_: Time, _: &ZoneState| Velocity::new::<meter_per_second>(-0.1);
/// let checked = BoundsChecked::new(overshoot, CorrelationBounds::default());
/// # let state = ZoneState {
/// #     volume: uom::si::f64::Volume::new::<uom::si::volume::cubic_meter>(1e-5),
/// #     mass: uom::si::f64::Mass::new::<uom::si::mass::kilogram>(1e-4),
/// #     temperature: uom::si::f64::ThermodynamicTemperature::new::<uom::si::thermodynamic_temperature::kelvin>(700.0),
/// #     pressure: uom::si::f64::Pressure::new::<uom::si::pressure::pascal>(2e6),
/// #     density: uom::si::f64::MassDensity::new::<uom::si::mass_density::kilogram_per_cubic_meter>(10.0),
/// #     viscosity: uom::si::f64::DynamicViscosity::new::<uom::si::dynamic_viscosity::pascal_second>(3e-5),
/// #     sound_speed: Velocity::new::<meter_per_second>(520.0),
/// # };
///
/// let speed = checked.laminar_flame_speed(Time::new::<second>(0.0), &state);
/// assert_eq!(speed.get::<meter_per_second>(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BoundsChecked<F> {
    inner: F,
    bounds: CorrelationBounds,
    warn: bool,
}

impl<F> BoundsChecked<F> {
    pub fn new(inner: F, bounds: CorrelationBounds) -> Self {
        Self {
            inner,
            bounds,
            warn: true,
        }
    }

    /// Keeps the clamp but silences range warnings.
    #[must_use]
    pub fn without_warnings(self) -> Self {
        Self {
            warn: false,
            ..self
        }
    }

    pub fn bounds(&self) -> &CorrelationBounds {
        &self.bounds
    }
}

impl<F: LaminarFlameSpeed> LaminarFlameSpeed for BoundsChecked<F> {
    fn laminar_flame_speed(&self, t: Time, unburned: &ZoneState) -> Velocity {
        if self.warn {
            for violation in self.bounds.violations(unburned) {
                warn!(%violation, "flame speed correlation evaluated out of range");
            }
        }

        let speed = self.inner.laminar_flame_speed(t, unburned);
        Velocity::new::<meter_per_second>(speed.get::<meter_per_second>().max(0.0))
    }
}
