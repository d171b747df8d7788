//! Spark ignition as a short external heat source.

use std::f64::consts::TAU;

use uom::si::{
    angle::{degree, radian},
    energy::joule,
    f64::{Angle, Energy, Power, Time},
    power::watt,
};

use crate::support::constraint::{Constraint, NonNegative};

use super::{
    ConfigurationError,
    kinematics::{CYCLE_ANGLE, EngineKinematics},
};

/// Ignition energy delivered uniformly over a crank-angle window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparkPlug {
    energy: Energy,
    start: Angle,
    end: Angle,
}

impl Default for SparkPlug {
    /// 1 mJ between 350° and 351°.
    fn default() -> Self {
        Self {
            energy: Energy::new::<joule>(1.0e-3),
            start: Angle::new::<degree>(350.0),
            end: Angle::new::<degree>(351.0),
        }
    }
}

impl SparkPlug {
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the energy is negative, or the
    /// window does not satisfy `0 ≤ start < end ≤ 4π`.
    pub fn new(energy: Energy, start: Angle, end: Angle) -> Result<Self, ConfigurationError> {
        NonNegative::check(&energy).map_err(ConfigurationError::parameter("spark_energy"))?;

        let (a, b) = (start.get::<radian>(), end.get::<radian>());
        if !(0.0 <= a && a < b && b <= CYCLE_ANGLE) {
            return Err(ConfigurationError::SparkWindow);
        }

        Ok(Self { energy, start, end })
    }

    #[must_use]
    pub fn energy(&self) -> Energy {
        self.energy
    }

    #[must_use]
    pub fn start(&self) -> Angle {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Angle {
        self.end
    }

    /// Time the crank spends inside the window.
    #[must_use]
    pub fn duration(&self, kinematics: &EngineKinematics) -> Time {
        kinematics.time_at_angle(self.end) - kinematics.time_at_angle(self.start)
    }

    /// Heat added to the burned zone at time `t`.
    ///
    /// Constant inside `[start, end)` so that the window integrates to the
    /// spark energy, zero elsewhere.
    pub fn heat_input(&self, t: Time, kinematics: &EngineKinematics) -> Power {
        let angle = kinematics.crank_angle(t);
        if angle < self.start || angle >= self.end {
            return Power::new::<watt>(0.0);
        }

        let window = (self.end - self.start).get::<radian>();
        let seconds = window / (TAU * kinematics.params().speed_hz());
        Power::new::<watt>(self.energy.get::<joule>() / seconds)
    }
}
