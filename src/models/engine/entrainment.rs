//! Fractal turbulent entrainment of unburned charge into the flame.
//!
//! Early on the flame grows as a wrinkled laminar front whose area is
//! enlarged by the fractal ratio `(L/ℓ)^(D₃-2)`. Once the flame reaches the
//! liner the fractal picture breaks down and the remaining unburned mass is
//! relaxed toward zero over a time constant frozen at that moment.
//!
//! The switch is one-way and the model is stateful, so each instance is bound
//! to one burned/unburned zone pair and must see its calls in order.

use std::rc::Rc;

use tracing::debug;
use uom::si::{
    area::square_meter,
    f64::{Frequency, Length, Mass, MassDensity, MassRate, Time, Velocity},
    frequency::hertz,
    kinematic_viscosity::square_meter_per_second,
    length::meter,
    mass::kilogram,
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    time::second,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::support::constraint::{Constrained, Constraint, StrictlyPositive, UnitIntervalOpen};

use super::{
    ConfigurationError, EngineError, PhysicalStateError,
    flame::FlameGeometry,
    flame_speed::LaminarFlameSpeed,
    zone::{ZoneState, positive},
};

const D3_MIN: f64 = 2.05;
const D3_FULLY_DEVELOPED: f64 = 2.35;
/// Taylor-scale constant in the strain term.
const STRAIN_CONSTANT: f64 = 3.55;

/// When a detected wall transition becomes permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransitionPolicy {
    /// Commit on the evaluation that detects it.
    #[default]
    Eager,
    /// Stage it until the integrator accepts or rejects the step.
    OnAcceptedStep,
}

/// Entrainment closure parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntrainmentConfig {
    /// Unburned volume fraction below which entrainment stops.
    pub end_volume_fraction: f64,
    /// Turbulence intensity at the initial unburned density.
    pub initial_rms: Velocity,
    pub reference_flame_radius: Length,
    pub reference_engine_speed: Frequency,
    pub transition: TransitionPolicy,
}

impl Default for EntrainmentConfig {
    fn default() -> Self {
        Self {
            end_volume_fraction: 0.001,
            initial_rms: Velocity::new::<meter_per_second>(4.0),
            reference_flame_radius: Length::new::<meter>(0.006),
            reference_engine_speed: Frequency::new::<hertz>(1000.0 / 60.0),
            transition: TransitionPolicy::Eager,
        }
    }
}

impl EntrainmentConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        UnitIntervalOpen::check(&self.end_volume_fraction)
            .map_err(ConfigurationError::parameter("end_volume_fraction"))?;
        StrictlyPositive::check(&self.initial_rms)
            .map_err(ConfigurationError::parameter("initial_rms"))?;
        StrictlyPositive::check(&self.reference_flame_radius)
            .map_err(ConfigurationError::parameter("reference_flame_radius"))?;
        StrictlyPositive::check(&self.reference_engine_speed)
            .map_err(ConfigurationError::parameter("reference_engine_speed"))?;
        Ok(())
    }
}

/// Values frozen when the flame reaches the wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallTransition {
    /// Relaxation time of the remaining unburned mass.
    pub tau: Time,
    pub reference_unburned_mass: Mass,
    /// Time of the evaluation that detected the transition.
    pub time: Time,
}

/// Combustion regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Growth,
    WallQuench,
}

enum Step {
    Detected(WallTransition, TransitionPolicy),
    Accept,
    Reject,
}

/// Regime state of one entrainment model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntrainmentState {
    committed: Option<WallTransition>,
    staged: Option<WallTransition>,
}

impl EntrainmentState {
    #[must_use]
    pub fn regime(&self) -> Regime {
        if self.committed.is_some() {
            Regime::WallQuench
        } else {
            Regime::Growth
        }
    }

    /// Whether the wall transition has been committed.
    #[must_use]
    pub fn is_transitioned(&self) -> bool {
        self.committed.is_some()
    }

    /// The committed transition, if any.
    #[must_use]
    pub fn wall_transition(&self) -> Option<&WallTransition> {
        self.committed.as_ref()
    }

    /// A detected transition waiting on [`EntrainmentRateModel::accept_step`].
    #[must_use]
    pub fn staged_transition(&self) -> Option<&WallTransition> {
        self.staged.as_ref()
    }

    fn active(&self) -> Option<&WallTransition> {
        self.committed.as_ref().or(self.staged.as_ref())
    }

    /// The only place the state changes. A committed transition is final.
    fn transition(&mut self, step: Step) {
        if self.committed.is_some() {
            return;
        }
        match step {
            Step::Detected(found, TransitionPolicy::Eager) => self.committed = Some(found),
            Step::Detected(found, TransitionPolicy::OnAcceptedStep) => {
                self.staged.get_or_insert(found);
            }
            Step::Accept => self.committed = self.staged.take(),
            Step::Reject => self.staged = None,
        }
    }
}

/// Mass flow from the unburned into the burned zone.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
///
/// use twine_engine_models::models::engine::{
///     entrainment::{EntrainmentConfig, EntrainmentRateModel, Regime},
///     flame::{FlameGeometry, FlameTableConfig},
///     kinematics::KinematicParameters,
///     zone::ZoneState,
/// };
/// use uom::si::{
///     f64::{Frequency, Length, MassDensity, Time, Velocity},
///     frequency::hertz,
///     length::meter,
///     mass_density::kilogram_per_cubic_meter,
///     velocity::meter_per_second,
/// };
///
/// let params = KinematicParameters::new(
///     Frequency::new::<hertz>(16.67),
///     Length::new::<meter>(0.086),
///     Length::new::<meter>(0.086),
///     1.0 / 3.5,
///     10.0,
/// )
/// .unwrap();
/// let geometry = Rc::new(FlameGeometry::new(params, FlameTableConfig::default()).unwrap());
/// let flame_speed = |_: Time, _: &ZoneState| Velocity::new::<meter_per_second>(0.5);
///
/// let model = EntrainmentRateModel::new(
///     geometry,
///     flame_speed,
///     EntrainmentConfig::default(),
///     MassDensity::new::<kilogram_per_cubic_meter>(10.0),
/// )
/// .unwrap();
/// assert_eq!(model.state().regime(), Regime::Growth);
/// ```
#[derive(Debug)]
pub struct EntrainmentRateModel<F> {
    geometry: Rc<FlameGeometry>,
    flame_speed: F,
    config: EntrainmentConfig,
    initial_unburned_density: Constrained<MassDensity, StrictlyPositive>,
    state: EntrainmentState,
}

impl<F: LaminarFlameSpeed> EntrainmentRateModel<F> {
    /// Binds a fresh model, in the growth regime, to one zone pair.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an invalid configuration or a
    /// non-positive initial unburned density.
    pub fn new(
        geometry: Rc<FlameGeometry>,
        flame_speed: F,
        config: EntrainmentConfig,
        initial_unburned_density: MassDensity,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let initial_unburned_density = StrictlyPositive::new(initial_unburned_density)
            .map_err(ConfigurationError::parameter("initial_unburned_density"))?;

        Ok(Self {
            geometry,
            flame_speed,
            config,
            initial_unburned_density,
            state: EntrainmentState::default(),
        })
    }

    #[must_use]
    pub fn state(&self) -> &EntrainmentState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &EntrainmentConfig {
        &self.config
    }

    #[must_use]
    pub fn geometry(&self) -> &Rc<FlameGeometry> {
        &self.geometry
    }

    /// Commits a staged wall transition. A no-op under the eager policy.
    pub fn accept_step(&mut self) {
        self.state.transition(Step::Accept);
    }

    /// Discards a staged wall transition. A committed one is kept.
    pub fn reject_step(&mut self) {
        self.state.transition(Step::Reject);
    }

    /// Entrainment rate at time `t`, never negative.
    ///
    /// Both zone states are validated first. A non-physical zone is an error
    /// even when the unburned volume is already below the terminal fraction,
    /// where a valid state would yield zero.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PhysicalState`] for a non-physical zone state or
    /// a NaN flame speed, and [`EngineError::GeometryDomain`] if the burned
    /// volume exceeds the cylinder volume.
    pub fn rate(
        &mut self,
        t: Time,
        burned: &ZoneState,
        unburned: &ZoneState,
    ) -> Result<MassRate, EngineError> {
        burned.validate()?;
        unburned.validate()?;

        let zero = MassRate::new::<kilogram_per_second>(0.0);
        let params = self.geometry.params();
        let kinematics = self.geometry.kinematics();
        let cylinder_volume = kinematics.cylinder_volume(t).get::<cubic_meter>();

        if unburned.volume.get::<cubic_meter>()
            < self.config.end_volume_fraction * cylinder_volume
        {
            return Ok(zero);
        }

        let fraction = burned.volume.get::<cubic_meter>() / cylinder_volume;
        let radius = self.geometry.flame_radius(t, fraction)?.get::<meter>();
        let area = self.geometry.flame_area(t, fraction)?.get::<square_meter>();
        if radius <= 0.0 {
            return Ok(zero);
        }

        let laminar = self
            .flame_speed
            .laminar_flame_speed(t, unburned)
            .get::<meter_per_second>();
        if laminar.is_nan() {
            return Err(PhysicalStateError::NonPhysical {
                quantity: "laminar flame speed",
                value: laminar,
            }
            .into());
        }
        if laminar <= 0.0 {
            return Ok(zero);
        }

        let density = positive("density", unburned.density.get::<kilogram_per_cubic_meter>())?;
        let nu = unburned
            .kinematic_viscosity()?
            .get::<square_meter_per_second>();
        let rms = self.config.initial_rms.get::<meter_per_second>()
            * (self
                .initial_unburned_density
                .as_ref()
                .get::<kilogram_per_cubic_meter>()
                / density)
                .cbrt();

        let half_bore = 0.5 * params.bore_m();
        let gap = kinematics.piston_position(t).get::<meter>();
        let integral_scale = radius.min(half_bore).min(gap);
        let dissipation = rms.powi(3) / integral_scale;

        let strain = (dissipation / nu).sqrt() / STRAIN_CONSTANT.powf(2.0 / 3.0);
        let stretched = laminar * (1.0 - nu / laminar.powi(2) * strain);

        let kolmogorov = (nu.powi(3) / dissipation).powf(0.25);
        let scale_ratio = integral_scale / kolmogorov;

        let omega = radius / self.config.reference_flame_radius.get::<meter>() * params.speed_hz()
            / self.config.reference_engine_speed.get::<hertz>();
        let ignition_weight = 1.0 - (-omega).exp();

        let d3_max = D3_MIN * (1.0 - ignition_weight) + D3_FULLY_DEVELOPED * ignition_weight;
        let d3 = (d3_max * rms + D3_MIN * laminar) / (rms + laminar);

        let raw = if stretched > 0.0 {
            density * area * stretched * scale_ratio.powf(d3 - 2.0)
        } else {
            0.0
        };

        let unburned_mass = unburned.mass.get::<kilogram>();
        if self.state.active().is_none() && raw > 0.0 && radius + 0.5 * integral_scale >= half_bore
        {
            let found = WallTransition {
                tau: Time::new::<second>(unburned_mass / raw),
                reference_unburned_mass: unburned.mass,
                time: t,
            };
            debug!(
                t = t.get::<second>(),
                tau = unburned_mass / raw,
                reference_mass = unburned_mass,
                "flame reached the liner"
            );
            self.state
                .transition(Step::Detected(found, self.config.transition));
        }

        let rate = match self.state.active() {
            Some(wall) => {
                let reference = wall.reference_unburned_mass.get::<kilogram>();
                let blend = if reference > 0.0 {
                    (1.0 - unburned_mass / reference).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                (1.0 - blend) * raw + blend * unburned_mass / wall.tau.get::<second>()
            }
            None => raw,
        };

        Ok(MassRate::new::<kilogram_per_second>(rate.max(0.0)))
    }
}
