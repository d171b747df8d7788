//! Motored (chemically inert) cylinder pressure reference.
//!
//! Woschni's correlation adds a combustion-induced velocity term scaled by
//! the difference between the firing pressure and the pressure the same
//! cylinder would see without combustion. That reference comes from running
//! the geometry and valve schedule through an inert integrator over one
//! cycle, sampled uniformly in crank angle and fit with a cubic spline.
//!
//! The curve is built on first use and only rebuilt on request.

use std::{cell::RefCell, error::Error as StdError, f64::consts::PI, fmt, rc::Rc};

use tracing::info;
use uom::si::{
    angle::{degree, radian},
    f64::{Angle, Pressure},
    pressure::pascal,
    volume::cubic_meter,
};

use crate::{
    models::engine::{
        ConfigurationError, MotoredError,
        kinematics::{CYCLE_ANGLE, EngineKinematics, KinematicParameters},
    },
    support::{
        constraint::{Constraint, StrictlyPositive},
        interpolate::{CubicSpline, InterpolationError, linspace},
    },
};

/// Crank angles of the valve events that bound the closed part of the cycle.
///
/// Angles are measured from gas-exchange top dead center, so the closed
/// phase runs from intake closing through firing TDC (360°) to exhaust
/// opening.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValveTiming {
    intake_close: Angle,
    exhaust_open: Angle,
}

impl ValveTiming {
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ValveTiming`] unless
    /// `0 <= intake_close < exhaust_open < 720°`.
    pub fn new(intake_close: Angle, exhaust_open: Angle) -> Result<Self, ConfigurationError> {
        let ivc = intake_close.get::<radian>();
        let evo = exhaust_open.get::<radian>();

        if !(0.0..CYCLE_ANGLE).contains(&ivc) || !(0.0..CYCLE_ANGLE).contains(&evo) {
            return Err(ConfigurationError::ValveTiming(
                "valve events must lie within one cycle",
            ));
        }
        if ivc >= evo {
            return Err(ConfigurationError::ValveTiming(
                "intake must close before exhaust opens",
            ));
        }

        Ok(Self {
            intake_close,
            exhaust_open,
        })
    }

    #[must_use]
    pub fn intake_close(&self) -> Angle {
        self.intake_close
    }

    #[must_use]
    pub fn exhaust_open(&self) -> Angle {
        self.exhaust_open
    }

    /// Whether any valve is open at `angle`, which must already be wrapped.
    #[must_use]
    pub fn is_gas_exchange(&self, angle: Angle) -> bool {
        angle >= self.exhaust_open || angle < self.intake_close
    }
}

impl Default for ValveTiming {
    fn default() -> Self {
        Self {
            intake_close: Angle::new::<degree>(220.0),
            exhaust_open: Angle::new::<degree>(500.0),
        }
    }
}

/// Runs an inert cylinder and reports its pressure at each crank angle.
///
/// Implementations usually drive an external integrator with chemistry
/// disabled. Angles are ascending and span one cycle.
pub trait MotoredRun {
    /// # Errors
    ///
    /// Returns the integrator's failure, boxed.
    fn run(
        &self,
        kinematics: &EngineKinematics,
        timing: &ValveTiming,
        angles: &[Angle],
    ) -> Result<Vec<Pressure>, Box<dyn StdError + Send + Sync>>;
}

/// Closed-form motored run: intake pressure while the valves are open and
/// polytropic compression and expansion from intake closing otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolytropicMotoredRun {
    intake_pressure: Pressure,
    exponent: f64,
}

impl PolytropicMotoredRun {
    /// Uses a polytropic exponent of 1.32.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the intake pressure is not
    /// strictly positive.
    pub fn new(intake_pressure: Pressure) -> Result<Self, ConfigurationError> {
        Self::with_exponent(intake_pressure, 1.32)
    }

    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the intake pressure or the
    /// exponent is not strictly positive.
    pub fn with_exponent(intake_pressure: Pressure, exponent: f64) -> Result<Self, ConfigurationError> {
        StrictlyPositive::check(&intake_pressure)
            .map_err(ConfigurationError::parameter("intake_pressure"))?;
        StrictlyPositive::check(&exponent)
            .map_err(ConfigurationError::parameter("polytropic_exponent"))?;
        Ok(Self {
            intake_pressure,
            exponent,
        })
    }
}

impl MotoredRun for PolytropicMotoredRun {
    fn run(
        &self,
        kinematics: &EngineKinematics,
        timing: &ValveTiming,
        angles: &[Angle],
    ) -> Result<Vec<Pressure>, Box<dyn StdError + Send + Sync>> {
        let v_ivc = kinematics
            .state_at_angle(timing.intake_close())
            .volume
            .get::<cubic_meter>();
        let p_in = self.intake_pressure.get::<pascal>();

        Ok(angles
            .iter()
            .map(|&angle| {
                let state = kinematics.state_at_angle(angle);
                if timing.is_gas_exchange(state.crank_angle) {
                    self.intake_pressure
                } else {
                    let ratio = v_ivc / state.volume.get::<cubic_meter>();
                    Pressure::new::<pascal>(p_in * ratio.powf(self.exponent))
                }
            })
            .collect())
    }
}

/// Sampling of the motored reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotoredConfig {
    /// Uniform crank-angle samples on `[0, 4π]`.
    pub samples: usize,
}

impl Default for MotoredConfig {
    fn default() -> Self {
        Self { samples: 360 }
    }
}

/// Motored pressure as a function of crank angle.
#[derive(Debug, Clone, PartialEq)]
pub struct MotoredPressure {
    spline: CubicSpline,
}

impl MotoredPressure {
    /// Pressure at `angle`, wrapped into one cycle first.
    ///
    /// # Errors
    ///
    /// Returns an [`InterpolationError`] for non-finite angles.
    pub fn pressure_at(&self, angle: Angle) -> Result<Pressure, InterpolationError> {
        let theta = angle.get::<radian>().rem_euclid(CYCLE_ANGLE);
        Ok(Pressure::new::<pascal>(self.spline.eval(theta)?))
    }
}

/// A cylinder that lazily produces, and on request refreshes, its motored
/// pressure reference.
pub struct MotoredCylinder {
    kinematics: EngineKinematics,
    timing: ValveTiming,
    config: MotoredConfig,
    run: Box<dyn MotoredRun>,
    curve: RefCell<Option<Rc<MotoredPressure>>>,
}

impl MotoredCylinder {
    const MIN_SAMPLES: usize = 4;

    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if fewer than four samples are requested.
    pub fn new(
        params: KinematicParameters,
        timing: ValveTiming,
        config: MotoredConfig,
        run: impl MotoredRun + 'static,
    ) -> Result<Self, ConfigurationError> {
        if config.samples < Self::MIN_SAMPLES {
            return Err(ConfigurationError::Resolution {
                what: "motored pressure reference",
                got: config.samples,
                required: Self::MIN_SAMPLES,
            });
        }

        Ok(Self {
            kinematics: EngineKinematics::new(params),
            timing,
            config,
            run: Box::new(run),
            curve: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn kinematics(&self) -> &EngineKinematics {
        &self.kinematics
    }

    #[must_use]
    pub fn valve_timing(&self) -> &ValveTiming {
        &self.timing
    }

    /// Whether the reference has been computed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.curve.borrow().is_some()
    }

    /// Returns the reference curve, running the inert cylinder the first time.
    ///
    /// # Errors
    ///
    /// Returns a [`MotoredError`] if the run fails or its samples cannot be
    /// interpolated.
    pub fn pressure_curve(&self) -> Result<Rc<MotoredPressure>, MotoredError> {
        if let Some(curve) = self.curve.borrow().as_ref() {
            return Ok(Rc::clone(curve));
        }
        self.rebuild()
    }

    /// Reruns the inert cylinder and replaces the cached curve.
    ///
    /// On failure the previous curve, if any, is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`MotoredError`] if the run fails or its samples cannot be
    /// interpolated.
    pub fn rebuild(&self) -> Result<Rc<MotoredPressure>, MotoredError> {
        let angles: Vec<Angle> = linspace(0.0, 4.0 * PI, self.config.samples)
            .into_iter()
            .map(Angle::new::<radian>)
            .collect();

        let pressures = self
            .run
            .run(&self.kinematics, &self.timing, &angles)
            .map_err(|source| MotoredError::Run {
                context: format!("inert cycle over {} crank angles", angles.len()),
                source,
            })?;
        if pressures.len() != angles.len() {
            return Err(MotoredError::SampleCount {
                expected: angles.len(),
                got: pressures.len(),
            });
        }

        let xs: Vec<f64> = angles.iter().map(|a| a.get::<radian>()).collect();
        let ys: Vec<f64> = pressures.iter().map(|p| p.get::<pascal>()).collect();
        let curve = Rc::new(MotoredPressure {
            spline: CubicSpline::natural(&xs, &ys)?,
        });

        info!(
            samples = self.config.samples,
            peak_pa = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            "built motored pressure reference"
        );

        *self.curve.borrow_mut() = Some(Rc::clone(&curve));
        Ok(curve)
    }
}

impl fmt::Debug for MotoredCylinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotoredCylinder")
            .field("timing", &self.timing)
            .field("config", &self.config)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use approx::assert_relative_eq;

    use crate::models::engine::test_support::params;

    fn intake() -> Pressure {
        Pressure::new::<pascal>(1.0e5)
    }

    /// Counts runs and optionally fails.
    struct Scripted {
        calls: Rc<Cell<usize>>,
        fail: bool,
        scale: Rc<Cell<f64>>,
    }

    impl MotoredRun for Scripted {
        fn run(
            &self,
            _kinematics: &EngineKinematics,
            _timing: &ValveTiming,
            angles: &[Angle],
        ) -> Result<Vec<Pressure>, Box<dyn StdError + Send + Sync>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err("integrator diverged".into());
            }
            Ok(angles
                .iter()
                .map(|_| Pressure::new::<pascal>(self.scale.get()))
                .collect())
        }
    }

    fn scripted(fail: bool) -> (MotoredCylinder, Rc<Cell<usize>>, Rc<Cell<f64>>) {
        let calls = Rc::new(Cell::new(0));
        let scale = Rc::new(Cell::new(1.0e5));
        let cylinder = MotoredCylinder::new(
            params(),
            ValveTiming::default(),
            MotoredConfig { samples: 16 },
            Scripted {
                calls: Rc::clone(&calls),
                fail,
                scale: Rc::clone(&scale),
            },
        )
        .unwrap();
        (cylinder, calls, scale)
    }

    #[test]
    fn valve_timing_validation() {
        assert!(ValveTiming::new(Angle::new::<degree>(220.0), Angle::new::<degree>(500.0)).is_ok());
        assert!(ValveTiming::new(Angle::new::<degree>(500.0), Angle::new::<degree>(220.0)).is_err());
        assert!(ValveTiming::new(Angle::new::<degree>(-5.0), Angle::new::<degree>(220.0)).is_err());
        assert!(ValveTiming::new(Angle::new::<degree>(220.0), Angle::new::<degree>(730.0)).is_err());
    }

    #[test]
    fn gas_exchange_window() {
        let timing = ValveTiming::default();

        assert!(timing.is_gas_exchange(Angle::new::<degree>(100.0)));
        assert!(!timing.is_gas_exchange(Angle::new::<degree>(220.0)));
        assert!(!timing.is_gas_exchange(Angle::new::<degree>(360.0)));
        assert!(timing.is_gas_exchange(Angle::new::<degree>(500.0)));
        assert!(timing.is_gas_exchange(Angle::new::<degree>(650.0)));
    }

    #[test]
    fn polytropic_run_peaks_at_firing_tdc() {
        let kinematics = EngineKinematics::new(params());
        let timing = ValveTiming::default();
        let run = PolytropicMotoredRun::new(intake()).unwrap();
        let angles: Vec<Angle> = [100.0, 220.0, 360.0, 450.0]
            .into_iter()
            .map(Angle::new::<degree>)
            .collect();

        let pressures = run.run(&kinematics, &timing, &angles).unwrap();
        let v_ivc = kinematics.state_at_angle(timing.intake_close()).volume;
        let v_tdc = kinematics.params().clearance_volume();
        let peak = 1.0e5 * (v_ivc / v_tdc).get::<uom::si::ratio::ratio>().powf(1.32);

        assert_relative_eq!(pressures[0].get::<pascal>(), 1.0e5);
        assert_relative_eq!(pressures[1].get::<pascal>(), 1.0e5, max_relative = 1e-12);
        assert_relative_eq!(pressures[2].get::<pascal>(), peak, max_relative = 1e-9);
        assert!(pressures[3] < pressures[2]);
    }

    #[test]
    fn curve_is_built_once_and_reused() {
        let (cylinder, calls, _) = scripted(false);
        assert!(!cylinder.is_built());

        let first = cylinder.pressure_curve().unwrap();
        let second = cylinder.pressure_curve().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert!(cylinder.is_built());
    }

    #[test]
    fn rebuild_is_explicit() {
        let (cylinder, calls, scale) = scripted(false);
        let before = cylinder.pressure_curve().unwrap();

        scale.set(2.0e5);
        let cached = cylinder.pressure_curve().unwrap();
        assert_relative_eq!(
            cached.pressure_at(Angle::new::<degree>(90.0)).unwrap().get::<pascal>(),
            1.0e5
        );

        let rebuilt = cylinder.rebuild().unwrap();
        assert_eq!(calls.get(), 2);
        assert!(!Rc::ptr_eq(&before, &rebuilt));
        assert_relative_eq!(
            cylinder
                .pressure_curve()
                .unwrap()
                .pressure_at(Angle::new::<degree>(90.0))
                .unwrap()
                .get::<pascal>(),
            2.0e5
        );
    }

    #[test]
    fn run_failures_are_reported() {
        let (cylinder, _, _) = scripted(true);

        assert!(matches!(
            cylinder.pressure_curve(),
            Err(MotoredError::Run { .. })
        ));
        assert!(!cylinder.is_built());
    }

    #[test]
    fn interpolated_curve_wraps_angles() {
        let cylinder = MotoredCylinder::new(
            params(),
            ValveTiming::default(),
            MotoredConfig::default(),
            PolytropicMotoredRun::new(intake()).unwrap(),
        )
        .unwrap();
        let curve = cylinder.pressure_curve().unwrap();

        let once = curve.pressure_at(Angle::new::<degree>(300.0)).unwrap();
        let wrapped = curve.pressure_at(Angle::new::<degree>(1020.0)).unwrap();
        assert_relative_eq!(
            once.get::<pascal>(),
            wrapped.get::<pascal>(),
            max_relative = 1e-9
        );
        assert!(once.get::<pascal>() > 1.0e5);
    }

    #[test]
    fn too_few_samples_is_a_configuration_error() {
        let result = MotoredCylinder::new(
            params(),
            ValveTiming::default(),
            MotoredConfig { samples: 2 },
            PolytropicMotoredRun::new(intake()).unwrap(),
        );

        assert!(matches!(
            result,
            Err(ConfigurationError::Resolution { got: 2, .. })
        ));
    }
}
