//! Crank-slider kinematics of a four-stroke cylinder.
//!
//! All time functions are pure in `t` and share one bounded memo keyed on the
//! exact bit pattern of `t`, so an implicit integrator that re-evaluates the
//! same time repeatedly does the trigonometry once.

use std::{
    convert::Infallible,
    f64::consts::{PI, TAU},
};

use twine_core::Model;
use uom::si::{
    angle::radian,
    area::square_meter,
    f64::{Angle, Area, Frequency, Length, Time, Velocity, Volume},
    frequency::hertz,
    length::meter,
    time::second,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::support::{
    constraint::{Constraint, StrictlyPositive, UnitIntervalOpen},
    memo::ExactMemo,
};

use super::ConfigurationError;

/// Crank angle covered by one four-stroke cycle (two revolutions).
pub const CYCLE_ANGLE: f64 = 2.0 * TAU;

const MEMO_CAPACITY: usize = 64;

/// Immutable engine geometry and speed.
///
/// `crank_rod_ratio` is stored as the crank radius divided by the
/// connecting-rod length, so it lies strictly between zero and one.
/// Construction also accepts the inverse rod-to-crank convention.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KinematicParameters {
    speed: Frequency,
    stroke: Length,
    bore: Length,
    crank_rod_ratio: f64,
    compression_ratio: f64,
    clearance_gap: Length,
}

impl KinematicParameters {
    /// Validates and creates engine parameters.
    ///
    /// The clearance gap defaults to `stroke / (compression_ratio - 1)`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if speed, stroke or bore are not
    /// strictly positive, `compression_ratio <= 1`, or `crank_rod_ratio` is
    /// not positive, not finite or exactly one.
    ///
    /// A `crank_rod_ratio` above one is read as rod length over crank
    /// radius and stored as its reciprocal.
    pub fn new(
        speed: Frequency,
        stroke: Length,
        bore: Length,
        crank_rod_ratio: f64,
        compression_ratio: f64,
    ) -> Result<Self, ConfigurationError> {
        StrictlyPositive::check(&speed).map_err(ConfigurationError::parameter("speed"))?;
        StrictlyPositive::check(&stroke).map_err(ConfigurationError::parameter("stroke"))?;
        StrictlyPositive::check(&bore).map_err(ConfigurationError::parameter("bore"))?;

        let crank_rod_ratio = normalize_crank_rod_ratio(crank_rod_ratio)?;
        if !compression_ratio.is_finite() || compression_ratio <= 1.0 {
            return Err(ConfigurationError::CompressionRatio(compression_ratio));
        }

        Ok(Self {
            speed,
            stroke,
            bore,
            crank_rod_ratio,
            compression_ratio,
            clearance_gap: stroke / (compression_ratio - 1.0),
        })
    }

    /// Overrides the head-to-piston distance at top dead center.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if `gap` is not strictly positive.
    pub fn with_clearance_gap(self, gap: Length) -> Result<Self, ConfigurationError> {
        StrictlyPositive::check(&gap).map_err(ConfigurationError::parameter("clearance_gap"))?;
        Ok(Self {
            clearance_gap: gap,
            ..self
        })
    }

    /// Engine speed in revolutions per second.
    #[must_use]
    pub fn speed(&self) -> Frequency {
        self.speed
    }

    #[must_use]
    pub fn stroke(&self) -> Length {
        self.stroke
    }

    #[must_use]
    pub fn bore(&self) -> Length {
        self.bore
    }

    #[must_use]
    pub fn crank_rod_ratio(&self) -> f64 {
        self.crank_rod_ratio
    }

    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        self.compression_ratio
    }

    /// Head-to-piston distance at top dead center.
    #[must_use]
    pub fn clearance_gap(&self) -> Length {
        self.clearance_gap
    }

    /// Mean piston speed, `2 * stroke * speed`.
    #[must_use]
    pub fn mean_piston_speed(&self) -> Velocity {
        Velocity::new::<meter_per_second>(2.0 * self.stroke_m() * self.speed_hz())
    }

    /// Cross-sectional area of the bore.
    #[must_use]
    pub fn bore_area(&self) -> Area {
        Area::new::<square_meter>(self.bore_area_m2())
    }

    /// Swept volume, `bore_area * stroke`.
    #[must_use]
    pub fn displacement_volume(&self) -> Volume {
        Volume::new::<cubic_meter>(self.bore_area_m2() * self.stroke_m())
    }

    /// Volume at top dead center, `displacement / (compression_ratio - 1)`.
    #[must_use]
    pub fn clearance_volume(&self) -> Volume {
        Volume::new::<cubic_meter>(self.clearance_volume_m3())
    }

    /// Cylinder volume when the piston sits `gap` below the head.
    #[must_use]
    pub fn volume_at_gap(&self, gap: Length) -> Volume {
        Volume::new::<cubic_meter>(self.volume_at_gap_m(gap.get::<meter>()))
    }

    pub(crate) fn speed_hz(&self) -> f64 {
        self.speed.get::<hertz>()
    }

    pub(crate) fn stroke_m(&self) -> f64 {
        self.stroke.get::<meter>()
    }

    pub(crate) fn bore_m(&self) -> f64 {
        self.bore.get::<meter>()
    }

    pub(crate) fn clearance_gap_m(&self) -> f64 {
        self.clearance_gap.get::<meter>()
    }

    pub(crate) fn bore_area_m2(&self) -> f64 {
        0.25 * PI * self.bore_m().powi(2)
    }

    pub(crate) fn volume_at_gap_m(&self, gap: f64) -> f64 {
        self.clearance_volume_m3() + self.bore_area_m2() * (gap - self.clearance_gap_m())
    }

    fn clearance_volume_m3(&self) -> f64 {
        self.bore_area_m2() * self.stroke_m() / (self.compression_ratio - 1.0)
    }
}

fn normalize_crank_rod_ratio(ratio: f64) -> Result<f64, ConfigurationError> {
    let lambda = if ratio > 1.0 { ratio.recip() } else { ratio };
    UnitIntervalOpen::check(&lambda).map_err(|_| ConfigurationError::CrankRodRatio(ratio))?;
    Ok(lambda)
}

/// Piston state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PistonState {
    /// Crank angle in `[0, 4π)`, zero at firing top dead center minus one cycle.
    pub crank_angle: Angle,
    /// Distance from the cylinder head to the piston crown.
    pub position: Length,
    /// Piston velocity, positive moving away from the head.
    pub velocity: Velocity,
    /// Gas volume above the piston.
    pub volume: Volume,
}

/// Time-resolved crank-slider kinematics.
#[derive(Debug)]
pub struct EngineKinematics {
    params: KinematicParameters,
    memo: ExactMemo<f64, PistonState>,
}

impl EngineKinematics {
    #[must_use]
    pub fn new(params: KinematicParameters) -> Self {
        Self {
            params,
            memo: ExactMemo::new(MEMO_CAPACITY),
        }
    }

    #[must_use]
    pub fn params(&self) -> &KinematicParameters {
        &self.params
    }

    /// Returns the full piston state at time `t`, memoized on exact `t`.
    pub fn piston_state(&self, t: Time) -> PistonState {
        let t = t.get::<second>();
        self.memo.get_or_insert_with(&t, || {
            let theta = (TAU * self.params.speed_hz() * t).rem_euclid(CYCLE_ANGLE);
            self.state_at(theta)
        })
    }

    /// Crank angle at time `t`, wrapped into `[0, 4π)`.
    pub fn crank_angle(&self, t: Time) -> Angle {
        self.piston_state(t).crank_angle
    }

    /// Head-to-piston distance, including the clearance gap.
    pub fn piston_position(&self, t: Time) -> Length {
        self.piston_state(t).position
    }

    pub fn piston_velocity(&self, t: Time) -> Velocity {
        self.piston_state(t).velocity
    }

    pub fn cylinder_volume(&self, t: Time) -> Volume {
        self.piston_state(t).volume
    }

    /// Piston state at a crank angle, bypassing the memo.
    ///
    /// The angle is wrapped into `[0, 4π)` first.
    pub fn state_at_angle(&self, angle: Angle) -> PistonState {
        self.state_at(angle.get::<radian>().rem_euclid(CYCLE_ANGLE))
    }

    /// Time at which the crank first reaches `angle`, `angle / (2π n)`.
    pub fn time_at_angle(&self, angle: Angle) -> Time {
        Time::new::<second>(angle.get::<radian>() / (TAU * self.params.speed_hz()))
    }

    /// Turns a function of crank angle into a function of time.
    ///
    /// Valve lift laws and ignition schedules are naturally written against
    /// crank angle, while integrators call back with time.
    pub fn angle_function<'a, F, R>(&'a self, f: F) -> impl Fn(Time) -> R + 'a
    where
        F: Fn(Angle) -> R + 'a,
    {
        move |t| f(self.crank_angle(t))
    }

    fn state_at(&self, theta: f64) -> PistonState {
        let p = &self.params;
        let s = p.stroke_m();
        let lambda = p.crank_rod_ratio;
        let (sin, cos) = theta.sin_cos();
        let root = (1.0 - lambda.powi(2) * sin.powi(2)).sqrt();

        let travel = 0.5 * s * ((1.0 + 1.0 / lambda) - cos - root / lambda);
        let position = travel + p.clearance_gap_m();
        let velocity = s * PI * p.speed_hz() * (sin + lambda * sin * cos / root);
        let volume = p.clearance_volume_m3() + p.bore_area_m2() * travel;

        PistonState {
            crank_angle: Angle::new::<radian>(theta),
            position: Length::new::<meter>(position),
            velocity: Velocity::new::<meter_per_second>(velocity),
            volume: Volume::new::<cubic_meter>(volume),
        }
    }
}

/// Exposes the kinematics as a Twine model from time to piston state.
impl Model for EngineKinematics {
    type Input = Time;
    type Output = PistonState;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(self.piston_state(*input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use uom::si::{angle::degree, length::millimeter};

    use crate::models::engine::test_support::{kinematics, params};

    #[test]
    fn derived_constants() {
        let p = params();
        let bore_area = 0.25 * PI * 0.086_f64.powi(2);

        assert_relative_eq!(p.bore_area().get::<square_meter>(), bore_area);
        assert_relative_eq!(
            p.displacement_volume().get::<cubic_meter>(),
            bore_area * 0.086
        );
        assert_relative_eq!(
            p.clearance_volume().get::<cubic_meter>(),
            bore_area * 0.086 / 9.0
        );
        assert_relative_eq!(
            p.clearance_volume().get::<cubic_meter>(),
            5.55e-5,
            max_relative = 1e-3
        );
        assert_relative_eq!(p.clearance_gap().get::<meter>(), 0.086 / 9.0);
        assert_relative_eq!(
            p.mean_piston_speed().get::<meter_per_second>(),
            2.0 * 0.086 * 16.67
        );
    }

    #[test]
    fn top_and_bottom_dead_center() {
        let engine = kinematics();
        let p = *engine.params();

        let tdc = engine.state_at_angle(Angle::new::<radian>(0.0));
        assert_relative_eq!(tdc.position.get::<meter>(), p.clearance_gap_m());
        assert_relative_eq!(
            tdc.volume.get::<cubic_meter>(),
            p.clearance_volume().get::<cubic_meter>()
        );

        let bdc = engine.state_at_angle(Angle::new::<radian>(PI));
        assert_relative_eq!(
            bdc.position.get::<meter>(),
            p.clearance_gap_m() + p.stroke_m(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            bdc.volume.get::<cubic_meter>(),
            (p.clearance_volume() + p.displacement_volume()).get::<cubic_meter>(),
            epsilon = 1e-12
        );

        let fired_tdc = engine.state_at_angle(Angle::new::<radian>(TAU));
        assert_relative_eq!(
            fired_tdc.position.get::<meter>(),
            p.clearance_gap_m(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn crank_angle_wraps_over_two_revolutions() {
        let engine = kinematics();
        let cycle = 2.0 / engine.params().speed_hz();

        let early = engine.crank_angle(Time::new::<second>(0.1 * cycle));
        let later = engine.crank_angle(Time::new::<second>(2.1 * cycle));
        assert_relative_eq!(early.get::<radian>(), later.get::<radian>(), epsilon = 1e-9);

        let negative = engine.crank_angle(Time::new::<second>(-0.25 * cycle));
        assert_relative_eq!(negative.get::<radian>(), 3.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn velocity_is_the_derivative_of_position() {
        let engine = kinematics();
        let t = 0.0123;
        let h = 1e-7;

        let ahead = engine.piston_position(Time::new::<second>(t + h)).get::<meter>();
        let behind = engine.piston_position(Time::new::<second>(t - h)).get::<meter>();
        let velocity = engine.piston_velocity(Time::new::<second>(t));

        assert_relative_eq!(
            velocity.get::<meter_per_second>(),
            (ahead - behind) / (2.0 * h),
            max_relative = 1e-6
        );
    }

    #[test]
    fn time_and_angle_round_trip() {
        let engine = kinematics();
        let angle = Angle::new::<degree>(350.0);

        let t = engine.time_at_angle(angle);
        assert_relative_eq!(
            engine.crank_angle(t).get::<degree>(),
            350.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn angle_function_reads_crank_angle() {
        let engine = kinematics();
        let lift = engine.angle_function(|angle: Angle| angle.get::<degree>() / 720.0);

        let t = engine.time_at_angle(Angle::new::<degree>(180.0));
        assert_relative_eq!(lift(t), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn memo_reuses_exact_times() {
        let engine = kinematics();
        let t = Time::new::<second>(0.004);

        let first = engine.piston_state(t);
        let again = engine.piston_state(t);
        assert_eq!(first, again);
        assert_eq!(engine.memo.len(), 1);

        engine.piston_state(Time::new::<second>(0.004 + 1e-15));
        assert_eq!(engine.memo.len(), 2);
    }

    #[test]
    fn model_adapter_matches_direct_calls() {
        let engine = kinematics();
        let t = Time::new::<second>(0.0071);

        let state = engine.call(&t).unwrap();
        assert_eq!(state, engine.piston_state(t));
    }

    #[test]
    fn rejects_bad_parameters() {
        let speed = Frequency::new::<hertz>(16.67);
        let length = Length::new::<millimeter>(86.0);

        assert!(matches!(
            KinematicParameters::new(speed, length, length, 1.0 / 3.5, 1.0),
            Err(ConfigurationError::CompressionRatio(_))
        ));
        assert!(matches!(
            KinematicParameters::new(speed, length, length, 1.0 / 3.5, f64::NAN),
            Err(ConfigurationError::CompressionRatio(_))
        ));
        for ratio in [0.0, 1.0, -0.2, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                KinematicParameters::new(speed, length, length, ratio, 10.0),
                Err(ConfigurationError::CrankRodRatio(_))
            ));
        }
        assert!(matches!(
            KinematicParameters::new(
                Frequency::new::<hertz>(0.0),
                length,
                length,
                1.0 / 3.5,
                10.0
            ),
            Err(ConfigurationError::Parameter { name: "speed", .. })
        ));
        assert!(matches!(
            params().with_clearance_gap(Length::new::<meter>(-0.01)),
            Err(ConfigurationError::Parameter {
                name: "clearance_gap",
                ..
            })
        ));
    }

    #[test]
    fn accepts_rod_to_crank_ratio() {
        let speed = Frequency::new::<hertz>(16.67);
        let length = Length::new::<millimeter>(86.0);

        let rod_over_crank = KinematicParameters::new(speed, length, length, 3.5, 10.0).unwrap();
        assert_relative_eq!(rod_over_crank.crank_rod_ratio(), 1.0 / 3.5);
        assert_eq!(rod_over_crank, params());

        let engine = EngineKinematics::new(rod_over_crank);
        let reference = kinematics();

        // V(0) is the clearance volume, boreArea * stroke / 9.
        let v0 = engine.cylinder_volume(Time::new::<second>(0.0));
        assert_relative_eq!(v0.get::<cubic_meter>(), 5.5507e-5, max_relative = 1e-4);

        let bdc = engine.state_at_angle(Angle::new::<radian>(PI));
        assert_relative_eq!(
            bdc.position.get::<meter>(),
            rod_over_crank.clearance_gap_m() + 0.086,
            epsilon = 1e-12
        );

        let t = Time::new::<second>(0.0041);
        let velocity = engine.piston_velocity(t).get::<meter_per_second>();
        assert!(velocity.is_finite() && velocity > 0.0);
        assert_relative_eq!(
            velocity,
            reference.piston_velocity(t).get::<meter_per_second>()
        );
    }

    #[test]
    fn custom_clearance_gap_shifts_position_only() {
        let p = params()
            .with_clearance_gap(Length::new::<millimeter>(12.0))
            .unwrap();
        let engine = EngineKinematics::new(p);

        let tdc = engine.state_at_angle(Angle::new::<radian>(0.0));
        assert_relative_eq!(tdc.position.get::<millimeter>(), 12.0, epsilon = 1e-9);
        assert_relative_eq!(
            tdc.volume.get::<cubic_meter>(),
            p.clearance_volume().get::<cubic_meter>()
        );
    }

    proptest! {
        #[test]
        fn position_is_periodic(t in 0.0..0.5_f64) {
            let engine = kinematics();
            let period = 2.0 / engine.params().speed_hz();

            let now = engine.piston_position(Time::new::<second>(t)).get::<meter>();
            let next = engine.piston_position(Time::new::<second>(t + period)).get::<meter>();
            prop_assert!((now - next).abs() < 1e-9);
        }

        #[test]
        fn volume_never_drops_below_clearance(t in -1.0..1.0_f64) {
            let engine = kinematics();
            let clearance = engine.params().clearance_volume().get::<cubic_meter>();

            let volume = engine.cylinder_volume(Time::new::<second>(t)).get::<cubic_meter>();
            prop_assert!(volume >= clearance * (1.0 - 1e-12));
        }
    }
}
