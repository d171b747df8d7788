//! Indicated power, torque and mean effective pressure.
//!
//! Instantaneous values follow from the piston force and velocity. Cycle
//! means integrate sampled cylinder pressure with composite Simpson's rule on
//! possibly irregular time steps, as an integrator with adaptive steps
//! produces.

use std::f64::consts::TAU;

use uom::si::{
    f64::{Power, Pressure, Time, Torque},
    power::watt,
    pressure::pascal,
    time::second,
    torque::newton_meter,
    velocity::meter_per_second,
};

use super::{PerformanceError, kinematics::EngineKinematics};

/// Power delivered to the piston, `p · A · v(t)`.
pub fn indicated_power(kinematics: &EngineKinematics, pressure: Pressure, t: Time) -> Power {
    let velocity = kinematics.piston_velocity(t).get::<meter_per_second>();
    Power::new::<watt>(
        pressure.get::<pascal>() * kinematics.params().bore_area_m2() * velocity,
    )
}

/// Crankshaft torque equivalent to [`indicated_power`].
pub fn indicated_torque(kinematics: &EngineKinematics, pressure: Pressure, t: Time) -> Torque {
    power_to_torque(kinematics, indicated_power(kinematics, pressure, t))
}

/// Time-averaged indicated power over the sampled interval.
///
/// # Errors
///
/// Returns a [`PerformanceError`] if there are fewer than two samples, the
/// slices differ in length, or the times are not strictly increasing.
pub fn mean_indicated_power(
    kinematics: &EngineKinematics,
    times: &[Time],
    pressures: &[Pressure],
) -> Result<Power, PerformanceError> {
    check_samples(times, pressures)?;

    let xs: Vec<f64> = times.iter().map(|t| t.get::<second>()).collect();
    let ys: Vec<f64> = times
        .iter()
        .zip(pressures)
        .map(|(&t, &p)| indicated_power(kinematics, p, t).get::<watt>())
        .collect();

    let duration = xs[xs.len() - 1] - xs[0];
    Ok(Power::new::<watt>(simpson(&xs, &ys) / duration))
}

/// # Errors
///
/// See [`mean_indicated_power`].
pub fn mean_indicated_torque(
    kinematics: &EngineKinematics,
    times: &[Time],
    pressures: &[Pressure],
) -> Result<Torque, PerformanceError> {
    let power = mean_indicated_power(kinematics, times, pressures)?;
    Ok(power_to_torque(kinematics, power))
}

/// Indicated mean effective pressure, the work per cycle over displacement.
///
/// The samples should span one full cycle.
///
/// # Errors
///
/// See [`mean_indicated_power`].
pub fn imep(
    kinematics: &EngineKinematics,
    times: &[Time],
    pressures: &[Pressure],
) -> Result<Pressure, PerformanceError> {
    let power = mean_indicated_power(kinematics, times, pressures)?.get::<watt>();
    let duration = (times[times.len() - 1] - times[0]).get::<second>();
    let params = kinematics.params();

    Ok(Pressure::new::<pascal>(
        power * duration / (params.bore_area_m2() * params.stroke_m()),
    ))
}

fn power_to_torque(kinematics: &EngineKinematics, power: Power) -> Torque {
    let omega = TAU * kinematics.params().speed_hz();
    Torque::new::<newton_meter>(power.get::<watt>() / omega)
}

fn check_samples(times: &[Time], pressures: &[Pressure]) -> Result<(), PerformanceError> {
    if times.len() != pressures.len() {
        return Err(PerformanceError::LengthMismatch {
            times: times.len(),
            pressures: pressures.len(),
        });
    }
    if times.len() < 2 {
        return Err(PerformanceError::TooFewSamples(times.len()));
    }
    if let Some(index) = times.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(PerformanceError::NotIncreasing(index + 1));
    }
    Ok(())
}

/// Composite Simpson's rule on irregular spacing.
///
/// Interval pairs are integrated with the three-point rule. With an odd
/// interval count the last interval is closed with the three-point
/// correction over the final two intervals. Two samples fall back to the
/// trapezoid rule.
fn simpson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() - 1;
    if n == 1 {
        return 0.5 * (x[1] - x[0]) * (y[0] + y[1]);
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let mut total = 0.0;

    for i in (0..n - 1).step_by(2) {
        let (h0, h1) = (h[i], h[i + 1]);
        let sum = h0 + h1;
        total += sum / 6.0
            * ((2.0 - h1 / h0) * y[i]
                + sum * sum / (h0 * h1) * y[i + 1]
                + (2.0 - h0 / h1) * y[i + 2]);
    }

    if n % 2 == 1 {
        let (h0, h1) = (h[n - 2], h[n - 1]);
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1.powi(3) / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n] + beta * y[n - 1] - eta * y[n - 2];
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{angle::degree, f64::Angle};

    use crate::models::engine::test_support::kinematics;

    #[test]
    fn simpson_is_exact_for_quadratics_on_irregular_grids() {
        let x = [0.0, 0.1, 0.35, 0.5, 0.9, 1.0, 1.3];
        let f = |x: f64| 3.0 * x * x - x + 2.0;
        let exact = |x: f64| x.powi(3) - 0.5 * x * x + 2.0 * x;

        // Even and odd interval counts.
        for len in [x.len(), x.len() - 1] {
            let xs = &x[..len];
            let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
            assert_relative_eq!(
                simpson(xs, &ys),
                exact(xs[len - 1]) - exact(0.0),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn power_vanishes_at_dead_centers() {
        let kinematics = kinematics();
        let pressure = Pressure::new::<pascal>(3.0e6);

        for degrees in [0.0, 180.0, 360.0] {
            let t = kinematics.time_at_angle(Angle::new::<degree>(degrees));
            assert!(indicated_power(&kinematics, pressure, t).get::<watt>().abs() < 1e-6);
        }

        let t = kinematics.time_at_angle(Angle::new::<degree>(90.0));
        assert!(indicated_power(&kinematics, pressure, t).get::<watt>() > 0.0);
        assert!(indicated_torque(&kinematics, pressure, t).get::<newton_meter>() > 0.0);
    }

    #[test]
    fn constant_pressure_does_no_net_work_per_revolution() {
        let kinematics = kinematics();
        let period = 1.0 / 16.67;
        let times: Vec<Time> = (0..=400)
            .map(|i| Time::new::<second>(period * f64::from(i) / 400.0))
            .collect();
        let pressures = vec![Pressure::new::<pascal>(1.0e5); times.len()];

        let mean = mean_indicated_power(&kinematics, &times, &pressures).unwrap();
        assert!(mean.get::<watt>().abs() < 1e-3);
    }

    #[test]
    fn imep_of_a_square_cycle() {
        // High pressure on the power stroke only.
        let kinematics = kinematics();
        let period = 2.0 / 16.67;
        let n = 2000;
        let times: Vec<Time> = (0..=n)
            .map(|i| Time::new::<second>(period * f64::from(i) / f64::from(n)))
            .collect();
        let pressures: Vec<Pressure> = times
            .iter()
            .map(|&t| {
                let angle = kinematics.crank_angle(t).get::<degree>();
                let bar = if (360.0..540.0).contains(&angle) { 10.0 } else { 1.0 };
                Pressure::new::<pascal>(bar * 1.0e5)
            })
            .collect();

        let imep = imep(&kinematics, &times, &pressures).unwrap();

        // Net work is 9 bar over one displacement.
        assert_relative_eq!(imep.get::<pascal>(), 9.0e5, max_relative = 1e-2);

        let torque = mean_indicated_torque(&kinematics, &times, &pressures).unwrap();
        let power = mean_indicated_power(&kinematics, &times, &pressures).unwrap();
        assert_relative_eq!(
            torque.get::<newton_meter>(),
            power.get::<watt>() / (TAU * 16.67)
        );
    }

    #[test]
    fn rejects_bad_samples() {
        let kinematics = kinematics();
        let t = |s: f64| Time::new::<second>(s);
        let p = Pressure::new::<pascal>(1.0e5);

        assert_eq!(
            mean_indicated_power(&kinematics, &[t(0.0)], &[p]),
            Err(PerformanceError::TooFewSamples(1))
        );
        assert_eq!(
            mean_indicated_power(&kinematics, &[t(0.0), t(1.0)], &[p]),
            Err(PerformanceError::LengthMismatch {
                times: 2,
                pressures: 1
            })
        );
        assert_eq!(
            mean_indicated_power(&kinematics, &[t(0.0), t(0.2), t(0.1)], &[p, p, p]),
            Err(PerformanceError::NotIncreasing(2))
        );
    }
}
