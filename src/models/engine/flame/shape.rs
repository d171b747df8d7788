//! Closed-form geometry of a spherical flame centred on the cylinder head.
//!
//! The flame ball is clipped by the liner (radius `bore / 2`) and by the
//! piston crown (`gap` below the head). All lengths are in meters.

use std::f64::consts::PI;

/// Clipping term from the liner: zero until the flame reaches it.
pub(super) fn alpha(radius: f64, bore: f64) -> f64 {
    if 2.0 * radius < bore {
        0.0
    } else {
        (1.0 - (0.5 * bore / radius).powi(2)).sqrt()
    }
}

/// Clipping term from the piston crown: one until the flame reaches it.
pub(super) fn beta(radius: f64, gap: f64) -> f64 {
    if radius < gap { 1.0 } else { gap / radius }
}

/// Largest radius that still touches unburned gas, the head-to-crown-edge distance.
pub(crate) fn max_radius(bore: f64, gap: f64) -> f64 {
    (0.25 * bore * bore + gap * gap).sqrt()
}

/// Volume enclosed by the clipped flame ball.
pub(crate) fn burned_volume(radius: f64, bore: f64, gap: f64) -> f64 {
    let a = alpha(radius, bore);
    let b = beta(radius, gap);
    let x = 2.0 * radius / bore;

    0.125 * PI * bore.powi(3) * (x.powi(3) / 3.0 * (a.powi(3) - b.powi(3) - 3.0 * (a - b)) + x * a)
}

/// Area of the clipped flame surface.
pub(crate) fn flame_area(radius: f64, bore: f64, gap: f64) -> f64 {
    let bore_area = 0.25 * PI * bore * bore;
    let x = 2.0 * radius / bore;

    bore_area * 2.0 * x * x * (beta(radius, gap) - alpha(radius, bore))
}
