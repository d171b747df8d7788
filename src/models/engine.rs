//! Spark-ignition engine models.
//!
//! This domain supplies the boundary-condition callbacks a thermodynamic
//! integrator needs to simulate one spark-ignition cylinder, in either a
//! single-zone (zero-dimensional) or a two-zone (burned/unburned) layout.
//!
//! # Layers
//!
//! - [`kinematics`]: Crank angle, piston position and velocity, cylinder volume.
//! - [`flame`]: Flame radius and area for a spherical flame centred at the
//!   cylinder head, plus the per-zone contact areas.
//! - [`heat_transfer`]: Convective wall heat-transfer correlations.
//! - [`entrainment`]: Fractal turbulent mass-entrainment closure.
//! - [`network`]: Builders that wire the above into zone networks.
//!
//! The integrator owns all zone state. Models here read it through
//! [`zone::ZoneAccess`] during a callback and never retain it.
//!
//! # Example
//!
//! ```
//! use twine_engine_models::models::engine::kinematics::{EngineKinematics, KinematicParameters};
//! use uom::si::{
//!     f64::{Frequency, Length},
//!     frequency::hertz,
//!     length::meter,
//! };
//!
//! let params = KinematicParameters::new(
//!     Frequency::new::<hertz>(2000.0 / 60.0),
//!     Length::new::<meter>(0.086),
//!     Length::new::<meter>(0.086),
//!     1.0 / 3.5,
//!     10.0,
//! )
//! .unwrap();
//!
//! let engine = EngineKinematics::new(params);
//! assert!(engine.params().clearance_volume() < engine.params().displacement_volume());
//! ```

pub mod entrainment;
pub mod error;
pub mod flame;
pub mod flame_speed;
pub mod heat_transfer;
pub mod kinematics;
pub mod network;
pub mod performance;
pub mod spark;
pub mod zone;

#[cfg(test)]
mod test_support;

pub use error::{
    ConfigurationError, EngineError, GeometryDomainError, MotoredError, PerformanceError,
    PhysicalStateError,
};
