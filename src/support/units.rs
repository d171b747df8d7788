//! Extensions to [`uom`].
//!
//! This crate uses [`uom`] for all physical quantities crossing a public API
//! (lengths, pressures, temperatures, mass rates, heat fluxes).
//!
//! ## Temperature differences
//!
//! Heat flux from a zone to a surface is driven by `T_zone − T_surface`.
//! [`TemperatureDifference::minus`] produces that difference as a
//! [`TemperatureInterval`](uom::si::f64::TemperatureInterval):
//!
//! ```
//! use uom::si::f64::ThermodynamicTemperature;
//! use uom::si::{temperature_interval, thermodynamic_temperature::kelvin};
//! use twine_engine_models::support::units::TemperatureDifference;
//!
//! let gas = ThermodynamicTemperature::new::<kelvin>(2200.0);
//! let liner = ThermodynamicTemperature::new::<kelvin>(400.0);
//! let delta_t = gas.minus(liner);
//! assert_eq!(delta_t.get::<temperature_interval::kelvin>(), 1800.0);
//! ```

mod temperature_difference;

pub use temperature_difference::TemperatureDifference;
