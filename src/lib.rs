//! # Twine Engine Models
//!
//! Spark-ignition engine combustion building blocks for
//! [Twine](https://github.com/isentropic-dev/twine).
//!
//! The crate supplies the boundary-condition callbacks a zero-dimensional or
//! two-zone thermodynamic integrator needs to simulate a spark-ignition
//! cylinder: crank/piston kinematics, flame-front geometry, heat-transfer
//! correlations and a fractal turbulent entrainment closure. It does not
//! integrate chemistry itself; zone state is always owned by the caller.
//!
//! ## Crate layout
//!
//! - [`models`]: Domain-specific models, including [`twine_core::Model`] adapters.
//! - [`support`]: Supporting utilities used by models.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.

pub mod models;
pub mod support;
