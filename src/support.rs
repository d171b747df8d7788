//! Crate-level support utilities.
//!
//! These modules are shared across engine models and are public because they
//! are useful on their own, but their APIs are not stable.

pub mod constraint;
pub mod interpolate;
pub mod memo;
pub mod units;
