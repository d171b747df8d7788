//! Public Twine engine models.
//!
//! # Organization
//!
//! Models are organized into domain-specific submodules. The [`engine`]
//! domain covers a single spark-ignition cylinder: geometry, combustion
//! closures, heat transfer and the builders that wire them into zone networks.
//!
//! # Model structure
//!
//! Where a computation is useful as a standalone [`twine_core::Model`], the
//! `Model` implementation is a thin adapter over the domain type's own API.

pub mod engine;
