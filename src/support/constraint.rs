//! Type-level numeric constraints checked once at construction.
//!
//! Engine parameters are full of values that only make sense inside a range:
//! a bore is strictly positive, a mass is never negative, a burned-volume
//! fraction lives in `[0, 1]`, a crank-rod ratio in `(0, 1)`.
//! The markers in this module encode those ranges so validation happens when
//! a configuration is built rather than deep inside a solver callback.
//!
//! # Provided constraints
//!
//! - [`StrictlyPositive`]: Greater than zero
//! - [`NonNegative`]: Zero or greater
//! - [`UnitInterval`]: Closed unit interval `0 ≤ x ≤ 1`
//! - [`UnitIntervalOpen`]: Open unit interval `0 < x < 1`
//!
//! Constructors validate through [`Constraint::check`]. A model that keeps a
//! validated value stores it in the [`Constrained<T, C>`] wrapper.

mod positivity;
mod unit_interval;

use std::marker::PhantomData;

use thiserror::Error;

pub use positivity::{NonNegative, StrictlyPositive};
pub use unit_interval::{UnitInterval, UnitIntervalOpen};

/// A trait for enforcing numeric invariants at construction time.
pub trait Constraint<T> {
    /// Checks that the given value satisfies this constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if the value does not satisfy the constraint.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// An error returned when a [`Constraint`] is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value must not be zero")]
    Zero,
    #[error("value is not a number")]
    NotANumber,
    #[error("value is below the minimum allowed")]
    BelowMinimum,
    #[error("value is above the maximum allowed")]
    AboveMaximum,
}

/// A wrapper enforcing a numeric constraint at construction time.
///
/// # Example
///
/// ```
/// use twine_engine_models::support::constraint::{Constrained, StrictlyPositive};
/// use uom::si::{f64::Length, length::millimeter};
///
/// let bore = Constrained::<_, StrictlyPositive>::new(Length::new::<millimeter>(86.0)).unwrap();
/// assert_eq!(bore.as_ref().get::<millimeter>(), 86.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Constructs a new constrained value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not satisfy the constraint.
    pub fn new(value: T) -> Result<Self, ConstraintError> {
        C::check(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }
}

/// Returns a reference to the inner unconstrained value.
impl<T, C: Constraint<T>> AsRef<T> for Constrained<T, C> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
