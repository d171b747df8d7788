use std::cmp::Ordering;

use super::{Constraint, ConstraintError};

/// Marker type enforcing that a value lies in the closed unit interval: `0 ≤ x ≤ 1`.
///
/// Burned-volume fractions and blend weights use this constraint.
///
/// # Examples
///
/// ```
/// use twine_engine_models::support::constraint::{Constraint, UnitInterval};
///
/// assert!(UnitInterval::check(&0.0).is_ok());
/// assert!(UnitInterval::check(&1.0).is_ok());
/// assert!(UnitInterval::check(&1.0001).is_err());
/// assert!(UnitInterval::check(&f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInterval;

impl Constraint<f64> for UnitInterval {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&0.0), value.partial_cmp(&1.0)) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

/// Marker type enforcing that a value lies in the open unit interval: `0 < x < 1`.
///
/// The crank-rod ratio and the initial fire-core fraction use this constraint.
///
/// # Examples
///
/// ```
/// use twine_engine_models::support::constraint::{Constraint, UnitIntervalOpen};
///
/// assert!(UnitIntervalOpen::check(&0.001).is_ok());
/// assert!(UnitIntervalOpen::check(&0.0).is_err());
/// assert!(UnitIntervalOpen::check(&1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitIntervalOpen;

impl Constraint<f64> for UnitIntervalOpen {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&0.0), value.partial_cmp(&1.0)) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less | Ordering::Equal), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater | Ordering::Equal)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_interval_bounds() {
        assert!(UnitInterval::check(&0.0).is_ok());
        assert!(UnitInterval::check(&0.5).is_ok());
        assert!(UnitInterval::check(&1.0).is_ok());
        assert_eq!(
            UnitInterval::check(&-1e-15),
            Err(ConstraintError::BelowMinimum)
        );
        assert_eq!(
            UnitInterval::check(&(1.0 + 1e-15)),
            Err(ConstraintError::AboveMaximum)
        );
        assert_eq!(
            UnitInterval::check(&f64::NAN),
            Err(ConstraintError::NotANumber)
        );
    }

    #[test]
    fn open_interval_excludes_endpoints() {
        assert!(UnitIntervalOpen::check(&(1.0 / 3.5)).is_ok());
        assert_eq!(
            UnitIntervalOpen::check(&0.0),
            Err(ConstraintError::BelowMinimum)
        );
        assert_eq!(
            UnitIntervalOpen::check(&1.0),
            Err(ConstraintError::AboveMaximum)
        );
        assert_eq!(
            UnitIntervalOpen::check(&3.5),
            Err(ConstraintError::AboveMaximum)
        );
    }
}
