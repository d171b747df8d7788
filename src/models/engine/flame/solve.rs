//! Reference flame-radius inversion by bisection.
//!
//! The table interpolant is fast but approximate. This solve inverts the
//! closed-form burned volume directly and is used to check the table.

use std::convert::Infallible;

use thiserror::Error;
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;
use uom::si::{
    f64::{Length, Volume},
    length::meter,
    volume::cubic_meter,
};

use crate::models::engine::GeometryDomainError;

use super::shape;

/// Solver configuration for the reference radius inversion.
#[derive(Debug, Clone, Copy)]
pub struct FlameSolveConfig {
    /// Maximum iteration count for the bisection solve.
    pub max_iters: usize,

    /// Absolute tolerance on the flame radius.
    pub radius_tol: Length,

    /// Absolute tolerance on the burned-volume residual.
    pub volume_tol: Volume,
}

impl Default for FlameSolveConfig {
    fn default() -> Self {
        Self {
            max_iters: 200,
            radius_tol: Length::new::<meter>(1e-12),
            volume_tol: Volume::new::<cubic_meter>(1e-18),
        }
    }
}

impl FlameSolveConfig {
    fn bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.max_iters,
            x_abs_tol: self.radius_tol.get::<meter>(),
            x_rel_tol: 0.0,
            residual_tol: self.volume_tol.get::<cubic_meter>(),
        }
    }
}

/// Errors from [`FlameGeometry::solve_flame_radius`](super::FlameGeometry::solve_flame_radius).
#[derive(Debug, Error)]
pub enum FlameSolveError {
    #[error(transparent)]
    Domain(#[from] GeometryDomainError),

    /// The bisection solver encountered an error.
    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    /// The solver reached the iteration limit without converging.
    #[error("solver hit iteration limit: residual={residual:?}")]
    MaxIters {
        /// Best burned-volume residual achieved.
        residual: Volume,

        /// Iteration count performed by the solver.
        iters: usize,
    },
}

/// A trial flame and the volume it encloses.
#[derive(Debug, Clone, Copy)]
pub(super) struct FilledFlame {
    pub(super) radius: Length,
    pub(super) volume: Volume,
}

/// Forward mapping radius → burned volume at a fixed piston gap.
pub(super) struct FlameFill {
    bore: f64,
    gap: f64,
}

impl Model for FlameFill {
    type Input = Length;
    type Output = FilledFlame;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let volume = shape::burned_volume(input.get::<meter>(), self.bore, self.gap);
        Ok(FilledFlame {
            radius: *input,
            volume: Volume::new::<cubic_meter>(volume),
        })
    }
}

/// Residual `burned_volume(r) - target`.
pub(super) struct FlameFillProblem {
    target: Volume,
}

impl EquationProblem<1> for FlameFillProblem {
    type Input = Length;
    type Output = FilledFlame;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(Length::new::<meter>(x[0]))
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([(output.volume - self.target).get::<cubic_meter>()])
    }
}

/// Finds the radius enclosing `target` at piston `gap` (both SI).
pub(super) fn flame_radius(
    bore: f64,
    gap: f64,
    target: f64,
    config: &FlameSolveConfig,
) -> Result<Length, FlameSolveError> {
    let r_max = shape::max_radius(bore, gap);

    if target <= 0.0 {
        return Ok(Length::new::<meter>(0.0));
    }
    if target >= shape::burned_volume(r_max, bore, gap) {
        return Ok(Length::new::<meter>(r_max));
    }

    let model = FlameFill { bore, gap };
    let problem = FlameFillProblem {
        target: Volume::new::<cubic_meter>(target),
    };

    let solution = bisection::solve(
        &model,
        &problem,
        [0.0, r_max],
        &config.bisection(),
        |event: &bisection::Event<'_, _, _>| {
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )?;

    if solution.status != bisection::Status::Converged {
        return Err(FlameSolveError::MaxIters {
            residual: Volume::new::<cubic_meter>(solution.residual),
            iters: solution.iters,
        });
    }

    Ok(solution.snapshot.output.radius)
}
