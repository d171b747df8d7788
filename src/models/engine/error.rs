use std::error::Error as StdError;

use thiserror::Error;

use crate::support::{constraint::ConstraintError, interpolate::InterpolationError};

use super::zone::ZoneHandle;

/// Invalid static parameters, raised when a model is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// A named parameter violates its numeric constraint.
    #[error("invalid `{name}`")]
    Parameter {
        name: &'static str,
        #[source]
        source: ConstraintError,
    },

    /// The compression ratio must exceed one.
    #[error("compression ratio must exceed 1, got {0}")]
    CompressionRatio(f64),

    /// The crank-rod ratio must be positive, finite and not equal to one.
    #[error("crank-rod ratio must be positive, finite and not one, got {0}")]
    CrankRodRatio(f64),

    /// Unrecognized heat-transfer correlation name.
    #[error("unknown heat transfer correlation `{0}`")]
    UnknownCorrelation(String),

    /// Unrecognized combustion chamber type.
    #[error("unknown combustion chamber type `{0}`")]
    UnknownChamberType(String),

    /// The correlation has no constants for the chamber type.
    #[error("{correlation} does not support a {chamber} chamber")]
    UnsupportedChamber {
        correlation: &'static str,
        chamber: &'static str,
    },

    /// Woschni needs a motored pressure reference.
    #[error("the woschni correlation requires a motored pressure reference")]
    MissingMotoredReference,

    /// The initial flame kernel must occupy a fraction in `(0, 1)`.
    #[error("fire core fraction must lie in (0, 1), got {0}")]
    FireCoreFraction(f64),

    /// Valve events are inconsistent.
    #[error("invalid valve timing: {0}")]
    ValveTiming(&'static str),

    /// The ignition window must close after it opens.
    #[error("spark window must end after it starts")]
    SparkWindow,

    /// A sampled table or curve is too coarse.
    #[error("{what} needs at least {required} samples, got {got}")]
    Resolution {
        what: &'static str,
        got: usize,
        required: usize,
    },
}

impl ConfigurationError {
    /// Wraps a constraint violation with the offending parameter name.
    pub(crate) fn parameter(name: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::Parameter { name, source }
    }
}

/// Non-physical zone state handed over by the integrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicalStateError {
    /// A zone quantity is negative, zero where it must be positive, or NaN.
    #[error("non-physical {quantity}: {value}")]
    NonPhysical { quantity: &'static str, value: f64 },
}

/// A flame-geometry query outside the tabulated domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryDomainError {
    /// Burned volume fractions must lie in `[0, 1]`.
    #[error("burned fraction {0} is outside [0, 1]")]
    BurnedFraction(f64),

    /// The piston gap lies outside the stroke.
    #[error("piston gap {gap} m is outside [{min}, {max}] m")]
    PistonGap { gap: f64, min: f64, max: f64 },
}

/// Failures while producing the motored pressure reference.
#[derive(Debug, Error)]
pub enum MotoredError {
    /// The inert run itself failed.
    #[error("motored run failed: {context}")]
    Run {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The run returned the wrong number of samples.
    #[error("motored run returned {got} pressures for {expected} angles")]
    SampleCount { expected: usize, got: usize },

    /// The pressure curve could not be fit or evaluated.
    #[error("motored pressure interpolation failed")]
    Interpolation(#[from] InterpolationError),
}

/// Umbrella error for evaluation-time engine callbacks.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    PhysicalState(#[from] PhysicalStateError),

    #[error(transparent)]
    GeometryDomain(#[from] GeometryDomainError),

    #[error("motored pressure reference unavailable")]
    Motored(#[from] MotoredError),

    /// A boundary references a zone the accessor does not know.
    #[error("unknown zone {0:?}")]
    UnknownZone(ZoneHandle),
}

/// Errors from the cycle-averaged performance helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerformanceError {
    /// Integration needs at least two samples.
    #[error("at least 2 samples are required, got {0}")]
    TooFewSamples(usize),

    /// Time and pressure samples differ in length.
    #[error("{times} times vs {pressures} pressures")]
    LengthMismatch { times: usize, pressures: usize },

    /// Sample times must be strictly increasing.
    #[error("sample times are not strictly increasing at index {0}")]
    NotIncreasing(usize),
}
