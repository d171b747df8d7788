//! Inverse flame-radius table over piston gap and burned-volume fraction.

use tracing::debug;

use crate::{
    models::engine::{ConfigurationError, GeometryDomainError, kinematics::KinematicParameters},
    support::{
        constraint::{Constraint, UnitIntervalOpen},
        interpolate::linspace,
    },
};

use super::shape;

/// Sampling resolution of the flame-radius table.
///
/// Radii are sampled densely inside a small kernel near the spark, where
/// the burned fraction changes fastest relative to radius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlameTableConfig {
    /// Number of piston-gap columns spanning the stroke.
    pub gap_samples: usize,

    /// Radius samples on `[0, kernel_radius]`.
    pub kernel_samples: usize,

    /// Radius samples on `[kernel_radius, max_radius]`.
    pub bulk_samples: usize,

    /// Kernel radius as a fraction of the bore.
    pub kernel_bore_fraction: f64,
}

impl Default for FlameTableConfig {
    fn default() -> Self {
        Self {
            gap_samples: 50,
            kernel_samples: 20,
            bulk_samples: 80,
            kernel_bore_fraction: 0.1,
        }
    }
}

impl FlameTableConfig {
    pub(crate) const MIN_GAP_SAMPLES: usize = 50;

    /// Checks the resolution before any table is built.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the table would be too coarse or
    /// the kernel fraction is outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.gap_samples < Self::MIN_GAP_SAMPLES {
            return Err(ConfigurationError::Resolution {
                what: "flame table gap axis",
                got: self.gap_samples,
                required: Self::MIN_GAP_SAMPLES,
            });
        }
        for (what, got) in [
            ("flame table kernel radii", self.kernel_samples),
            ("flame table bulk radii", self.bulk_samples),
        ] {
            if got < 2 {
                return Err(ConfigurationError::Resolution {
                    what,
                    got,
                    required: 2,
                });
            }
        }
        UnitIntervalOpen::check(&self.kernel_bore_fraction)
            .map_err(ConfigurationError::parameter("kernel_bore_fraction"))
    }
}

/// Radius as a function of `cbrt(fraction)` at one piston gap.
#[derive(Debug)]
struct Column {
    cbrt_fractions: Vec<f64>,
    radii: Vec<f64>,
}

impl Column {
    fn radius(&self, cbrt_fraction: f64) -> f64 {
        let last = self.radii.len() - 1;
        if cbrt_fraction >= self.cbrt_fractions[last] {
            return self.radii[last];
        }

        let upper = self.cbrt_fractions.partition_point(|&c| c <= cbrt_fraction);
        let i = upper.saturating_sub(1).min(last - 1);
        let (c0, c1) = (self.cbrt_fractions[i], self.cbrt_fractions[i + 1]);
        let w = (cbrt_fraction - c0) / (c1 - c0);

        self.radii[i] + w * (self.radii[i + 1] - self.radii[i])
    }
}

/// Precomputed `(gap, fraction) → radius` interpolant.
#[derive(Debug)]
pub(super) struct FlameRadiusTable {
    bore: f64,
    gaps: Vec<f64>,
    columns: Vec<Column>,
}

impl FlameRadiusTable {
    /// Samples the forward mapping over the whole stroke.
    pub(super) fn build(params: &KinematicParameters, config: &FlameTableConfig) -> Self {
        let bore = params.bore_m();
        let first_gap = params.clearance_gap_m();
        let gaps = linspace(first_gap, first_gap + params.stroke_m(), config.gap_samples);
        let kernel = bore * config.kernel_bore_fraction;

        let columns = gaps
            .iter()
            .map(|&gap| {
                let r_max = shape::max_radius(bore, gap);
                let cylinder = params.volume_at_gap_m(gap);

                let radii: Vec<f64> = linspace(0.0, kernel, config.kernel_samples)
                    .into_iter()
                    .chain(linspace(kernel, r_max, config.bulk_samples).into_iter().skip(1))
                    .collect();
                let cbrt_fractions = radii
                    .iter()
                    .map(|&r| (shape::burned_volume(r, bore, gap) / cylinder).cbrt())
                    .collect();

                Column {
                    cbrt_fractions,
                    radii,
                }
            })
            .collect();

        debug!(
            gaps = config.gap_samples,
            radii = config.kernel_samples + config.bulk_samples - 1,
            "built flame radius table"
        );

        Self {
            bore,
            gaps,
            columns,
        }
    }

    /// Interpolated flame radius in meters.
    ///
    /// Linear in `cbrt(fraction)` within a column and linear in gap across
    /// columns, capped at the largest radius reachable at `gap`.
    pub(super) fn radius(&self, gap: f64, fraction: f64) -> Result<f64, GeometryDomainError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(GeometryDomainError::BurnedFraction(fraction));
        }
        let gap = self.clamp_gap(gap)?;

        let upper = self.gaps.partition_point(|&g| g <= gap);
        let i = upper.saturating_sub(1).min(self.gaps.len() - 2);
        let w = (gap - self.gaps[i]) / (self.gaps[i + 1] - self.gaps[i]);

        let c = fraction.cbrt();
        let low = self.columns[i].radius(c);
        let high = self.columns[i + 1].radius(c);
        let radius = low + w * (high - low);

        Ok(radius.clamp(0.0, shape::max_radius(self.bore, gap)))
    }

    /// Absorbs round-off at the stroke ends, rejects anything further out.
    fn clamp_gap(&self, gap: f64) -> Result<f64, GeometryDomainError> {
        let min = self.gaps[0];
        let max = self.gaps[self.gaps.len() - 1];
        let slack = 1e-9 * (max - min);

        if gap >= min - slack && gap <= max + slack {
            Ok(gap.clamp(min, max))
        } else {
            Err(GeometryDomainError::PistonGap { gap, min, max })
        }
    }
}
