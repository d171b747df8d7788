//! Flame-front geometry for a two-zone spark-ignition model.
//!
//! The flame is a sphere centred on the spark plug at the cylinder head,
//! clipped by the liner and the piston crown. Solvers report the burned-zone
//! volume, so the radius is recovered by inverting the burned-volume mapping
//! through a table built once on first use.
//!
//! Every query takes time `t` and the burned volume fraction
//! `burned_volume / cylinder_volume(t)`, and is pure in that pair.

mod shape;
mod solve;
mod table;

use std::{cell::OnceCell, f64::consts::PI, rc::Rc};

use uom::si::{
    area::square_meter,
    f64::{Area, Length, Time},
    length::meter,
    time::second,
    volume::cubic_meter,
};

use crate::support::{
    constraint::{Constraint, UnitInterval},
    memo::ExactMemo,
};

use super::{
    ConfigurationError, GeometryDomainError,
    kinematics::{EngineKinematics, KinematicParameters},
};

pub use solve::{FlameSolveConfig, FlameSolveError};
pub use table::FlameTableConfig;

use table::FlameRadiusTable;

const MEMO_CAPACITY: usize = 64;

/// Areas one zone exposes to the combustion chamber walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceAreas {
    /// Cylinder head.
    pub cover: Area,
    /// Exposed liner.
    pub wall: Area,
    /// Piston crown.
    pub crown: Area,
}

/// Radius and piston gap for one `(t, fraction)` query, in meters.
#[derive(Debug, Clone, Copy)]
struct FlameSnapshot {
    radius: f64,
    gap: f64,
}

/// Engine kinematics extended with flame-front geometry.
///
/// # Example
///
/// ```
/// use twine_engine_models::models::engine::{
///     flame::{FlameGeometry, FlameTableConfig},
///     kinematics::KinematicParameters,
/// };
/// use uom::si::{
///     f64::{Frequency, Length, Time},
///     frequency::hertz,
///     length::meter,
///     time::second,
/// };
///
/// let params = KinematicParameters::new(
///     Frequency::new::<hertz>(16.67),
///     Length::new::<meter>(0.086),
///     Length::new::<meter>(0.086),
///     1.0 / 3.5,
///     10.0,
/// )
/// .unwrap();
/// let geometry = FlameGeometry::new(params, FlameTableConfig::default()).unwrap();
///
/// let t = Time::new::<second>(0.0);
/// assert_eq!(geometry.flame_area(t, 0.0).unwrap().value, 0.0);
/// assert!(geometry.flame_radius(t, 1.5).is_err());
/// ```
#[derive(Debug)]
pub struct FlameGeometry {
    kinematics: Rc<EngineKinematics>,
    config: FlameTableConfig,
    table: OnceCell<FlameRadiusTable>,
    memo: ExactMemo<(f64, f64), FlameSnapshot>,
}

impl FlameGeometry {
    /// Creates the geometry; the radius table is built on the first query.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the table configuration is invalid.
    pub fn new(
        params: KinematicParameters,
        config: FlameTableConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            kinematics: Rc::new(EngineKinematics::new(params)),
            config,
            table: OnceCell::new(),
            memo: ExactMemo::new(MEMO_CAPACITY),
        })
    }

    #[must_use]
    pub fn kinematics(&self) -> &EngineKinematics {
        &self.kinematics
    }

    /// Shared handle to the kinematics, for boundaries that only need time.
    #[must_use]
    pub fn shared_kinematics(&self) -> Rc<EngineKinematics> {
        Rc::clone(&self.kinematics)
    }

    #[must_use]
    pub fn params(&self) -> &KinematicParameters {
        self.kinematics.params()
    }

    /// Flame radius, in `[0, sqrt((bore/2)² + gap(t)²)]`.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn flame_radius(&self, t: Time, fraction: f64) -> Result<Length, GeometryDomainError> {
        Ok(Length::new::<meter>(self.snapshot(t, fraction)?.radius))
    }

    /// Area of the flame surface separating the zones.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn flame_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        let FlameSnapshot { radius, gap } = self.snapshot(t, fraction)?;
        Ok(Area::new::<square_meter>(shape::flame_area(
            radius,
            self.params().bore_m(),
            gap,
        )))
    }

    /// Cylinder-head area inside the flame.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn burned_cover_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        Ok(self.burned_areas(t, fraction)?.cover)
    }

    /// Liner area inside the flame.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn burned_wall_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        Ok(self.burned_areas(t, fraction)?.wall)
    }

    /// Piston-crown area inside the flame.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn burned_piston_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        Ok(self.burned_areas(t, fraction)?.crown)
    }

    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn unburned_cover_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        Ok(self.unburned_areas(t, fraction)?.cover)
    }

    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn unburned_wall_area(&self, t: Time, fraction: f64) -> Result<Area, GeometryDomainError> {
        Ok(self.unburned_areas(t, fraction)?.wall)
    }

    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn unburned_piston_area(
        &self,
        t: Time,
        fraction: f64,
    ) -> Result<Area, GeometryDomainError> {
        Ok(self.unburned_areas(t, fraction)?.crown)
    }

    /// Wall areas wetted by the burned zone.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn burned_areas(&self, t: Time, fraction: f64) -> Result<SurfaceAreas, GeometryDomainError> {
        Ok(self.burned_areas_of(self.snapshot(t, fraction)?))
    }

    /// Wall areas wetted by the unburned zone, the complement of
    /// [`FlameGeometry::burned_areas`].
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryDomainError`] if `fraction` is outside `[0, 1]`.
    pub fn unburned_areas(
        &self,
        t: Time,
        fraction: f64,
    ) -> Result<SurfaceAreas, GeometryDomainError> {
        let snapshot = self.snapshot(t, fraction)?;
        let burned = self.burned_areas_of(snapshot);
        let gap = snapshot.gap;
        let bore_area = self.params().bore_area();
        let liner = Area::new::<square_meter>(PI * self.params().bore_m() * gap);

        Ok(SurfaceAreas {
            cover: bore_area - burned.cover,
            wall: liner - burned.wall,
            crown: bore_area - burned.crown,
        })
    }

    /// Inverts the burned-volume mapping directly by bisection.
    ///
    /// Slower than [`FlameGeometry::flame_radius`] and uncached; use it to
    /// check the interpolant.
    ///
    /// # Errors
    ///
    /// Returns a [`FlameSolveError`] if `fraction` is outside `[0, 1]` or the
    /// solver fails to converge.
    pub fn solve_flame_radius(
        &self,
        t: Time,
        fraction: f64,
        config: &FlameSolveConfig,
    ) -> Result<Length, FlameSolveError> {
        check_fraction(fraction)?;
        let state = self.kinematics.piston_state(t);
        let target = fraction * state.volume.get::<cubic_meter>();

        solve::flame_radius(
            self.params().bore_m(),
            state.position.get::<meter>(),
            target,
            config,
        )
    }

    fn table(&self) -> &FlameRadiusTable {
        self.table
            .get_or_init(|| FlameRadiusTable::build(self.kinematics.params(), &self.config))
    }

    fn burned_areas_of(&self, snapshot: FlameSnapshot) -> SurfaceAreas {
        let FlameSnapshot { radius, gap } = snapshot;
        let bore = self.params().bore_m();
        let half_bore = 0.5 * bore;

        let (cover, wall) = if radius < half_bore {
            (PI * radius * radius, 0.0)
        } else {
            (
                self.params().bore_area_m2(),
                PI * bore * (radius * radius - half_bore * half_bore).sqrt(),
            )
        };
        let crown = if radius < gap {
            0.0
        } else {
            PI * (radius * radius - gap * gap)
        };

        SurfaceAreas {
            cover: Area::new::<square_meter>(cover),
            wall: Area::new::<square_meter>(wall),
            crown: Area::new::<square_meter>(crown),
        }
    }

    fn snapshot(&self, t: Time, fraction: f64) -> Result<FlameSnapshot, GeometryDomainError> {
        check_fraction(fraction)?;
        let key = (t.get::<second>(), fraction);

        self.memo.get_or_try_insert_with(&key, || {
            let gap = self.kinematics.piston_position(t).get::<meter>();
            let radius = self.table().radius(gap, fraction)?;
            Ok(FlameSnapshot { radius, gap })
        })
    }
}

fn check_fraction(fraction: f64) -> Result<(), GeometryDomainError> {
    UnitInterval::check(&fraction).map_err(|_| GeometryDomainError::BurnedFraction(fraction))
}
