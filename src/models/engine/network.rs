//! Zone networks for the integrator.
//!
//! A builder creates the initial zone states and the boundaries that couple
//! them. The integrator takes ownership of [`CombustionNetwork::zones`] (or
//! the single-zone equivalent), advances it, and queries each boundary at
//! every evaluation time:
//!
//! - [`PistonBoundary::velocity`] moves the piston face of a zone.
//! - [`FlameFrontBoundary::velocity`] equalizes burned and unburned pressure.
//! - [`EntrainmentBoundary::mass_flow_rate`] transfers unburned charge.
//! - [`HeatLossBoundary::heat_flux`] removes heat through the walls.
//! - [`SparkBoundary::heat_input`] adds ignition energy.
//!
//! Boundaries read zone state through [`ZoneAccess`] and never keep it.

use std::rc::Rc;

use tracing::debug;
use uom::si::{
    f64::{Area, HeatFluxDensity, Mass, MassRate, Power, Time, Velocity, Volume},
    mass::kilogram,
    pressure::pascal,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::support::constraint::{Constraint, StrictlyPositive, UnitIntervalOpen};

use super::{
    ConfigurationError, EngineError,
    entrainment::{EntrainmentConfig, EntrainmentRateModel},
    flame::FlameGeometry,
    flame_speed::LaminarFlameSpeed,
    heat_transfer::HeatTransferModel,
    kinematics::EngineKinematics,
    spark::SparkPlug,
    zone::{GasState, ZoneAccess, ZoneHandle, ZoneRole, ZoneState, positive},
};

const BURNED: ZoneHandle = ZoneHandle(0);
const UNBURNED: ZoneHandle = ZoneHandle(1);
const CYLINDER: ZoneHandle = ZoneHandle(0);

/// Moving piston face of one zone.
#[derive(Debug, Clone)]
pub struct PistonBoundary {
    kinematics: Rc<EngineKinematics>,
    zone: ZoneHandle,
}

impl PistonBoundary {
    #[must_use]
    pub fn zone(&self) -> ZoneHandle {
        self.zone
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.kinematics.params().bore_area()
    }

    /// Piston velocity, positive when the zone expands.
    pub fn velocity(&self, t: Time) -> Velocity {
        self.kinematics.piston_velocity(t)
    }
}

/// Massless wall between the zones that keeps their pressures equal.
///
/// The wall moves at `k (p_burned - p_unburned) / p_unburned`, where `k` is
/// the unburned sound speed at build time.
#[derive(Debug, Clone, Copy)]
pub struct FlameFrontBoundary {
    burned: ZoneHandle,
    unburned: ZoneHandle,
    area: Area,
    expansion_rate_coefficient: Velocity,
}

impl FlameFrontBoundary {
    #[must_use]
    pub fn area(&self) -> Area {
        self.area
    }

    #[must_use]
    pub fn expansion_rate_coefficient(&self) -> Velocity {
        self.expansion_rate_coefficient
    }

    /// Front velocity, positive when the burned zone expands.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for an unknown zone or a non-positive
    /// unburned pressure.
    pub fn velocity<Z: ZoneAccess + ?Sized>(&self, zones: &Z) -> Result<Velocity, EngineError> {
        let burned = zones.require(self.burned)?.pressure.get::<pascal>();
        let unburned = zones.require(self.unburned)?.pressure.get::<pascal>();
        let unburned = positive("pressure", unburned)?;
        let k = self.expansion_rate_coefficient.get::<meter_per_second>();

        Ok(Velocity::new::<meter_per_second>(
            k * (burned - unburned) / unburned,
        ))
    }
}

/// Mass flow from the unburned into the burned zone.
#[derive(Debug)]
pub struct EntrainmentBoundary<F> {
    burned: ZoneHandle,
    unburned: ZoneHandle,
    model: EntrainmentRateModel<F>,
}

impl<F: LaminarFlameSpeed> EntrainmentBoundary<F> {
    #[must_use]
    pub fn model(&self) -> &EntrainmentRateModel<F> {
        &self.model
    }

    /// Entrainment rate at `t`, never negative.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for an unknown zone or any failure of
    /// [`EntrainmentRateModel::rate`].
    pub fn mass_flow_rate<Z: ZoneAccess + ?Sized>(
        &mut self,
        t: Time,
        zones: &Z,
    ) -> Result<MassRate, EngineError> {
        let burned = zones.require(self.burned)?;
        let unburned = zones.require(self.unburned)?;
        self.model.rate(t, burned, unburned)
    }

    /// Forwards an accepted integrator step to the model.
    pub fn accept_step(&mut self) {
        self.model.accept_step();
    }

    /// Forwards a rejected integrator step to the model.
    pub fn reject_step(&mut self) {
        self.model.reject_step();
    }
}

/// Which walls a heat-loss boundary sees.
#[derive(Debug, Clone)]
enum Exposure {
    Cylinder,
    Burned(Rc<FlameGeometry>),
    Unburned(Rc<FlameGeometry>),
}

/// Convective heat loss from one zone to the chamber walls.
#[derive(Debug, Clone)]
pub struct HeatLossBoundary {
    model: Rc<HeatTransferModel>,
    kinematics: Rc<EngineKinematics>,
    zone: ZoneHandle,
    burned: ZoneHandle,
    exposure: Exposure,
}

impl HeatLossBoundary {
    #[must_use]
    pub fn zone(&self) -> ZoneHandle {
        self.zone
    }

    /// Reference area the flux is normalized by, one bore area.
    #[must_use]
    pub fn area(&self) -> Area {
        self.kinematics.params().bore_area()
    }

    /// Heat leaving the zone per unit [`HeatLossBoundary::area`].
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for an unknown zone, a non-physical zone
    /// state, or a burned fraction outside `[0, 1]`.
    pub fn heat_flux<Z: ZoneAccess + ?Sized>(
        &self,
        t: Time,
        zones: &Z,
    ) -> Result<HeatFluxDensity, EngineError> {
        let zone = zones.require(self.zone)?;

        let areas = match &self.exposure {
            Exposure::Cylinder => HeatTransferModel::cylinder_areas(&self.kinematics, t),
            Exposure::Burned(geometry) => {
                geometry.burned_areas(t, self.burned_fraction(t, zones)?)?
            }
            Exposure::Unburned(geometry) => {
                geometry.unburned_areas(t, self.burned_fraction(t, zones)?)?
            }
        };

        self.model.heat_flux(&self.kinematics, t, zone, &areas)
    }

    fn burned_fraction<Z: ZoneAccess + ?Sized>(
        &self,
        t: Time,
        zones: &Z,
    ) -> Result<f64, EngineError> {
        let burned = zones.require(self.burned)?.volume.get::<cubic_meter>();
        Ok(burned / self.kinematics.cylinder_volume(t).get::<cubic_meter>())
    }
}

/// Spark energy injected into the burned kernel.
#[derive(Debug, Clone)]
pub struct SparkBoundary {
    kinematics: Rc<EngineKinematics>,
    spark: SparkPlug,
    zone: ZoneHandle,
}

impl SparkBoundary {
    #[must_use]
    pub fn zone(&self) -> ZoneHandle {
        self.zone
    }

    #[must_use]
    pub fn spark(&self) -> &SparkPlug {
        &self.spark
    }

    pub fn heat_input(&self, t: Time) -> Power {
        self.spark.heat_input(t, &self.kinematics)
    }
}

/// Burned and unburned zones with their boundaries.
#[derive(Debug)]
pub struct CombustionNetwork<F> {
    /// Initial zone states, indexed by the handles below.
    pub zones: Vec<ZoneState>,
    pub burned: ZoneHandle,
    pub unburned: ZoneHandle,
    /// Acts on the unburned zone only.
    pub piston: PistonBoundary,
    pub flame_front: FlameFrontBoundary,
    pub entrainment: EntrainmentBoundary<F>,
    pub burned_heat_loss: Option<HeatLossBoundary>,
    pub unburned_heat_loss: Option<HeatLossBoundary>,
}

impl<F> CombustionNetwork<F> {
    #[must_use]
    pub fn role(&self, zone: ZoneHandle) -> Option<ZoneRole> {
        if zone == self.burned {
            Some(ZoneRole::Burned)
        } else if zone == self.unburned {
            Some(ZoneRole::Unburned)
        } else {
            None
        }
    }

    /// Mass of all zones.
    #[must_use]
    pub fn total_mass(&self) -> Mass {
        total_mass(&self.zones)
    }
}

/// A combustion network with a spark on the burned kernel.
#[derive(Debug)]
pub struct IgnitionNetwork<F> {
    pub combustion: CombustionNetwork<F>,
    pub spark: SparkBoundary,
}

/// Builds two-zone networks for the ignition and combustion phases.
///
/// Each build gets a fresh [`EntrainmentRateModel`], so regime state never
/// leaks from one phase or run into the next.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
///
/// use twine_engine_models::models::engine::{
///     flame::{FlameGeometry, FlameTableConfig},
///     kinematics::KinematicParameters,
///     network::TwoZoneNetworkBuilder,
///     zone::{GasState, ZoneState},
/// };
/// use uom::si::{
///     dynamic_viscosity::pascal_second,
///     f64::{
///         DynamicViscosity, Frequency, Length, MassDensity, Pressure,
///         ThermodynamicTemperature, Time, Velocity,
///     },
///     frequency::hertz,
///     length::meter,
///     mass_density::kilogram_per_cubic_meter,
///     pressure::pascal,
///     thermodynamic_temperature::kelvin,
///     velocity::meter_per_second,
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
/// let geometry = Rc::new(FlameGeometry::new(params, FlameTableConfig::default()).unwrap());
/// let flame_speed = |_: Time, _: &ZoneState| Velocity::new::<meter_per_second>(0.5);
///
/// let charge = GasState {
///     temperature: ThermodynamicTemperature::new::<kelvin>(700.0),
///     pressure: Pressure::new::<pascal>(2.0e6),
///     density: MassDensity::new::<kilogram_per_cubic_meter>(9.95),
///     viscosity: DynamicViscosity::new::<pascal_second>(3.0e-5),
///     sound_speed: Velocity::new::<meter_per_second>(520.0),
/// };
///
/// let builder = TwoZoneNetworkBuilder::new(geometry, flame_speed);
/// let ignition = builder
///     .build_ignition(&charge, params.clearance_volume() * 1.2, 0.001)
///     .unwrap();
///
/// let network = &ignition.combustion;
/// assert_eq!(network.zones.len(), 2);
/// assert_eq!(network.piston.zone(), network.unburned);
/// ```
#[derive(Debug, Clone)]
pub struct TwoZoneNetworkBuilder<F> {
    geometry: Rc<FlameGeometry>,
    flame_speed: F,
    entrainment: EntrainmentConfig,
    heat_transfer: Option<Rc<HeatTransferModel>>,
    spark: SparkPlug,
}

impl<F: LaminarFlameSpeed + Clone> TwoZoneNetworkBuilder<F> {
    /// A builder with default entrainment and spark, and no heat transfer.
    pub fn new(geometry: Rc<FlameGeometry>, flame_speed: F) -> Self {
        Self {
            geometry,
            flame_speed,
            entrainment: EntrainmentConfig::default(),
            heat_transfer: None,
            spark: SparkPlug::default(),
        }
    }

    #[must_use]
    pub fn with_entrainment(self, entrainment: EntrainmentConfig) -> Self {
        Self {
            entrainment,
            ..self
        }
    }

    /// Adds heat-loss boundaries on both zones.
    #[must_use]
    pub fn with_heat_transfer(self, model: HeatTransferModel) -> Self {
        Self {
            heat_transfer: Some(Rc::new(model)),
            ..self
        }
    }

    #[must_use]
    pub fn with_spark(self, spark: SparkPlug) -> Self {
        Self { spark, ..self }
    }

    #[must_use]
    pub fn geometry(&self) -> &Rc<FlameGeometry> {
        &self.geometry
    }

    /// Splits a uniform charge into a small burned kernel and the rest.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if `fire_core_fraction` is not in
    /// `(0, 1)`, or for anything [`Self::build_combustion`] rejects.
    pub fn build_ignition(
        &self,
        initial: &GasState,
        volume: Volume,
        fire_core_fraction: f64,
    ) -> Result<IgnitionNetwork<F>, ConfigurationError> {
        if UnitIntervalOpen::check(&fire_core_fraction).is_err() {
            return Err(ConfigurationError::FireCoreFraction(fire_core_fraction));
        }

        let combustion = self.build_combustion(
            initial,
            volume * fire_core_fraction,
            initial,
            volume * (1.0 - fire_core_fraction),
        )?;
        debug!(fire_core_fraction, "built ignition network");

        Ok(IgnitionNetwork {
            combustion,
            spark: SparkBoundary {
                kinematics: self.geometry.shared_kinematics(),
                spark: self.spark,
                zone: BURNED,
            },
        })
    }

    /// Burned and unburned zones at independent states.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for a non-positive zone volume or
    /// unburned density.
    pub fn build_combustion(
        &self,
        burned: &GasState,
        burned_volume: Volume,
        unburned: &GasState,
        unburned_volume: Volume,
    ) -> Result<CombustionNetwork<F>, ConfigurationError> {
        StrictlyPositive::check(&burned_volume)
            .map_err(ConfigurationError::parameter("burned_volume"))?;
        StrictlyPositive::check(&unburned_volume)
            .map_err(ConfigurationError::parameter("unburned_volume"))?;

        let kinematics = self.geometry.shared_kinematics();
        let model = EntrainmentRateModel::new(
            Rc::clone(&self.geometry),
            self.flame_speed.clone(),
            self.entrainment,
            unburned.density,
        )?;

        let heat_loss = |zone, exposure| {
            self.heat_transfer.as_ref().map(|model| HeatLossBoundary {
                model: Rc::clone(model),
                kinematics: Rc::clone(&kinematics),
                zone,
                burned: BURNED,
                exposure,
            })
        };
        let burned_heat_loss = heat_loss(BURNED, Exposure::Burned(Rc::clone(&self.geometry)));
        let unburned_heat_loss =
            heat_loss(UNBURNED, Exposure::Unburned(Rc::clone(&self.geometry)));

        Ok(CombustionNetwork {
            zones: vec![
                ZoneState::from_gas(burned, burned_volume),
                ZoneState::from_gas(unburned, unburned_volume),
            ],
            burned: BURNED,
            unburned: UNBURNED,
            piston: PistonBoundary {
                kinematics: Rc::clone(&kinematics),
                zone: UNBURNED,
            },
            flame_front: FlameFrontBoundary {
                burned: BURNED,
                unburned: UNBURNED,
                area: self.geometry.params().bore_area() * 2.0,
                expansion_rate_coefficient: unburned.sound_speed,
            },
            entrainment: EntrainmentBoundary {
                burned: BURNED,
                unburned: UNBURNED,
                model,
            },
            burned_heat_loss,
            unburned_heat_loss,
        })
    }
}

/// One well-mixed cylinder zone.
#[derive(Debug)]
pub struct SingleZoneNetwork {
    pub zones: Vec<ZoneState>,
    pub cylinder: ZoneHandle,
    pub piston: PistonBoundary,
    pub heat_loss: Option<HeatLossBoundary>,
}

impl SingleZoneNetwork {
    #[must_use]
    pub fn total_mass(&self) -> Mass {
        total_mass(&self.zones)
    }
}

/// Builds the zero-dimensional cylinder network.
#[derive(Debug, Clone)]
pub struct SingleZoneNetworkBuilder {
    kinematics: Rc<EngineKinematics>,
    heat_transfer: Option<Rc<HeatTransferModel>>,
}

impl SingleZoneNetworkBuilder {
    #[must_use]
    pub fn new(kinematics: Rc<EngineKinematics>) -> Self {
        Self {
            kinematics,
            heat_transfer: None,
        }
    }

    /// Adds a heat-loss boundary with the fixed head, liner and crown areas.
    #[must_use]
    pub fn with_heat_transfer(self, model: HeatTransferModel) -> Self {
        Self {
            heat_transfer: Some(Rc::new(model)),
            ..self
        }
    }

    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for a non-positive volume.
    pub fn build(
        &self,
        initial: &GasState,
        volume: Volume,
    ) -> Result<SingleZoneNetwork, ConfigurationError> {
        StrictlyPositive::check(&volume).map_err(ConfigurationError::parameter("volume"))?;

        Ok(SingleZoneNetwork {
            zones: vec![ZoneState::from_gas(initial, volume)],
            cylinder: CYLINDER,
            piston: PistonBoundary {
                kinematics: Rc::clone(&self.kinematics),
                zone: CYLINDER,
            },
            heat_loss: self.heat_transfer.as_ref().map(|model| HeatLossBoundary {
                model: Rc::clone(model),
                kinematics: Rc::clone(&self.kinematics),
                zone: CYLINDER,
                burned: CYLINDER,
                exposure: Exposure::Cylinder,
            }),
        })
    }
}

fn total_mass(zones: &[ZoneState]) -> Mass {
    Mass::new::<kilogram>(zones.iter().map(|z| z.mass.get::<kilogram>()).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        angle::degree,
        area::square_meter,
        f64::{Angle, MassDensity, Pressure},
        heat_flux_density::watt_per_square_meter,
        mass_density::kilogram_per_cubic_meter,
        power::watt,
        time::second,
    };

    use crate::models::engine::{
        entrainment::Regime,
        heat_transfer::{HeatTransferConfig, HeatTransferStrategy, SurfaceTemperatures},
        test_support::{gas, geometry, kinematics},
    };

    type Speed = fn(Time, &ZoneState) -> Velocity;

    fn half_meter_per_second(_: Time, _: &ZoneState) -> Velocity {
        Velocity::new::<meter_per_second>(0.5)
    }

    fn builder() -> TwoZoneNetworkBuilder<Speed> {
        TwoZoneNetworkBuilder::new(geometry(), half_meter_per_second as Speed)
    }

    fn hohenberg() -> HeatTransferModel {
        HeatTransferModel::from_config(&HeatTransferConfig::default(), None).unwrap()
    }

    fn near_spark() -> (Time, Volume) {
        let kinematics = kinematics();
        let t = kinematics.time_at_angle(Angle::new::<degree>(350.0));
        (t, kinematics.cylinder_volume(t))
    }

    /// Moves `dm` of unburned mass into the burned zone at fixed volumes.
    fn transfer(zones: &mut [ZoneState], dm: Mass) {
        for (handle, sign) in [(BURNED, 1.0), (UNBURNED, -1.0)] {
            let zone = &mut zones[handle.0];
            zone.mass += dm * sign;
            zone.density = MassDensity::new::<kilogram_per_cubic_meter>(
                zone.mass.get::<kilogram>() / zone.volume.get::<cubic_meter>(),
            );
        }
    }

    #[test]
    fn ignition_splits_the_charge() {
        let (_, volume) = near_spark();
        let ignition = builder()
            .build_ignition(&gas(700.0, 2.0e6), volume, 0.001)
            .unwrap();
        let network = &ignition.combustion;

        let burned = network.zones[network.burned.0];
        let unburned = network.zones[network.unburned.0];
        assert_relative_eq!(
            burned.volume.get::<cubic_meter>(),
            0.001 * volume.get::<cubic_meter>()
        );
        assert_relative_eq!(
            (burned.volume + unburned.volume).get::<cubic_meter>(),
            volume.get::<cubic_meter>()
        );
        assert_eq!(burned.gas(), unburned.gas());

        assert_eq!(network.role(network.burned), Some(ZoneRole::Burned));
        assert_eq!(network.role(ZoneHandle(7)), None);
        assert_eq!(ignition.spark.zone(), network.burned);
    }

    #[test]
    fn rejects_fire_core_outside_unit_interval() {
        let (_, volume) = near_spark();
        for fraction in [0.0, 1.0, -0.1, f64::NAN] {
            assert!(matches!(
                builder().build_ignition(&gas(700.0, 2.0e6), volume, fraction),
                Err(ConfigurationError::FireCoreFraction(_))
            ));
        }
    }

    #[test]
    fn boundaries_are_wired_as_described() {
        let (t, volume) = near_spark();
        let unburned = gas(700.0, 2.0e6);
        let network = builder()
            .build_combustion(&gas(2200.0, 2.0e6), volume * 0.1, &unburned, volume * 0.9)
            .unwrap();

        assert_eq!(network.piston.zone(), network.unburned);
        assert_eq!(
            network.piston.velocity(t),
            kinematics().piston_velocity(t)
        );
        assert_relative_eq!(
            network.flame_front.area().get::<square_meter>(),
            2.0 * kinematics().params().bore_area().get::<square_meter>()
        );
        assert_eq!(
            network.flame_front.expansion_rate_coefficient(),
            unburned.sound_speed
        );
        assert!(network.burned_heat_loss.is_none());
        assert!(network.unburned_heat_loss.is_none());

        // Equal pressures leave the front at rest.
        let velocity = network.flame_front.velocity(&network.zones).unwrap();
        assert_eq!(velocity.get::<meter_per_second>(), 0.0);

        let mut zones = network.zones.clone();
        zones[BURNED.0].pressure = Pressure::new::<pascal>(2.1e6);
        let velocity = network.flame_front.velocity(&zones).unwrap();
        assert!(velocity.get::<meter_per_second>() > 0.0);
    }

    #[test]
    fn heat_loss_uses_per_zone_areas() {
        let (t, volume) = near_spark();
        let network = builder()
            .with_heat_transfer(hohenberg())
            .build_combustion(
                &gas(2200.0, 2.0e6),
                volume * 0.2,
                &gas(700.0, 2.0e6),
                volume * 0.8,
            )
            .unwrap();

        let burned_loss = network.burned_heat_loss.as_ref().unwrap();
        let unburned_loss = network.unburned_heat_loss.as_ref().unwrap();
        assert_eq!(burned_loss.zone(), network.burned);
        assert_eq!(unburned_loss.zone(), network.unburned);

        let burned_flux = burned_loss.heat_flux(t, &network.zones).unwrap();
        let unburned_flux = unburned_loss.heat_flux(t, &network.zones).unwrap();
        assert!(burned_flux.get::<watt_per_square_meter>() > 0.0);
        assert!(unburned_flux.get::<watt_per_square_meter>() > 0.0);

        let geometry = geometry();
        let fraction = 0.2 * volume.get::<cubic_meter>()
            / geometry.kinematics().cylinder_volume(t).get::<cubic_meter>();
        let areas = geometry.burned_areas(t, fraction).unwrap();
        let expected = hohenberg()
            .heat_flux(geometry.kinematics(), t, &network.zones[0], &areas)
            .unwrap();
        assert_relative_eq!(
            burned_flux.get::<watt_per_square_meter>(),
            expected.get::<watt_per_square_meter>()
        );
    }

    #[test]
    fn missing_zone_is_reported() {
        let (t, volume) = near_spark();
        let mut network = builder()
            .with_heat_transfer(hohenberg())
            .build_combustion(
                &gas(2200.0, 2.0e6),
                volume * 0.2,
                &gas(700.0, 2.0e6),
                volume * 0.8,
            )
            .unwrap();
        let only_burned = [network.zones[0]];

        assert!(matches!(
            network.entrainment.mass_flow_rate(t, &only_burned),
            Err(EngineError::UnknownZone(UNBURNED))
        ));
        assert!(matches!(
            network.unburned_heat_loss.as_ref().unwrap().heat_flux(t, &only_burned),
            Err(EngineError::UnknownZone(UNBURNED))
        ));
    }

    #[test]
    fn spark_heats_only_inside_its_window() {
        let (_, volume) = near_spark();
        let ignition = builder()
            .build_ignition(&gas(700.0, 2.0e6), volume, 0.001)
            .unwrap();
        let kinematics = kinematics();

        let inside = kinematics.time_at_angle(Angle::new::<degree>(350.5));
        let outside = kinematics.time_at_angle(Angle::new::<degree>(352.0));
        assert!(ignition.spark.heat_input(inside).get::<watt>() > 0.0);
        assert_eq!(ignition.spark.heat_input(outside).get::<watt>(), 0.0);
    }

    #[test]
    fn phases_conserve_mass_across_rebuild() {
        let (t0, volume) = near_spark();
        let builder = builder();
        let mut ignition = builder
            .build_ignition(&gas(700.0, 2.0e6), volume, 0.01)
            .unwrap();
        let initial_mass = ignition.combustion.total_mass();
        let initial_burned = ignition.combustion.zones[BURNED.0].mass;

        let dt = Time::new::<second>(1.0e-5);
        let mut t = t0;
        for _ in 0..20 {
            let network = &mut ignition.combustion;
            let rate = network.entrainment.mass_flow_rate(t, &network.zones).unwrap();
            network.entrainment.accept_step();
            transfer(&mut network.zones, rate * dt);
            t += dt;
        }

        let zones = &ignition.combustion.zones;
        let (burned, unburned) = (zones[BURNED.0], zones[UNBURNED.0]);
        assert!(burned.mass > initial_burned);

        let combustion = builder
            .build_combustion(&burned.gas(), burned.volume, &unburned.gas(), unburned.volume)
            .unwrap();
        assert_relative_eq!(
            combustion.total_mass().get::<kilogram>(),
            initial_mass.get::<kilogram>(),
            max_relative = 1e-12
        );
        assert_eq!(
            combustion.entrainment.model().state().regime(),
            Regime::Growth
        );
    }

    #[test]
    fn single_zone_network() {
        let kinematics = Rc::new(kinematics());
        let t = kinematics.time_at_angle(Angle::new::<degree>(380.0));
        let volume = kinematics.cylinder_volume(t);
        let model = HeatTransferModel::new(
            HeatTransferStrategy::Eichelberg,
            SurfaceTemperatures::default(),
        );

        let network = SingleZoneNetworkBuilder::new(Rc::clone(&kinematics))
            .with_heat_transfer(model.clone())
            .build(&gas(1500.0, 4.0e6), volume)
            .unwrap();

        assert_eq!(network.zones.len(), 1);
        assert_eq!(network.piston.zone(), network.cylinder);

        let loss = network.heat_loss.as_ref().unwrap();
        let flux = loss.heat_flux(t, &network.zones).unwrap();
        let areas = HeatTransferModel::cylinder_areas(&kinematics, t);
        let expected = model
            .heat_flux(&kinematics, t, &network.zones[0], &areas)
            .unwrap();
        assert_eq!(flux, expected);
        assert_eq!(loss.area(), kinematics.params().bore_area());

        assert!(matches!(
            SingleZoneNetworkBuilder::new(kinematics).build(&gas(300.0, 1.0e5), volume * 0.0),
            Err(ConfigurationError::Parameter { name: "volume", .. })
        ));
    }
}
