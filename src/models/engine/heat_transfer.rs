//! Convective heat transfer between cylinder gas and chamber walls.
//!
//! A [`HeatTransferStrategy`] produces the film coefficient `α(t)` from the
//! live zone state and kinematics. [`HeatTransferModel`] pairs a strategy
//! with wall temperatures and turns `α` into a heat flux over the areas a
//! zone wets.
//!
//! All correlations are evaluated in SI base units (Pa, K, m, m³, m/s).
//!
//! # Selecting a correlation by name
//!
//! ```
//! use twine_engine_models::models::engine::{
//!     ConfigurationError,
//!     heat_transfer::{ChamberType, CorrelationKind, HeatTransferConfig},
//! };
//!
//! let config = HeatTransferConfig::from_names("Sitkel", Some("pre-chamber")).unwrap();
//! assert_eq!(config.correlation, CorrelationKind::Sitkel);
//! assert_eq!(config.chamber, Some(ChamberType::PreChamber));
//!
//! assert!(matches!(
//!     HeatTransferConfig::from_names("sitkel", Some("unknown")),
//!     Err(ConfigurationError::UnknownChamberType(_))
//! ));
//! ```

mod motored;
mod woschni;

use std::{f64::consts::PI, fmt, str::FromStr};

use uom::si::{
    area::square_meter,
    f64::{Area, HeatFluxDensity, HeatTransfer, ThermodynamicTemperature, Time},
    heat_flux_density::watt_per_square_meter,
    heat_transfer::watt_per_square_meter_kelvin,
    length::meter,
    pressure::pascal,
    temperature_interval::kelvin as delta_kelvin,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::support::units::TemperatureDifference;

use super::{
    ConfigurationError, EngineError,
    flame::SurfaceAreas,
    kinematics::EngineKinematics,
    zone::{ZoneState, positive},
};

pub use motored::{
    MotoredConfig, MotoredCylinder, MotoredPressure, MotoredRun, PolytropicMotoredRun,
    ValveTiming,
};
pub use woschni::{Woschni, WoschniReference};

/// Named heat-transfer correlations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CorrelationKind {
    #[default]
    Hohenberg,
    Eichelberg,
    Sitkel,
    Woschni,
}

impl CorrelationKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hohenberg => "hohenberg",
            Self::Eichelberg => "eichelberg",
            Self::Sitkel => "sitkel",
            Self::Woschni => "woschni",
        }
    }
}

impl fmt::Display for CorrelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive parse of `hohenberg`, `eichelberg`, `sitkel`, `woschni`.
impl FromStr for CorrelationKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hohenberg" => Ok(Self::Hohenberg),
            "eichelberg" => Ok(Self::Eichelberg),
            "sitkel" => Ok(Self::Sitkel),
            "woschni" => Ok(Self::Woschni),
            _ => Err(ConfigurationError::UnknownCorrelation(s.to_string())),
        }
    }
}

/// Combustion chamber layouts with tabulated correlation constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChamberType {
    #[default]
    DirectInjection,
    VortexChamber,
    PreChamber,
}

impl ChamberType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DirectInjection => "direct injection",
            Self::VortexChamber => "vortex chamber",
            Self::PreChamber => "pre-chamber",
        }
    }

    /// Sitkel's chamber constant `b`.
    #[must_use]
    pub fn sitkel_b(self) -> f64 {
        match self {
            Self::DirectInjection => 0.08,
            Self::VortexChamber => 0.2,
            Self::PreChamber => 0.3,
        }
    }
}

impl fmt::Display for ChamberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive; spaces, hyphens and underscores are interchangeable.
impl FromStr for ChamberType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '_' => ' ',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match key.as_str() {
            "direct injection" => Ok(Self::DirectInjection),
            "vortex chamber" => Ok(Self::VortexChamber),
            "pre chamber" => Ok(Self::PreChamber),
            _ => Err(ConfigurationError::UnknownChamberType(s.to_string())),
        }
    }
}

/// Wall temperatures seen by the gas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceTemperatures {
    /// Cylinder head.
    pub cover: ThermodynamicTemperature,
    /// Liner.
    pub wall: ThermodynamicTemperature,
    /// Piston crown.
    pub crown: ThermodynamicTemperature,
}

impl Default for SurfaceTemperatures {
    fn default() -> Self {
        Self {
            cover: ThermodynamicTemperature::new::<kelvin>(400.0),
            wall: ThermodynamicTemperature::new::<kelvin>(400.0),
            crown: ThermodynamicTemperature::new::<kelvin>(500.0),
        }
    }
}

/// Static heat-transfer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatTransferConfig {
    pub surfaces: SurfaceTemperatures,
    pub correlation: CorrelationKind,
    /// Defaults to direct injection where a correlation needs one.
    pub chamber: Option<ChamberType>,
}

impl HeatTransferConfig {
    /// Parses correlation and chamber names, with default wall temperatures.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an unknown correlation or
    /// chamber name.
    pub fn from_names(correlation: &str, chamber: Option<&str>) -> Result<Self, ConfigurationError> {
        Ok(Self {
            surfaces: SurfaceTemperatures::default(),
            correlation: correlation.parse()?,
            chamber: chamber.map(str::parse).transpose()?,
        })
    }
}

/// Film-coefficient correlations.
#[derive(Debug, Clone)]
pub enum HeatTransferStrategy {
    /// `α = 1.3e-2 V^-0.06 p^0.8 T^-0.4 (1.4 + cm)^0.8`.
    Hohenberg,
    /// `α = 7.79e-3 cbrt(cm) sqrt(p T)`.
    Eichelberg,
    /// `α = 1.294e-5 (1 + b) de^-0.3 T^-0.2 (p cm)^0.7`.
    Sitkel { b: f64 },
    Woschni(Woschni),
}

impl HeatTransferStrategy {
    /// Selects and configures the correlation named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if Woschni is selected without a
    /// motored reference, or with a chamber type it has no constants for.
    pub fn from_config(
        config: &HeatTransferConfig,
        woschni: Option<WoschniReference>,
    ) -> Result<Self, ConfigurationError> {
        let chamber = config.chamber.unwrap_or_default();
        match config.correlation {
            CorrelationKind::Hohenberg => Ok(Self::Hohenberg),
            CorrelationKind::Eichelberg => Ok(Self::Eichelberg),
            CorrelationKind::Sitkel => Ok(Self::Sitkel {
                b: chamber.sitkel_b(),
            }),
            CorrelationKind::Woschni => {
                let reference = woschni.ok_or(ConfigurationError::MissingMotoredReference)?;
                Ok(Self::Woschni(Woschni::new(chamber, reference)?))
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> CorrelationKind {
        match self {
            Self::Hohenberg => CorrelationKind::Hohenberg,
            Self::Eichelberg => CorrelationKind::Eichelberg,
            Self::Sitkel { .. } => CorrelationKind::Sitkel,
            Self::Woschni(_) => CorrelationKind::Woschni,
        }
    }

    /// Film coefficient for `zone` at time `t`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PhysicalState`] if the zone pressure,
    /// temperature or volume is not strictly positive, or a motored
    /// reference error for Woschni.
    pub fn coefficient(
        &self,
        kinematics: &EngineKinematics,
        t: Time,
        zone: &ZoneState,
    ) -> Result<HeatTransfer, EngineError> {
        let p = positive("pressure", zone.pressure.get::<pascal>())?;
        let temperature = positive("temperature", zone.temperature.get::<kelvin>())?;
        positive("volume", zone.volume.get::<cubic_meter>())?;

        let params = kinematics.params();
        let cm = params.mean_piston_speed().get::<meter_per_second>();

        let alpha = match self {
            Self::Hohenberg => {
                let volume = kinematics.cylinder_volume(t).get::<cubic_meter>();
                1.3e-2
                    * volume.powf(-0.06)
                    * p.powf(0.8)
                    * temperature.powf(-0.4)
                    * (1.4 + cm).powf(0.8)
            }
            Self::Eichelberg => 7.79e-3 * cm.cbrt() * (p * temperature).sqrt(),
            Self::Sitkel { b } => {
                let bore = params.bore_m();
                let gap = kinematics.piston_position(t).get::<meter>();
                let equivalent_diameter = 2.0 * bore * gap / (bore + 2.0 * gap);
                1.294e-5
                    * (1.0 + b)
                    * equivalent_diameter.powf(-0.3)
                    * temperature.powf(-0.2)
                    * (p * cm).powf(0.7)
            }
            Self::Woschni(woschni) => return woschni.coefficient(kinematics, t, zone),
        };

        Ok(HeatTransfer::new::<watt_per_square_meter_kelvin>(alpha))
    }
}

/// A correlation together with the wall temperatures it drives toward.
#[derive(Debug, Clone)]
pub struct HeatTransferModel {
    strategy: HeatTransferStrategy,
    surfaces: SurfaceTemperatures,
}

impl HeatTransferModel {
    #[must_use]
    pub fn new(strategy: HeatTransferStrategy, surfaces: SurfaceTemperatures) -> Self {
        Self { strategy, surfaces }
    }

    /// # Errors
    ///
    /// See [`HeatTransferStrategy::from_config`].
    pub fn from_config(
        config: &HeatTransferConfig,
        woschni: Option<WoschniReference>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(
            HeatTransferStrategy::from_config(config, woschni)?,
            config.surfaces,
        ))
    }

    #[must_use]
    pub fn strategy(&self) -> &HeatTransferStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn surfaces(&self) -> &SurfaceTemperatures {
        &self.surfaces
    }

    /// Fixed wall decomposition of a single-zone cylinder.
    ///
    /// Head is one bore area, the liner is the exposed cylinder wall and the
    /// crown is 1.3 bore areas to account for piston-bowl surface.
    #[must_use]
    pub fn cylinder_areas(kinematics: &EngineKinematics, t: Time) -> SurfaceAreas {
        let params = kinematics.params();
        let bore_area = params.bore_area();
        let gap = kinematics.piston_position(t).get::<meter>();

        SurfaceAreas {
            cover: bore_area,
            wall: Area::new::<square_meter>(gap * PI * params.bore_m()),
            crown: bore_area * 1.3,
        }
    }

    /// Net heat leaving `zone` through `areas`, per unit bore area.
    ///
    /// Each surface contributes `α (T_zone - T_surface) A_surface`, so the
    /// flux is positive when the gas is hotter than the walls.
    ///
    /// # Errors
    ///
    /// See [`HeatTransferStrategy::coefficient`].
    pub fn heat_flux(
        &self,
        kinematics: &EngineKinematics,
        t: Time,
        zone: &ZoneState,
        areas: &SurfaceAreas,
    ) -> Result<HeatFluxDensity, EngineError> {
        let alpha = self
            .strategy
            .coefficient(kinematics, t, zone)?
            .get::<watt_per_square_meter_kelvin>();

        let contribution = |surface: ThermodynamicTemperature, area: Area| {
            zone.temperature.minus(surface).get::<delta_kelvin>() * area.get::<square_meter>()
        };
        let total = contribution(self.surfaces.cover, areas.cover)
            + contribution(self.surfaces.wall, areas.wall)
            + contribution(self.surfaces.crown, areas.crown);

        Ok(HeatFluxDensity::new::<watt_per_square_meter>(
            alpha * total / kinematics.params().bore_area_m2(),
        ))
    }
}
