//! Reference data for one municipality: district baselines, soil and
//! formation profiles, and the demographic notes shown next to results.
//!
//! A [`Catalog`] is validated once when it is built and is read-only from
//! then on; every constructor goes through [`Catalog::validate`].

use std::{
    collections::{BTreeMap, HashSet},
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RiskError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("catalog validation error: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, RiskError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(RiskError::validation(format!(
                "latitude {lat} must be between -90 and 90"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(RiskError::validation(format!(
                "longitude {lng} must be between -180 and 180"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Parses raw form input, rejecting blanks and non-numeric text.
    pub fn parse(lat: &str, lng: &str) -> Result<Self, RiskError> {
        Self::new(parse_degrees("latitude", lat)?, parse_degrees("longitude", lng)?)
    }

    /// Planar distance in degree space.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        ((self.lat - other.lat).powi(2) + (self.lng - other.lng).powi(2)).sqrt()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

fn parse_degrees(field: &str, value: &str) -> Result<f64, RiskError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RiskError::validation(format!("{field} is required")));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| RiskError::validation(format!("unable to parse {field} from '{value}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Andisol,
    Inceptisol,
    Entisol,
    Alfisol,
}

impl SoilType {
    pub const ALL: [SoilType; 4] = [
        SoilType::Andisol,
        SoilType::Inceptisol,
        SoilType::Entisol,
        SoilType::Alfisol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Andisol => "Andisol",
            SoilType::Inceptisol => "Inceptisol",
            SoilType::Entisol => "Entisol",
            SoilType::Alfisol => "Alfisol",
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub permeability: f64,
    pub cohesion: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationProfile {
    pub name: String,
    pub stability: f64,
    #[serde(default)]
    pub description: String,
    /// Lower bound (exclusive) of the elevation band; `None` marks the
    /// fallback band for everything below the others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above_elevation_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub population: String,
    pub main_activity: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

impl Demographics {
    pub fn unknown() -> Self {
        Self {
            population: "Información no disponible".into(),
            main_activity: "Actividad mixta rural".into(),
            risk_factors: vec!["Factores generales de la región".into()],
            strengths: vec!["Características propias de la vereda".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub center: Coordinates,
    pub base_elevation_m: f64,
    pub base_slope_deg: f64,
    pub base_precipitation_mm: f64,
    pub soil: SoilType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

impl District {
    pub fn demographics(&self) -> Demographics {
        self.demographics.clone().unwrap_or_else(Demographics::unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogData")]
pub struct Catalog {
    municipality: String,
    region: String,
    center: Coordinates,
    soils: BTreeMap<SoilType, SoilProfile>,
    formations: Vec<FormationProfile>,
    districts: Vec<District>,
}

/// Unvalidated wire form; every deserialized [`Catalog`] passes through
/// [`Catalog::validate`] on the way in.
#[derive(Deserialize)]
struct CatalogData {
    municipality: String,
    #[serde(default)]
    region: String,
    center: Coordinates,
    soils: BTreeMap<SoilType, SoilProfile>,
    formations: Vec<FormationProfile>,
    districts: Vec<District>,
}

impl TryFrom<CatalogData> for Catalog {
    type Error = CatalogError;

    fn try_from(data: CatalogData) -> Result<Self, Self::Error> {
        let catalog = Catalog {
            municipality: data.municipality,
            region: data.region,
            center: data.center,
            soils: data.soils,
            formations: data.formations,
            districts: data.districts,
        };
        catalog.validate()?;
        Ok(catalog)
    }
}

impl Catalog {
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_yaml::from_str(text)?;
        Catalog::try_from(data)
    }

    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.districts.is_empty() {
            return Err(CatalogError::Invalid(
                "catalog must define at least one district".into(),
            ));
        }

        let mut names = HashSet::new();
        for district in &self.districts {
            if !names.insert(district.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "district '{}' defined more than once",
                    district.name
                )));
            }
            Coordinates::new(district.center.lat, district.center.lng).map_err(|err| {
                CatalogError::Invalid(format!("district '{}': {err}", district.name))
            })?;
        }

        for soil in SoilType::ALL {
            let profile = self.soils.get(&soil).ok_or_else(|| {
                CatalogError::Invalid(format!("missing profile for soil type {soil}"))
            })?;
            check_unit("permeability", soil.as_str(), profile.permeability)?;
            check_unit("cohesion", soil.as_str(), profile.cohesion)?;
        }

        let Some((fallback, bands)) = self.formations.split_last() else {
            return Err(CatalogError::Invalid(
                "catalog must define at least one formation".into(),
            ));
        };
        if fallback.above_elevation_m.is_some() {
            return Err(CatalogError::Invalid(format!(
                "last formation '{}' must not have an elevation threshold",
                fallback.name
            )));
        }
        let mut previous = f64::INFINITY;
        for band in bands {
            let threshold = band.above_elevation_m.ok_or_else(|| {
                CatalogError::Invalid(format!(
                    "formation '{}' needs an elevation threshold",
                    band.name
                ))
            })?;
            if threshold >= previous {
                return Err(CatalogError::Invalid(format!(
                    "formation thresholds must descend, '{}' is out of order",
                    band.name
                )));
            }
            previous = threshold;
        }
        for formation in &self.formations {
            check_unit("stability", &formation.name, formation.stability)?;
        }

        Ok(())
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn district(&self, name: &str) -> Option<&District> {
        self.districts.iter().find(|district| district.name == name)
    }

    pub fn soil(&self, soil: SoilType) -> Option<&SoilProfile> {
        self.soils.get(&soil)
    }

    pub fn formations(&self) -> &[FormationProfile] {
        &self.formations
    }

    pub fn formation(&self, name: &str) -> Option<&FormationProfile> {
        self.formations.iter().find(|formation| formation.name == name)
    }

    /// Picks the first band whose threshold the elevation exceeds, else the
    /// fallback band. Validation guarantees the fallback exists, so this is
    /// only `None` for a catalog that skipped it.
    pub fn formation_for_elevation(&self, elevation_m: f64) -> Option<&FormationProfile> {
        self.formations
            .iter()
            .find(|formation| {
                formation
                    .above_elevation_m
                    .is_some_and(|threshold| elevation_m > threshold)
            })
            .or_else(|| self.formations.last())
    }

    /// San Pedro de los Milagros, Antioquia.
    pub fn san_pedro() -> Self {
        let soils = BTreeMap::from([
            (SoilType::Andisol, soil(0.7, 0.6, "Suelos volcánicos")),
            (SoilType::Inceptisol, soil(0.5, 0.5, "Suelos jóvenes")),
            (SoilType::Entisol, soil(0.8, 0.3, "Suelos poco desarrollados")),
            (SoilType::Alfisol, soil(0.4, 0.7, "Suelos maduros")),
        ]);

        let formations = vec![
            formation(
                "Batolito Antioqueño",
                0.8,
                "Rocas ígneas intrusivas, alta estabilidad",
                Some(2350.0),
            ),
            formation(
                "Formación Combia",
                0.7,
                "Rocas volcánicas, estabilidad media-alta",
                Some(2250.0),
            ),
            formation(
                "Formación Amagá",
                0.6,
                "Sedimentos continentales, estabilidad media",
                Some(2100.0),
            ),
            formation(
                "Depósitos Aluviales",
                0.4,
                "Sedimentos recientes, baja estabilidad",
                None,
            ),
        ];

        let districts = vec![
            District {
                name: "Vereda La Clarita".into(),
                description: "Vereda del Corregimiento Llano de Ovejas".into(),
                center: Coordinates { lat: 6.43, lng: -75.52 },
                base_elevation_m: 2180.0,
                base_slope_deg: 15.0,
                base_precipitation_mm: 1920.0,
                soil: SoilType::Alfisol,
                demographics: Some(demographics(
                    "~380 habitantes",
                    "Agricultura de pancoger y ganadería menor",
                    &["Pendientes moderadas", "Uso agrícola intensivo"],
                    &["Organización comunitaria", "Acceso vial"],
                )),
            },
            District {
                name: "Vereda La Cuchilla".into(),
                description: "Zona montañosa del corregimiento".into(),
                center: Coordinates { lat: 6.40, lng: -75.54 },
                base_elevation_m: 2400.0,
                base_slope_deg: 30.0,
                base_precipitation_mm: 2200.0,
                soil: SoilType::Entisol,
                demographics: Some(demographics(
                    "~250 habitantes",
                    "Ganadería extensiva y conservación",
                    &["Terreno montañoso", "Pendientes pronunciadas"],
                    &["Cobertura vegetal natural", "Biodiversidad"],
                )),
            },
            District {
                name: "Vereda La Empalizada".into(),
                description: "Área rural del corregimiento".into(),
                center: Coordinates { lat: 6.42, lng: -75.53 },
                base_elevation_m: 2120.0,
                base_slope_deg: 12.0,
                base_precipitation_mm: 1880.0,
                soil: SoilType::Inceptisol,
                demographics: Some(demographics(
                    "~320 habitantes",
                    "Cultivos mixtos y avicultura",
                    &["Proximidad a corrientes", "Expansión agrícola"],
                    &["Suelos fértiles", "Diversificación productiva"],
                )),
            },
            District {
                name: "Vereda Llano de Ovejas".into(),
                description: "Centro del corregimiento".into(),
                center: Coordinates { lat: 6.435, lng: -75.515 },
                base_elevation_m: 2160.0,
                base_slope_deg: 8.0,
                base_precipitation_mm: 1850.0,
                soil: SoilType::Alfisol,
                demographics: Some(demographics(
                    "~450 habitantes",
                    "Centro de servicios rurales y ganadería",
                    &["Concentración poblacional", "Actividad comercial"],
                    &["Infraestructura desarrollada", "Centro del corregimiento"],
                )),
            },
            District {
                name: "Vereda El Carmelo".into(),
                description: "Zona occidental del municipio".into(),
                center: Coordinates { lat: 6.41, lng: -75.56 },
                base_elevation_m: 2200.0,
                base_slope_deg: 18.0,
                base_precipitation_mm: 1900.0,
                soil: SoilType::Inceptisol,
                demographics: Some(demographics(
                    "~350 habitantes",
                    "Ganadería y agricultura familiar",
                    &["Compactación del suelo", "Manejo del agua"],
                    &["Tradición agropecuaria", "Cohesión social"],
                )),
            },
            District {
                name: "Vereda San Antonio".into(),
                description: "Área suroccidental".into(),
                center: Coordinates { lat: 6.405, lng: -75.565 },
                base_elevation_m: 2300.0,
                base_slope_deg: 22.0,
                base_precipitation_mm: 2100.0,
                soil: SoilType::Andisol,
                demographics: Some(demographics(
                    "~280 habitantes",
                    "Explotación forestal y ganadería",
                    &["Tala selectiva", "Erosión en laderas"],
                    &["Recursos forestales", "Potencial ecoturístico"],
                )),
            },
            District {
                name: "Vereda Pantanillo".into(),
                description: "Zona norte del municipio".into(),
                center: Coordinates { lat: 6.425, lng: -75.545 },
                base_elevation_m: 2140.0,
                base_slope_deg: 10.0,
                base_precipitation_mm: 1800.0,
                soil: SoilType::Alfisol,
                demographics: Some(demographics(
                    "~420 habitantes",
                    "Agricultura intensiva y porcicultura",
                    &["Uso intensivo del suelo", "Manejo de residuos"],
                    &["Proximidad urbana", "Tecnificación agrícola"],
                )),
            },
            District {
                name: "Centro Urbano".into(),
                description: "Casco urbano del municipio".into(),
                center: Coordinates { lat: 6.4167, lng: -75.55 },
                base_elevation_m: 2150.0,
                base_slope_deg: 5.0,
                base_precipitation_mm: 1750.0,
                soil: SoilType::Entisol,
                demographics: None,
            },
        ];

        Self {
            municipality: "San Pedro de los Milagros".into(),
            region: "Antioquia".into(),
            center: Coordinates { lat: 6.4167, lng: -75.55 },
            soils,
            formations,
            districts,
        }
    }
}

fn check_unit(field: &str, owner: &str, value: f64) -> Result<(), CatalogError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::Invalid(format!(
            "{field} for '{owner}' must be within [0, 1], got {value}"
        )))
    }
}

fn soil(permeability: f64, cohesion: f64, description: &str) -> SoilProfile {
    SoilProfile {
        permeability,
        cohesion,
        description: description.into(),
    }
}

fn formation(
    name: &str,
    stability: f64,
    description: &str,
    above_elevation_m: Option<f64>,
) -> FormationProfile {
    FormationProfile {
        name: name.into(),
        stability,
        description: description.into(),
        above_elevation_m,
    }
}

fn demographics(
    population: &str,
    main_activity: &str,
    risk_factors: &[&str],
    strengths: &[&str],
) -> Demographics {
    Demographics {
        population: population.into(),
        main_activity: main_activity.into(),
        risk_factors: risk_factors.iter().map(|s| s.to_string()).collect(),
        strengths: strengths.iter().map(|s| s.to_string()).collect(),
    }
}

pub struct CatalogLoader {
    base_dir: PathBuf,
}

impl CatalogLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Catalog> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let catalog = Catalog::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(catalog)
    }
}
