use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::{Catalog, District, SoilType},
    rng::Jitter,
};

pub const ELEVATION_JITTER_M: f64 = 40.0;
pub const SLOPE_JITTER_DEG: f64 = 4.0;
pub const PRECIPITATION_JITTER_MM: f64 = 75.0;

/// Point-in-time terrain attributes for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeologicalSnapshot {
    pub elevation_m: f64,
    pub slope_deg: f64,
    pub precipitation_mm: f64,
    pub soil: SoilType,
    pub geological_formation: String,
}

/// Baseline plus jitter for the district's elevation, slope and rainfall.
/// Soil comes straight from the district; the formation is banded on the
/// unrounded elevation. Slope keeps one decimal and precipitation is whole
/// millimetres; elevation is only rounded for display.
pub fn synthesize<R: Rng + ?Sized>(
    catalog: &Catalog,
    district: &District,
    rng: &mut R,
) -> GeologicalSnapshot {
    let elevation_m = district.base_elevation_m + rng.jitter(ELEVATION_JITTER_M);
    let slope = (district.base_slope_deg + rng.jitter(SLOPE_JITTER_DEG)).max(0.0);
    let slope_deg = (slope * 10.0).round() / 10.0;
    let precipitation_mm =
        (district.base_precipitation_mm + rng.jitter(PRECIPITATION_JITTER_MM)).round();
    let geological_formation = catalog
        .formation_for_elevation(elevation_m)
        .map(|formation| formation.name.clone())
        .unwrap_or_default();

    debug!(
        district = %district.name,
        elevation_m,
        slope_deg,
        precipitation_mm,
        formation = %geological_formation,
        "synthesized terrain"
    );

    GeologicalSnapshot {
        elevation_m,
        slope_deg,
        precipitation_mm,
        soil: district.soil,
        geological_formation,
    }
}
