use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, Coordinates, District},
    error::{Result, RiskError},
};

#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    District(String),
}

/// Exact name lookup, or the district whose center is nearest in degree
/// space. Ties go to the earlier catalog entry.
pub fn resolve<'a>(catalog: &'a Catalog, query: &LocationQuery) -> Result<&'a District> {
    match query {
        LocationQuery::District(name) => catalog
            .district(name)
            .ok_or_else(|| RiskError::NotFound(name.clone())),
        LocationQuery::Coordinates(point) => Ok(nearest(catalog, point)),
    }
}

pub fn nearest<'a>(catalog: &'a Catalog, point: &Coordinates) -> &'a District {
    let districts = catalog.districts();
    let mut best = &districts[0];
    let mut best_distance = point.distance_to(&best.center);
    for district in &districts[1..] {
        let distance = point.distance_to(&district.center);
        if distance < best_distance {
            best = district;
            best_distance = distance;
        }
    }
    best
}

/// Raw location input as it arrives from a form or the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lng: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedLocation<'a> {
    pub district: &'a District,
    /// Coordinates reported with the result: the input point when one was
    /// given, otherwise the district center.
    pub coordinates: Coordinates,
}

impl LocationRequest {
    pub fn for_district(name: impl Into<String>) -> Self {
        Self {
            district: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn for_point(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat.to_string()),
            lng: Some(lng.to_string()),
            district: None,
        }
    }

    /// Rejects partial or malformed input before anything is resolved.
    /// Returns the query to resolve plus the point to report, if any.
    pub fn validate(&self) -> Result<(LocationQuery, Option<Coordinates>)> {
        let lat = non_blank(self.lat.as_deref());
        let lng = non_blank(self.lng.as_deref());
        let coordinates = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::parse(lat, lng)?),
            (None, None) => None,
            (Some(_), None) => return Err(RiskError::validation("longitude is required")),
            (None, Some(_)) => return Err(RiskError::validation("latitude is required")),
        };
        let query = match (non_blank(self.district.as_deref()), coordinates) {
            (Some(name), _) => LocationQuery::District(name.to_string()),
            (None, Some(point)) => LocationQuery::Coordinates(point),
            (None, None) => {
                return Err(RiskError::validation(
                    "select a district or enter coordinates",
                ))
            }
        };
        Ok((query, coordinates))
    }

    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Result<ResolvedLocation<'a>> {
        let (query, coordinates) = self.validate()?;
        let district = resolve(catalog, &query)?;
        Ok(ResolvedLocation {
            district,
            coordinates: coordinates.unwrap_or(district.center),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_lookup_is_exact() {
        let catalog = Catalog::san_pedro();
        let found = resolve(&catalog, &LocationQuery::District("Vereda Pantanillo".into())).unwrap();
        assert_eq!(found.name, "Vereda Pantanillo");

        let err = resolve(&catalog, &LocationQuery::District("vereda pantanillo".into()))
            .unwrap_err();
        assert!(matches!(err, RiskError::NotFound(name) if name == "vereda pantanillo"));
    }

    #[test]
    fn coordinates_pick_nearest_center() {
        let catalog = Catalog::san_pedro();
        let point = Coordinates::new(6.401, -75.541).unwrap();
        let found = resolve(&catalog, &LocationQuery::Coordinates(point)).unwrap();
        assert_eq!(found.name, "Vereda La Cuchilla");
    }

    #[test]
    fn far_away_point_still_resolves() {
        let catalog = Catalog::san_pedro();
        let point = Coordinates::new(-33.9, 151.2).unwrap();
        assert!(resolve(&catalog, &LocationQuery::Coordinates(point)).is_ok());
    }

    #[test]
    fn ties_go_to_first_entry() {
        let mut yaml = Catalog::san_pedro().to_yaml_string().unwrap();
        // Move La Empalizada onto La Clarita's center.
        yaml = yaml.replacen("lat: 6.42\n", "lat: 6.43\n", 1);
        yaml = yaml.replacen("lng: -75.53\n", "lng: -75.52\n", 1);
        let catalog = Catalog::from_yaml_str(&yaml).unwrap();
        let empalizada = catalog.district("Vereda La Empalizada").unwrap();
        assert_eq!(empalizada.center, Coordinates { lat: 6.43, lng: -75.52 });

        let point = Coordinates { lat: 6.43, lng: -75.52 };
        assert_eq!(nearest(&catalog, &point).name, "Vereda La Clarita");
    }

    #[test]
    fn district_wins_over_coordinates() {
        let catalog = Catalog::san_pedro();
        let request = LocationRequest {
            lat: Some("6.43".into()),
            lng: Some("-75.52".into()),
            district: Some("Vereda San Antonio".into()),
        };
        let resolved = request.resolve(&catalog).unwrap();
        assert_eq!(resolved.district.name, "Vereda San Antonio");
        assert_eq!(resolved.coordinates, Coordinates { lat: 6.43, lng: -75.52 });
    }

    #[test]
    fn district_only_reports_its_center() {
        let catalog = Catalog::san_pedro();
        let resolved = LocationRequest::for_district("Centro Urbano")
            .resolve(&catalog)
            .unwrap();
        assert_eq!(resolved.coordinates, resolved.district.center);
    }

    #[test]
    fn incomplete_requests_are_rejected() {
        let catalog = Catalog::san_pedro();
        let empty = LocationRequest::default();
        assert!(matches!(empty.resolve(&catalog), Err(RiskError::Validation(_))));

        let half = LocationRequest {
            lat: Some("6.4".into()),
            ..LocationRequest::default()
        };
        assert!(matches!(half.validate(), Err(RiskError::Validation(_))));

        let blank = LocationRequest {
            lat: Some("  ".into()),
            lng: Some("".into()),
            district: Some(" ".into()),
        };
        assert!(matches!(blank.validate(), Err(RiskError::Validation(_))));

        let garbage = LocationRequest {
            lat: Some("north".into()),
            lng: Some("-75.5".into()),
            district: None,
        };
        assert!(matches!(garbage.validate(), Err(RiskError::Validation(_))));
    }
}
