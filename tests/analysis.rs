use std::{path::Path, sync::Arc};

use vereda_risk::{
    analysis::Analyzer,
    catalog::{Catalog, CatalogLoader},
    config::Config,
    resolver::LocationRequest,
    risk::{FactorWeights, RiskModel, TierScale, WeightedFactorModel},
    rng::RngManager,
    synth::{ELEVATION_JITTER_M, PRECIPITATION_JITTER_MM, SLOPE_JITTER_DEG},
    RiskError,
};

fn manifest_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

fn analyzer() -> Analyzer {
    Analyzer::new(Arc::new(Catalog::san_pedro()))
}

#[test]
fn bundled_catalog_matches_builtin() {
    let loaded = CatalogLoader::new(manifest_dir())
        .load("catalogs/san_pedro.yaml")
        .unwrap();
    assert_eq!(loaded, Catalog::san_pedro());
}

#[test]
fn bundled_dashboard_config_loads() {
    let config = Config::from_yaml(manifest_dir().join("dashboard.yaml")).unwrap();
    assert_eq!(config.pacing.analysis_delay_ms, 2000);
    assert_eq!(config.pacing.export_delay_ms, 3000);
    assert_eq!(config.scoring.weights, FactorWeights::default());
    assert_eq!(config.random_seed, None);
}

#[test]
fn missing_catalog_file_reports_path() {
    let err = CatalogLoader::new(manifest_dir())
        .load("catalogs/does_not_exist.yaml")
        .unwrap_err();
    assert!(format!("{err:#}").contains("does_not_exist.yaml"));
}

#[test]
fn every_district_analyses_within_bounds() {
    let analyzer = analyzer();
    let catalog = analyzer.catalog();
    for (seed, district) in catalog.districts().iter().enumerate() {
        let request = LocationRequest::for_district(district.name.clone());
        let analysis = analyzer
            .analyze(&request, &mut RngManager::new(seed as u64))
            .unwrap();
        let snap = &analysis.snapshot;

        assert_eq!(analysis.district, district.name);
        assert_eq!(analysis.coordinates, district.center);
        assert_eq!(snap.soil, district.soil);
        assert!((snap.elevation_m - district.base_elevation_m).abs() <= ELEVATION_JITTER_M);
        assert!((snap.slope_deg - district.base_slope_deg).abs() <= SLOPE_JITTER_DEG + 0.05);
        assert!(
            (snap.precipitation_mm - district.base_precipitation_mm).abs()
                <= PRECIPITATION_JITTER_MM
        );
        assert_eq!(
            snap.geological_formation,
            catalog.formation_for_elevation(snap.elevation_m).unwrap().name
        );

        assert!(analysis.landslide.score <= 100);
        assert!(analysis.technical.score <= 100);
        assert_eq!(analysis.composite.landslide, analysis.landslide.score);
        assert_eq!(
            analysis.landslide.tier,
            TierScale::Weighted.classify(analysis.landslide.score as f64)
        );
        assert!(!analysis.landslide.recommendations.is_empty());
        assert!(!analysis.technical.recommendations.is_empty());
    }
}

#[test]
fn point_request_reports_input_coordinates() {
    let analysis = analyzer()
        .analyze(
            &LocationRequest::for_point(6.4049, -75.5651),
            &mut RngManager::new(4),
        )
        .unwrap();
    assert_eq!(analysis.district, "Vereda San Antonio");
    assert_eq!(analysis.coordinates.lat, 6.4049);
    assert_eq!(analysis.coordinates.lng, -75.5651);
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let err = analyzer()
        .analyze(
            &LocationRequest::for_point(95.0, -75.5),
            &mut RngManager::new(1),
        )
        .unwrap_err();
    assert!(matches!(err, RiskError::Validation(_)));
}

#[test]
fn configured_weights_drive_the_landslide_score() {
    let slope_only = FactorWeights {
        slope: 1.0,
        elevation: 0.0,
        soil: 0.0,
        precipitation: 0.0,
        geological: 0.0,
    };
    let analyzer = analyzer().with_landslide_model(WeightedFactorModel::new(slope_only));
    let analysis = analyzer
        .analyze(
            &LocationRequest::for_district("Vereda El Carmelo"),
            &mut RngManager::new(8),
        )
        .unwrap();
    let expected = ((analysis.snapshot.slope_deg / 45.0).min(1.0) * 100.0).round() as u8;
    assert_eq!(analysis.landslide.score, expected);

    // The same snapshot through the stock model differs only by weights.
    let stock = WeightedFactorModel::default().assess(analyzer.catalog(), &analysis.snapshot);
    assert_eq!(stock.factors, analysis.landslide.factors);
}
