use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    catalog::{Catalog, Coordinates, Demographics},
    config::PacingConfig,
    error::Result,
    resolver::LocationRequest,
    risk::{
        collapse_risk, CompositeRisk, PointsModel, RiskAssessment, RiskModel, WeightedFactorModel,
    },
    rng::{RngManager, COLLAPSE_STREAM, SYNTHESIS_STREAM},
    synth::{synthesize, GeologicalSnapshot},
};

/// Everything one analysis request produces. Owned by the caller; a new
/// request replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub district: String,
    pub description: String,
    pub coordinates: Coordinates,
    pub demographics: Demographics,
    pub snapshot: GeologicalSnapshot,
    /// Weighted-factor model, shown on the dashboard.
    pub landslide: RiskAssessment,
    /// Additive-points model, used by the report and the simulator.
    pub technical: RiskAssessment,
    pub composite: CompositeRisk,
}

/// Resolver, synthesizer and both risk models wired in sequence.
#[derive(Debug, Clone)]
pub struct Analyzer {
    catalog: Arc<Catalog>,
    landslide_model: WeightedFactorModel,
    technical_model: PointsModel,
}

impl Analyzer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            landslide_model: WeightedFactorModel::default(),
            technical_model: PointsModel,
        }
    }

    pub fn with_landslide_model(mut self, model: WeightedFactorModel) -> Self {
        self.landslide_model = model;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn analyze(&self, request: &LocationRequest, rng: &mut RngManager) -> Result<Analysis> {
        let location = request.resolve(&self.catalog)?;
        let district = location.district;
        info!(district = %district.name, coordinates = %location.coordinates, "starting analysis");

        let snapshot = synthesize(&self.catalog, district, &mut rng.stream(SYNTHESIS_STREAM));
        let landslide = self.landslide_model.assess(&self.catalog, &snapshot);
        let technical = self.technical_model.assess(&self.catalog, &snapshot);
        let collapse = collapse_risk(&snapshot, &mut rng.stream(COLLAPSE_STREAM));
        let composite = CompositeRisk::blend(landslide.score, collapse);

        info!(
            district = %district.name,
            landslide = landslide.score,
            collapse = composite.collapse,
            overall = composite.overall,
            tier = %composite.tier,
            technical = technical.score,
            "analysis complete"
        );

        Ok(Analysis {
            district: district.name.clone(),
            description: district.description.clone(),
            coordinates: location.coordinates,
            demographics: district.demographics(),
            snapshot,
            landslide,
            technical,
            composite,
        })
    }
}

/// Artificial "processing" pauses shown to users; zero means no pause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    pub analysis: Duration,
    pub export: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self::default()
    }

    pub async fn before_analysis(&self) {
        pause(self.analysis).await;
    }

    pub async fn before_export(&self) {
        pause(self.export).await;
    }
}

impl From<&PacingConfig> for Pacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            analysis: Duration::from_millis(config.analysis_delay_ms),
            export: Duration::from_millis(config.export_delay_ms),
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::risk::ModelKind;

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(Catalog::san_pedro()))
    }

    #[test]
    fn seeded_analysis_is_repeatable() {
        let analyzer = analyzer();
        let request = LocationRequest::for_district("Vereda La Cuchilla");
        let first = analyzer.analyze(&request, &mut RngManager::new(9)).unwrap();
        let second = analyzer.analyze(&request, &mut RngManager::new(9)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn analysis_carries_both_models() {
        let analyzer = analyzer();
        let request = LocationRequest::for_district("Vereda San Antonio");
        let analysis = analyzer.analyze(&request, &mut RngManager::new(1)).unwrap();

        assert_eq!(analysis.landslide.model, ModelKind::WeightedFactor);
        assert_eq!(analysis.technical.model, ModelKind::AdditivePoints);
        assert_eq!(analysis.composite.landslide, analysis.landslide.score);
        assert!(analysis.composite.collapse <= 100);
        assert!(analysis.composite.overall <= 100);
        assert_eq!(analysis.demographics.population, "~280 habitantes");
    }

    #[test]
    fn coordinates_only_uses_nearest_district() {
        let analyzer = analyzer();
        let request = LocationRequest::for_point(6.4351, -75.5149);
        let analysis = analyzer.analyze(&request, &mut RngManager::new(2)).unwrap();
        assert_eq!(analysis.district, "Vereda Llano de Ovejas");
        assert_eq!(analysis.coordinates.lat, 6.4351);
    }

    #[test]
    fn unknown_district_aborts() {
        let analyzer = analyzer();
        let request = LocationRequest::for_district("Vereda Inexistente");
        let err = analyzer
            .analyze(&request, &mut RngManager::new(3))
            .unwrap_err();
        assert!(matches!(err, RiskError::NotFound(_)));
    }

    #[test]
    fn pacing_from_config() {
        let pacing = Pacing::from(&PacingConfig {
            analysis_delay_ms: 2000,
            export_delay_ms: 3000,
        });
        assert_eq!(pacing.analysis, Duration::from_secs(2));
        assert_eq!(pacing.export, Duration::from_secs(3));
        assert_eq!(Pacing::none().analysis, Duration::ZERO);
    }
}
