use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{clamp_score, Factor, ModelKind, RiskAssessment, RiskModel, TierScale};
use crate::{catalog::Catalog, synth::GeologicalSnapshot};

const UNKNOWN_PROFILE_RISK: f64 = 0.5;
const RECOMMENDATION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub slope: f64,
    pub elevation: f64,
    pub soil: f64,
    pub precipitation: f64,
    pub geological: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            slope: 0.35,
            elevation: 0.15,
            soil: 0.20,
            precipitation: 0.15,
            geological: 0.15,
        }
    }
}

/// Normalized 0-1 factor risks, combined by weighted sum into a percentage.
#[derive(Debug, Clone, Default)]
pub struct WeightedFactorModel {
    weights: FactorWeights,
}

impl WeightedFactorModel {
    pub fn new(weights: FactorWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }
}

struct FactorRisks {
    slope: f64,
    elevation: f64,
    soil: f64,
    precipitation: f64,
    geological: f64,
}

fn factor_risks(catalog: &Catalog, snapshot: &GeologicalSnapshot) -> FactorRisks {
    let slope = (snapshot.slope_deg / 45.0).min(1.0);
    let elevation = if snapshot.elevation_m > 2500.0 {
        0.7
    } else if snapshot.elevation_m < 2000.0 {
        0.6
    } else {
        0.3
    };
    let soil = catalog
        .soil(snapshot.soil)
        .map(|profile| (1.0 - profile.cohesion) * profile.permeability)
        .unwrap_or(UNKNOWN_PROFILE_RISK);
    let precipitation = ((snapshot.precipitation_mm - 1500.0) / 1000.0).clamp(0.0, 1.0);
    let geological = catalog
        .formation(&snapshot.geological_formation)
        .map(|formation| 1.0 - formation.stability)
        .unwrap_or(UNKNOWN_PROFILE_RISK);

    FactorRisks {
        slope,
        elevation,
        soil,
        precipitation,
        geological,
    }
}

impl RiskModel for WeightedFactorModel {
    fn kind(&self) -> ModelKind {
        ModelKind::WeightedFactor
    }

    fn assess(&self, catalog: &Catalog, snapshot: &GeologicalSnapshot) -> RiskAssessment {
        let risks = factor_risks(catalog, snapshot);
        let w = &self.weights;
        let weighted = risks.slope * w.slope
            + risks.elevation * w.elevation
            + risks.soil * w.soil
            + risks.precipitation * w.precipitation
            + risks.geological * w.geological;
        let score = clamp_score(weighted * 100.0);

        let mut recommendations = Vec::new();
        if risks.slope > RECOMMENDATION_THRESHOLD {
            recommendations.push("Considerar obras de estabilización de taludes".to_string());
        }
        if risks.precipitation > RECOMMENDATION_THRESHOLD {
            recommendations.push("Implementar sistemas de drenaje adecuados".to_string());
        }
        if risks.soil > RECOMMENDATION_THRESHOLD {
            recommendations.push("Realizar estudios geotécnicos detallados".to_string());
        }
        if risks.geological > RECOMMENDATION_THRESHOLD {
            recommendations.push("Evaluar la estabilidad de la formación geológica".to_string());
        }
        if score > 60 {
            recommendations
                .push("Se recomienda evaluación profesional antes de construcción".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("Zona con condiciones favorables para desarrollo".to_string());
        }

        let percent = |value: f64| (value * 100.0).round();
        let factors = BTreeMap::from([
            (Factor::Slope, percent(risks.slope)),
            (Factor::Elevation, percent(risks.elevation)),
            (Factor::Soil, percent(risks.soil)),
            (Factor::Precipitation, percent(risks.precipitation)),
            (Factor::GeologicalFormation, percent(risks.geological)),
        ]);

        RiskAssessment {
            model: self.kind(),
            score,
            tier: TierScale::Weighted.classify(score as f64),
            factors,
            findings: Vec::new(),
            description: None,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoilType;
    use crate::risk::Tier;

    fn snapshot(slope: f64, elevation: f64, precipitation: f64, soil: SoilType, formation: &str) -> GeologicalSnapshot {
        GeologicalSnapshot {
            elevation_m: elevation,
            slope_deg: slope,
            precipitation_mm: precipitation,
            soil,
            geological_formation: formation.to_string(),
        }
    }

    #[test]
    fn la_cuchilla_on_combia_scores_54() {
        let catalog = Catalog::san_pedro();
        let snap = snapshot(30.0, 2400.0, 2200.0, SoilType::Entisol, "Formación Combia");
        let assessment = WeightedFactorModel::default().assess(&catalog, &snap);

        assert_eq!(assessment.score, 54);
        assert_eq!(assessment.tier, Tier::Medium);
        assert_eq!(assessment.factor(Factor::Slope), 67.0);
        assert_eq!(assessment.factor(Factor::Elevation), 30.0);
        assert_eq!(assessment.factor(Factor::Soil), 56.0);
        assert_eq!(assessment.factor(Factor::Precipitation), 70.0);
        assert_eq!(assessment.factor(Factor::GeologicalFormation), 30.0);
    }

    #[test]
    fn la_cuchilla_on_batolito_scores_53() {
        let catalog = Catalog::san_pedro();
        let snap = snapshot(30.0, 2400.0, 2200.0, SoilType::Entisol, "Batolito Antioqueño");
        let assessment = WeightedFactorModel::default().assess(&catalog, &snap);
        assert_eq!(assessment.score, 53);
        assert_eq!(assessment.tier, Tier::Medium);
    }

    #[test]
    fn steep_wet_ground_collects_recommendations() {
        let catalog = Catalog::san_pedro();
        let snap = snapshot(45.0, 1900.0, 2600.0, SoilType::Entisol, "Depósitos Aluviales");
        let assessment = WeightedFactorModel::default().assess(&catalog, &snap);

        // 0.35 + 0.09 + 0.112 + 0.15 + 0.09 = 0.792
        assert_eq!(assessment.score, 79);
        assert_eq!(assessment.tier, Tier::High);
        assert_eq!(
            assessment.recommendations,
            vec![
                "Considerar obras de estabilización de taludes",
                "Implementar sistemas de drenaje adecuados",
                "Se recomienda evaluación profesional antes de construcción",
            ]
        );
    }

    #[test]
    fn gentle_ground_is_favourable() {
        let catalog = Catalog::san_pedro();
        let snap = snapshot(5.0, 2150.0, 1400.0, SoilType::Alfisol, "Formación Amagá");
        let assessment = WeightedFactorModel::default().assess(&catalog, &snap);

        assert!(assessment.score < 20);
        assert_eq!(assessment.tier, Tier::VeryLow);
        assert_eq!(
            assessment.recommendations,
            vec!["Zona con condiciones favorables para desarrollo"]
        );
    }

    #[test]
    fn unknown_formation_counts_as_half() {
        let catalog = Catalog::san_pedro();
        let snap = snapshot(0.0, 2200.0, 1500.0, SoilType::Alfisol, "Desconocida");
        let assessment = WeightedFactorModel::default().assess(&catalog, &snap);
        assert_eq!(assessment.factor(Factor::GeologicalFormation), 50.0);
    }
}
