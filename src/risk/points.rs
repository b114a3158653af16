use std::collections::BTreeMap;

use super::{clamp_score, Factor, ModelKind, RiskAssessment, RiskModel, Tier, TierScale};
use crate::{catalog::Catalog, synth::GeologicalSnapshot};

/// Additive point budget per factor band, summed and capped at 100.
///
/// Slope is worth up to 40 points, precipitation 25, formation
/// instability 20, soil 15 and elevation 5.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsModel;

impl PointsModel {
    pub fn new() -> Self {
        Self
    }

    /// Point total before rounding and the 100 cap.
    pub fn raw_points(&self, catalog: &Catalog, snapshot: &GeologicalSnapshot) -> f64 {
        self.tally(catalog, snapshot).total()
    }

    fn tally(&self, catalog: &Catalog, snapshot: &GeologicalSnapshot) -> Tally {
        let mut tally = Tally::default();

        let slope = snapshot.slope_deg;
        let (points, finding) = if slope > 35.0 {
            (40.0, Some("Pendiente muy pronunciada (>35°)"))
        } else if slope > 25.0 {
            (30.0, Some("Pendiente pronunciada (25-35°)"))
        } else if slope > 15.0 {
            (20.0, Some("Pendiente moderada (15-25°)"))
        } else if slope > 8.0 {
            (10.0, Some("Pendiente suave (8-15°)"))
        } else {
            (0.0, None)
        };
        tally.add(Factor::Slope, points, finding.map(String::from));

        let rain = snapshot.precipitation_mm;
        let (points, finding) = if rain > 2500.0 {
            (25.0, Some("Precipitación muy alta (>2500mm)"))
        } else if rain > 2000.0 {
            (20.0, Some("Precipitación alta (2000-2500mm)"))
        } else if rain > 1500.0 {
            (15.0, Some("Precipitación moderada (1500-2000mm)"))
        } else if rain > 1000.0 {
            (10.0, Some("Precipitación baja-moderada (1000-1500mm)"))
        } else {
            (0.0, None)
        };
        tally.add(Factor::Precipitation, points, finding.map(String::from));

        let formation_name = &snapshot.geological_formation;
        let points = catalog
            .formation(formation_name)
            .map(|formation| (1.0 - formation.stability) * 20.0)
            .unwrap_or(0.0);
        let finding = if points > 15.0 {
            Some(format!("Formación geológica inestable ({formation_name})"))
        } else if points > 10.0 {
            Some(format!(
                "Formación geológica moderadamente estable ({formation_name})"
            ))
        } else {
            None
        };
        tally.add(Factor::GeologicalFormation, points, finding);

        let points = catalog
            .soil(snapshot.soil)
            .map(|soil| (soil.permeability * 0.6 + (1.0 - soil.cohesion) * 0.4) * 15.0)
            .unwrap_or(0.0);
        let finding = (points > 10.0).then(|| {
            format!(
                "Tipo de suelo con alta permeabilidad ({})",
                snapshot.soil
            )
        });
        tally.add(Factor::Soil, points, finding);

        let elevation = snapshot.elevation_m;
        let (points, finding) = if elevation > 2400.0 {
            (5.0, Some("Elevación muy alta con condiciones climáticas extremas"))
        } else if elevation > 2200.0 {
            (3.0, Some("Elevación alta"))
        } else {
            (0.0, None)
        };
        tally.add(Factor::Elevation, points, finding.map(String::from));

        tally
    }
}

#[derive(Default)]
struct Tally {
    factors: BTreeMap<Factor, f64>,
    findings: Vec<String>,
}

impl Tally {
    fn add(&mut self, factor: Factor, points: f64, finding: Option<String>) {
        self.factors.insert(factor, points);
        self.findings.extend(finding);
    }

    fn total(&self) -> f64 {
        self.factors.values().sum()
    }
}

impl RiskModel for PointsModel {
    fn kind(&self) -> ModelKind {
        ModelKind::AdditivePoints
    }

    fn assess(&self, catalog: &Catalog, snapshot: &GeologicalSnapshot) -> RiskAssessment {
        let tally = self.tally(catalog, snapshot);
        let score = clamp_score(tally.total());
        let tier = TierScale::Points.classify(score as f64);

        RiskAssessment {
            model: self.kind(),
            score,
            tier,
            description: Some(description(tier).to_string()),
            recommendations: recommendations(tier)
                .iter()
                .map(|item| item.to_string())
                .collect(),
            factors: tally.factors,
            findings: tally.findings,
        }
    }
}

fn description(tier: Tier) -> &'static str {
    match tier {
        Tier::VeryLow | Tier::Low => {
            "El riesgo de deslizamiento es bajo. Las condiciones geológicas y ambientales son favorables para la estabilidad del terreno."
        }
        Tier::Medium => {
            "El riesgo de deslizamiento es moderado. Se requiere atención y medidas preventivas para mantener la estabilidad."
        }
        Tier::High => {
            "El riesgo de deslizamiento es alto. Se requieren medidas de mitigación inmediatas y monitoreo constante."
        }
        Tier::VeryHigh | Tier::Critical => {
            "El riesgo de deslizamiento es crítico. Se requiere intervención técnica inmediata y posible reubicación de infraestructura vulnerable."
        }
    }
}

fn recommendations(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::VeryLow | Tier::Low => &[
            "Mantener sistemas de drenaje básicos",
            "Monitoreo visual periódico del terreno",
            "Conservar la vegetación existente",
            "Evitar modificaciones bruscas del terreno",
        ],
        Tier::Medium => &[
            "Implementar sistemas de drenaje mejorados",
            "Realizar inspecciones técnicas semestrales",
            "Fortalecer la cobertura vegetal en pendientes",
            "Establecer protocolos de monitoreo de grietas",
            "Capacitar a la comunidad en identificación de señales de riesgo",
        ],
        Tier::High => &[
            "Implementar sistemas de drenaje profesionales",
            "Realizar estudios geotécnicos detallados",
            "Instalar sistemas de monitoreo instrumental",
            "Establecer planes de evacuación y alerta temprana",
            "Restringir construcciones en zonas críticas",
            "Implementar obras de estabilización de taludes",
        ],
        Tier::VeryHigh | Tier::Critical => &[
            "Evaluación geotécnica urgente por especialistas",
            "Implementación inmediata de obras de estabilización",
            "Sistema de monitoreo instrumental 24/7",
            "Plan de evacuación y alerta temprana activado",
            "Restricción total de nuevas construcciones",
            "Considerar reubicación de infraestructura crítica",
            "Coordinación con organismos de gestión del riesgo",
        ],
    }
}
