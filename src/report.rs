//! Exportable report: the informational content of one analysis, rendered
//! as plain text or JSON.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    analysis::Analysis,
    catalog::{Catalog, Coordinates, SoilType},
    error::RiskError,
};

const TITLE: &str = "REPORTE TÉCNICO DE ANÁLISIS DE RIESGO GEOLÓGICO";
const RULE: &str = "==============================================";
const FOOTER: &str = "Generado por Sistema de Análisis de Riesgo Geológico";
const NO_RECOMMENDATIONS: &str = "No hay recomendaciones específicas disponibles.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text/plain; charset=utf-8",
            ReportFormat::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub municipality: String,
    pub region: String,
    pub district: String,
    pub coordinates: Coordinates,
    pub generated_at: DateTime<Utc>,
    pub elevation_m: f64,
    pub slope_deg: f64,
    pub precipitation_mm: f64,
    pub soil: SoilType,
    pub geological_formation: String,
    pub landslide_risk: u8,
    pub collapse_risk: u8,
    pub overall_risk: u8,
    pub risk_level: String,
    pub technical_risk: u8,
    pub technical_level: String,
    pub technical_description: Option<String>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Report {
    pub fn new(catalog: &Catalog, analysis: &Analysis, generated_at: DateTime<Utc>) -> Self {
        let mut recommendations = analysis.landslide.recommendations.clone();
        for item in &analysis.technical.recommendations {
            if !recommendations.contains(item) {
                recommendations.push(item.clone());
            }
        }

        Self {
            municipality: catalog.municipality().to_string(),
            region: catalog.region().to_string(),
            district: analysis.district.clone(),
            coordinates: analysis.coordinates,
            generated_at,
            elevation_m: analysis.snapshot.elevation_m,
            slope_deg: analysis.snapshot.slope_deg,
            precipitation_mm: analysis.snapshot.precipitation_mm,
            soil: analysis.snapshot.soil,
            geological_formation: analysis.snapshot.geological_formation.clone(),
            landslide_risk: analysis.composite.landslide,
            collapse_risk: analysis.composite.collapse,
            overall_risk: analysis.composite.overall,
            risk_level: analysis.composite.tier.label().to_string(),
            technical_risk: analysis.technical.score,
            technical_level: analysis.technical.tier.label().to_string(),
            technical_description: analysis.technical.description.clone(),
            findings: analysis.technical.findings.clone(),
            recommendations,
        }
    }

    pub fn file_name(&self, format: ReportFormat) -> String {
        let district = self.district.split_whitespace().collect::<Vec<_>>().join("_");
        format!(
            "Reporte_Riesgo_{}_{}.{}",
            district,
            self.generated_at.timestamp_millis(),
            format.extension()
        )
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, ExportError> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{TITLE}")?;
        writeln!(out, "{}, {}", self.municipality, self.region)?;
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;
        writeln!(out, "INFORMACIÓN GENERAL")?;
        writeln!(out, "- Vereda: {}", self.district)?;
        writeln!(out, "- Coordenadas: {}", self.coordinates)?;
        writeln!(out, "- Fecha de análisis: {}", self.generated_at.format("%d/%m/%Y"))?;
        writeln!(out, "- Elevación: {:.0} m.s.n.m.", self.elevation_m)?;
        writeln!(out, "- Pendiente: {}°", self.slope_deg)?;
        writeln!(out, "- Tipo de suelo: {}", self.soil)?;
        writeln!(out, "- Precipitación anual: {} mm", self.precipitation_mm)?;
        writeln!(out, "- Formación geológica: {}", self.geological_formation)?;
        writeln!(out)?;
        writeln!(out, "ANÁLISIS DE RIESGOS")?;
        writeln!(out, "- Riesgo de deslizamiento: {}%", self.landslide_risk)?;
        writeln!(out, "- Riesgo de colapso: {}%", self.collapse_risk)?;
        writeln!(out, "- Riesgo general: {}%", self.overall_risk)?;
        writeln!(out, "- Nivel de riesgo: {}", self.risk_level)?;
        writeln!(out)?;
        writeln!(out, "EVALUACIÓN TÉCNICA")?;
        writeln!(
            out,
            "- Nivel técnico: {} ({}%)",
            self.technical_level, self.technical_risk
        )?;
        if let Some(description) = &self.technical_description {
            writeln!(out, "- {description}")?;
        }
        for finding in &self.findings {
            writeln!(out, "  * {finding}")?;
        }
        writeln!(out)?;
        writeln!(out, "RECOMENDACIONES")?;
        if self.recommendations.is_empty() {
            writeln!(out, "{NO_RECOMMENDATIONS}")?;
        } else {
            for (index, item) in self.recommendations.iter().enumerate() {
                writeln!(out, "{}. {}", index + 1, item)?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "{FOOTER}")?;
        writeln!(out, "{}", self.generated_at.format("%d/%m/%Y %H:%M:%S UTC"))?;
        Ok(())
    }

    pub fn write_to(&self, dir: &Path, format: ReportFormat) -> Result<PathBuf, ExportError> {
        let body = self.render(format)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(format));
        fs::write(&path, body)?;
        Ok(path)
    }
}

/// Writes the report for `analysis` into `dir`. Failures are logged once
/// and returned; the analysis itself is untouched and can be exported again.
pub fn export_report(
    catalog: &Catalog,
    analysis: &Analysis,
    dir: &Path,
    format: ReportFormat,
) -> Result<PathBuf, RiskError> {
    let report = Report::new(catalog, analysis, Utc::now());
    match report.write_to(dir, format) {
        Ok(path) => {
            info!(district = %analysis.district, path = %path.display(), "report exported");
            Ok(path)
        }
        Err(err) => {
            error!(district = %analysis.district, "report export failed: {err}");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::Analyzer, resolver::LocationRequest, rng::RngManager};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn sample() -> (Catalog, Analysis) {
        let catalog = Catalog::san_pedro();
        let analyzer = Analyzer::new(Arc::new(catalog.clone()));
        let analysis = analyzer
            .analyze(
                &LocationRequest::for_district("Vereda La Cuchilla"),
                &mut RngManager::new(21),
            )
            .unwrap();
        (catalog, analysis)
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn text_report_carries_required_content() {
        let (catalog, analysis) = sample();
        let report = Report::new(&catalog, &analysis, fixed_time());
        let text = report.render_text();

        assert!(text.starts_with(TITLE));
        assert!(text.contains("San Pedro de los Milagros, Antioquia"));
        assert!(text.contains("- Vereda: Vereda La Cuchilla"));
        assert!(text.contains("- Coordenadas: 6.4000, -75.5400"));
        assert!(text.contains("- Fecha de análisis: 14/03/2025"));
        assert!(text.contains(&format!("- Elevación: {:.0} m.s.n.m.", analysis.snapshot.elevation_m)));
        assert!(text.contains(&format!("- Pendiente: {}°", analysis.snapshot.slope_deg)));
        assert!(text.contains("- Tipo de suelo: Entisol"));
        assert!(text.contains(&format!(
            "- Riesgo de deslizamiento: {}%",
            analysis.composite.landslide
        )));
        assert!(text.contains(&format!("- Riesgo general: {}%", analysis.composite.overall)));
        assert!(text.contains(&format!("- Nivel de riesgo: {}", analysis.composite.tier)));
        assert!(text.contains(&format!("1. {}", report.recommendations[0])));
    }

    #[test]
    fn recommendations_are_merged_without_duplicates() {
        let (catalog, analysis) = sample();
        let report = Report::new(&catalog, &analysis, fixed_time());
        let mut seen = std::collections::HashSet::new();
        assert!(report.recommendations.iter().all(|item| seen.insert(item)));
        for item in &analysis.landslide.recommendations {
            assert!(report.recommendations.contains(item));
        }
        for item in &analysis.technical.recommendations {
            assert!(report.recommendations.contains(item));
        }
    }

    #[test]
    fn empty_recommendations_are_called_out() {
        let (catalog, analysis) = sample();
        let mut report = Report::new(&catalog, &analysis, fixed_time());
        report.recommendations.clear();
        assert!(report.render_text().contains(NO_RECOMMENDATIONS));
    }

    #[test]
    fn file_name_replaces_spaces() {
        let (catalog, analysis) = sample();
        let report = Report::new(&catalog, &analysis, fixed_time());
        assert_eq!(
            report.file_name(ReportFormat::Text),
            format!("Reporte_Riesgo_Vereda_La_Cuchilla_{}.txt", fixed_time().timestamp_millis())
        );
        assert!(report.file_name(ReportFormat::Json).ends_with(".json"));
    }

    #[test]
    fn json_report_parses_back() {
        let (catalog, analysis) = sample();
        let report = Report::new(&catalog, &analysis, fixed_time());
        let json = report.render(ReportFormat::Json).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
