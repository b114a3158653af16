use std::{fs, sync::Arc};

use vereda_risk::{
    analysis::Analyzer,
    catalog::Catalog,
    report::{export_report, Report, ReportFormat},
    resolver::LocationRequest,
    rng::RngManager,
    RiskError,
};

fn analysed() -> (Catalog, vereda_risk::Analysis) {
    let catalog = Catalog::san_pedro();
    let analysis = Analyzer::new(Arc::new(catalog.clone()))
        .analyze(
            &LocationRequest::for_district("Vereda Llano de Ovejas"),
            &mut RngManager::new(17),
        )
        .unwrap();
    (catalog, analysis)
}

#[test]
fn text_report_is_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let (catalog, analysis) = analysed();
    let path = export_report(&catalog, &analysis, dir.path(), ReportFormat::Text).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Reporte_Riesgo_Vereda_Llano_de_Ovejas_"));
    assert!(name.ends_with(".txt"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("REPORTE TÉCNICO DE ANÁLISIS DE RIESGO GEOLÓGICO"));
    assert!(text.contains("- Vereda: Vereda Llano de Ovejas"));
    assert!(text.contains("RECOMENDACIONES"));
}

#[test]
fn json_report_round_trips_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (catalog, analysis) = analysed();
    let path = export_report(&catalog, &analysis, dir.path(), ReportFormat::Json).unwrap();

    let report: Report = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report.district, analysis.district);
    assert_eq!(report.overall_risk, analysis.composite.overall);
    assert_eq!(report.technical_risk, analysis.technical.score);
}

#[test]
fn missing_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reportes").join("2025");
    let (catalog, analysis) = analysed();
    let path = export_report(&catalog, &analysis, &nested, ReportFormat::Text).unwrap();
    assert!(path.starts_with(&nested));
}

#[test]
fn failed_export_leaves_analysis_reusable() {
    let dir = tempfile::tempdir().unwrap();
    // A file where the output directory should be.
    let blocker = dir.path().join("blocked");
    fs::write(&blocker, "not a directory").unwrap();

    let (catalog, analysis) = analysed();
    let before = analysis.clone();
    let err = export_report(&catalog, &analysis, &blocker, ReportFormat::Text).unwrap_err();
    assert!(matches!(err, RiskError::Export(_)));
    assert_eq!(analysis, before);

    let retry = export_report(&catalog, &analysis, dir.path(), ReportFormat::Text);
    assert!(retry.is_ok());
}
