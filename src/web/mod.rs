//! HTTP dashboard: district listing, analysis, what-if simulation and
//! report download over a small JSON API.

mod assets;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{
    analysis::{Analysis, Analyzer, Pacing},
    catalog::Coordinates,
    error::RiskError,
    report::{Report, ReportFormat},
    resolver::LocationRequest,
    rng::RngManager,
    simulation::{
        Month, ScenarioPreset, SimulationControls, SimulationOutcome, SimulationState, Simulator,
    },
    synth::GeologicalSnapshot,
};

struct AppState {
    analyzer: Analyzer,
    pacing: Pacing,
    random_seed: Option<u64>,
}

pub struct WebServerConfig {
    pub analyzer: Analyzer,
    pub pacing: Pacing,
    pub random_seed: Option<u64>,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        analyzer,
        pacing,
        random_seed,
        host,
        port,
    } = config;

    let municipality = analyzer.catalog().municipality().to_string();
    let state = Arc::new(AppState {
        analyzer,
        pacing,
        random_seed,
    });

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    info!(%municipality, "risk dashboard live at http://{}:{} (Ctrl+C to stop)", host, port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/app.js", get(script))
        .route("/health", get(health))
        .route("/api/districts", get(districts))
        .route("/api/analysis", post(analysis))
        .route("/api/simulation", post(simulation))
        .route("/api/report", post(report))
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down risk dashboard");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn health() -> &'static str {
    "ok"
}

/// Maps domain failures onto HTTP statuses with a `{ "error": ... }` body.
struct ApiError(RiskError);

impl From<RiskError> for ApiError {
    fn from(err: RiskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RiskError::NotFound(_) => StatusCode::NOT_FOUND,
            RiskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RiskError::Export(_) | RiskError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct DistrictSummary {
    name: String,
    description: String,
    center: Coordinates,
}

#[derive(Serialize)]
struct DistrictsResponse {
    municipality: String,
    region: String,
    center: Coordinates,
    districts: Vec<DistrictSummary>,
}

async fn districts(State(state): State<Arc<AppState>>) -> Json<DistrictsResponse> {
    let catalog = state.analyzer.catalog();
    Json(DistrictsResponse {
        municipality: catalog.municipality().to_string(),
        region: catalog.region().to_string(),
        center: catalog.center(),
        districts: catalog
            .districts()
            .iter()
            .map(|district| DistrictSummary {
                name: district.name.clone(),
                description: district.description.clone(),
                center: district.center,
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    #[serde(flatten)]
    location: LocationRequest,
    #[serde(default)]
    seed: Option<u64>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<Analysis>, ApiError> {
    // Reject bad input before making the user wait.
    request.location.validate()?;
    state.pacing.before_analysis().await;
    let mut rng = RngManager::with_seed(request.seed.or(state.random_seed));
    let analysis = state.analyzer.analyze(&request.location, &mut rng)?;
    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
struct SimulationRequest {
    original: GeologicalSnapshot,
    #[serde(default)]
    terrain: Option<GeologicalSnapshot>,
    #[serde(default)]
    controls: Option<SimulationControls>,
    #[serde(default)]
    preset: Option<ScenarioPreset>,
    #[serde(default)]
    month: Option<Month>,
}

#[derive(Debug, Serialize)]
struct SimulationResponse {
    state: SimulationState,
    month: Option<Month>,
    preset: Option<ScenarioPreset>,
    outcome: SimulationOutcome,
}

fn check_terrain(label: &str, snapshot: &GeologicalSnapshot) -> crate::error::Result<()> {
    let values = [
        snapshot.elevation_m,
        snapshot.slope_deg,
        snapshot.precipitation_mm,
    ];
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(RiskError::validation(format!("{label} terrain must be finite")))
    }
}

async fn simulation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<SimulationResponse>, ApiError> {
    check_terrain("original", &request.original)?;
    let mut simulator = Simulator::new(state.analyzer.catalog(), request.original);
    if let Some(terrain) = request.terrain {
        check_terrain("simulated", &terrain)?;
        simulator.update(|sim| sim.terrain = terrain);
    }
    if let Some(controls) = request.controls {
        simulator.set_controls(controls);
    }
    // The preset goes last so the fields it names hold its values.
    if let Some(preset) = request.preset {
        simulator.apply_preset(preset);
    }
    simulator.set_month(request.month);

    let outcome = simulator.outcome();
    Ok(Json(SimulationResponse {
        state: simulator.state().clone(),
        month: simulator.month(),
        preset: simulator.preset(),
        outcome,
    }))
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    analysis: Analysis,
    #[serde(default)]
    format: ReportFormat,
}

async fn report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, ApiError> {
    state.pacing.before_export().await;
    let report = Report::new(state.analyzer.catalog(), &request.analysis, Utc::now());
    let body = report
        .render(request.format)
        .map_err(|err| ApiError(err.into()))?;
    let file_name = report.file_name(request.format);
    info!(district = %report.district, %file_name, "report generated");

    Ok((
        [
            (header::CONTENT_TYPE, request.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}
