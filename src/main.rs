use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vereda_risk::{
    analysis::{Analysis, Analyzer, Pacing},
    catalog::{Catalog, CatalogLoader},
    config::Config,
    report::{export_report, ReportFormat},
    resolver::LocationRequest,
    risk::WeightedFactorModel,
    rng::RngManager,
    simulation::{Month, ScenarioPreset, Simulator},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Geological risk scoring for rural districts")]
struct Cli {
    /// Path to the dashboard configuration YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the districts in the catalog
    Districts,
    /// Resolve a location and score it
    Analyze {
        #[command(flatten)]
        location: LocationArgs,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyse a district and run a what-if scenario on it
    Simulate {
        #[command(flatten)]
        location: LocationArgs,
        #[arg(long, value_enum)]
        preset: Option<ScenarioPreset>,
        #[arg(long, value_enum)]
        month: Option<Month>,
    },
    /// Analyse a location and write the technical report
    Report {
        #[command(flatten)]
        location: LocationArgs,
        /// Output directory
        #[arg(long, default_value = "reports")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Serve the web dashboard
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Args)]
struct LocationArgs {
    /// District name, exactly as listed by `districts`
    #[arg(long)]
    district: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,
    /// Seed for reproducible terrain jitter (overrides the config seed)
    #[arg(long)]
    seed: Option<u64>,
}

impl LocationArgs {
    fn request(&self) -> LocationRequest {
        LocationRequest {
            lat: self.lat.clone(),
            lng: self.lng.clone(),
            district: self.district.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_yaml(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    let catalog = match &config.catalog {
        Some(path) => CatalogLoader::new(".").load(path)?,
        None => Catalog::san_pedro(),
    };
    let analyzer = Analyzer::new(Arc::new(catalog))
        .with_landslide_model(WeightedFactorModel::new(config.scoring.weights));

    match cli.command {
        Command::Districts => {
            let catalog = analyzer.catalog();
            println!("{}, {}", catalog.municipality(), catalog.region());
            for district in catalog.districts() {
                println!("  {:<24} {}  {}", district.name, district.center, district.description);
            }
        }
        Command::Analyze { location, json } => {
            let analysis = run_analysis(&analyzer, &config, &location)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_summary(&analysis);
            }
        }
        Command::Simulate {
            location,
            preset,
            month,
        } => {
            let analysis = run_analysis(&analyzer, &config, &location)?;
            let mut simulator = Simulator::new(analyzer.catalog(), analysis.snapshot.clone());
            if let Some(preset) = preset {
                simulator.apply_preset(preset);
            }
            simulator.set_month(month);
            let outcome = simulator.outcome();
            println!("{}", analysis.district);
            if let Some(preset) = preset {
                println!("  Escenario: {}", preset.label());
            }
            if let Some(month) = month {
                println!("  Mes: {}", month.label());
            }
            println!("  Riesgo original: {}%", outcome.original_score);
            println!(
                "  Riesgo simulado: {:.1}% ({})",
                outcome.simulated_score, outcome.simulated_tier
            );
            println!("  Cambio: {:+.1} puntos ({:?})", outcome.delta, outcome.trend);
            println!(
                "  Impacto económico estimado: {:.0} COP",
                outcome.estimated_economic_impact
            );
        }
        Command::Report {
            location,
            out,
            format,
        } => {
            let analysis = run_analysis(&analyzer, &config, &location)?;
            let path = export_report(analyzer.catalog(), &analysis, &out, format)?;
            println!("Reporte generado: {}", path.display());
        }
        Command::Serve { host, port } => {
            let server = WebServerConfig {
                pacing: Pacing::from(&config.pacing),
                random_seed: config.random_seed,
                host: host.unwrap_or_else(|| config.server.host.clone()),
                port: port.unwrap_or(config.server.port),
                analyzer,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(server))?;
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_analysis(analyzer: &Analyzer, config: &Config, location: &LocationArgs) -> Result<Analysis> {
    let mut rng = RngManager::with_seed(location.seed.or(config.random_seed));
    Ok(analyzer.analyze(&location.request(), &mut rng)?)
}

fn print_summary(analysis: &Analysis) {
    let snapshot = &analysis.snapshot;
    println!("{} ({})", analysis.district, analysis.coordinates);
    println!("  {}", analysis.description);
    println!(
        "  Elevación {:.0} m.s.n.m. | Pendiente {}° | Precipitación {} mm",
        snapshot.elevation_m, snapshot.slope_deg, snapshot.precipitation_mm
    );
    println!("  Suelo {} | {}", snapshot.soil, snapshot.geological_formation);
    println!(
        "  Deslizamiento {}% | Colapso {}% | General {}% ({})",
        analysis.composite.landslide,
        analysis.composite.collapse,
        analysis.composite.overall,
        analysis.composite.tier
    );
    println!(
        "  Evaluación técnica: {} ({}%)",
        analysis.technical.tier, analysis.technical.score
    );
    for (index, item) in analysis.landslide.recommendations.iter().enumerate() {
        println!("  {}. {}", index + 1, item);
    }
}
